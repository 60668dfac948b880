//! Per-test temporary paths.
//!
//! Every test gets a directory at `temp_root/<module>/<class>/<method>`
//! (see [`crate::test_id`]). That directory can be shared: ids differing only
//! in interior components, ids that collide after shortening, and parallel
//! runs of the same id all land there. Paths handed out by
//! [`TestContext::mktemp`] are unique leaves inside it, and only those leaves
//! are removed after the test. The shared directories are left in place.

use crate::case::panic_message;
use crate::cleanup::remove_path;
use crate::config::CaseConfig;
use crate::errors::CaseError;
use crate::test_id::TestId;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use uuid::Uuid;

type Cleanup = Box<dyn FnOnce() -> Result<(), CaseError>>;

/// State a test body sees while it runs.
pub struct TestContext {
    id: TestId,
    config: CaseConfig,
    cleanups: Vec<Cleanup>,
}

impl TestContext {
    pub fn new(id: TestId, config: CaseConfig) -> Self {
        Self {
            id,
            config,
            cleanups: Vec::new(),
        }
    }

    pub fn id(&self) -> &TestId {
        &self.id
    }

    pub fn config(&self) -> &CaseConfig {
        &self.config
    }

    /// Directory this test's temporary paths live in. Not created until
    /// first use, and possibly shared with other tests.
    pub fn test_dir(&self) -> PathBuf {
        self.config
            .temp_root
            .join(self.id.relative_path(self.config.max_segment_length))
    }

    /// Return a fresh path that does not exist yet, inside a directory that
    /// does. Whatever ends up at the path is removed after the test unless
    /// `keep_temp` is set.
    pub fn mktemp(&mut self) -> Result<PathBuf, CaseError> {
        let parent = self.test_dir();
        std::fs::create_dir_all(&parent)?;

        let leaf = Uuid::new_v4().simple().to_string();
        let path = parent.join(leaf);
        tracing::debug!(test_id = %self.id, path = %path.display(), "allocated temporary path");

        if !self.config.keep_temp {
            let owned = path.clone();
            self.add_cleanup(move || {
                remove_path(&owned).map_err(|source| CaseError::Cleanup {
                    path: owned,
                    source,
                })
            });
        }
        Ok(path)
    }

    /// Create and return a new empty directory for this test.
    pub fn make_temporary_directory(&mut self) -> Result<PathBuf, CaseError> {
        let path = self.mktemp()?;
        std::fs::create_dir(&path)?;
        Ok(path)
    }

    /// Register `f` to run after the test body. Cleanups run last-in,
    /// first-out.
    pub fn add_cleanup<F>(&mut self, f: F)
    where
        F: FnOnce() -> Result<(), CaseError> + 'static,
    {
        self.cleanups.push(Box::new(f));
    }

    /// Run every registered cleanup, newest first, and return the failures.
    /// A panicking cleanup is reported as a failure and does not stop the
    /// remaining ones.
    pub(crate) fn run_cleanups(&mut self) -> Vec<CaseError> {
        let mut errors = Vec::new();
        while let Some(cleanup) = self.cleanups.pop() {
            let result = match panic::catch_unwind(AssertUnwindSafe(cleanup)) {
                Ok(result) => result,
                Err(payload) => Err(CaseError::failure(format!(
                    "cleanup panicked: {}",
                    panic_message(payload.as_ref())
                ))),
            };
            if let Err(e) = result {
                tracing::warn!(test_id = %self.id, error = %e, "cleanup failed");
                errors.push(e);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn context_in(root: &std::path::Path) -> TestContext {
        let config = CaseConfig {
            temp_root: root.to_path_buf(),
            ..CaseConfig::default()
        };
        TestContext::new(TestId::parse("pkg.sub.SomeTest.test_pass").unwrap(), config)
    }

    #[test]
    fn test_mktemp_doesnt_exist() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());

        let path = ctx.mktemp().unwrap();
        assert!(!path.exists());
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(
            path.parent().unwrap(),
            scratch.path().join("pkg/SomeTest/test_pass")
        );
    }

    #[test]
    fn test_mktemp_paths_are_unique() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());
        assert_ne!(ctx.mktemp().unwrap(), ctx.mktemp().unwrap());
    }

    #[test]
    fn test_make_temporary_directory_creates_it() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());
        let dir = ctx.make_temporary_directory().unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_cleanups_remove_only_handed_out_paths() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());
        let made = ctx.make_temporary_directory().unwrap();
        let never_created = ctx.mktemp().unwrap();
        let test_dir = ctx.test_dir();
        let foreign = test_dir.join("owned-by-someone-else");
        std::fs::create_dir(&foreign).unwrap();

        let errors = ctx.run_cleanups();
        assert!(errors.is_empty());
        assert!(!made.exists());
        assert!(!never_created.exists());
        assert!(foreign.is_dir());
        assert!(test_dir.is_dir());
    }

    #[test]
    fn test_mktemp_path_used_as_file_is_removed() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());
        let path = ctx.mktemp().unwrap();
        std::fs::write(&path, b"scratch file").unwrap();

        assert!(ctx.run_cleanups().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_panicking_cleanup_becomes_error() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        ctx.add_cleanup(move || {
            *flag.borrow_mut() = true;
            Ok(())
        });
        ctx.add_cleanup(|| panic!("cleanup assert failed"));

        let errors = ctx.run_cleanups();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "cleanup panicked: cleanup assert failed");
        assert!(*ran.borrow());
    }

    #[test]
    fn test_keep_temp_leaves_directory() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());
        ctx.config.keep_temp = true;
        let dir = ctx.make_temporary_directory().unwrap();

        assert!(ctx.run_cleanups().is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_cleanups_run_lifo() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 1..=3 {
            let order = Rc::clone(&order);
            ctx.add_cleanup(move || {
                order.borrow_mut().push(n);
                Ok(())
            });
        }

        assert!(ctx.run_cleanups().is_empty());
        assert_eq!(*order.borrow(), vec![3, 2, 1]);
    }

    #[test]
    fn test_failing_cleanup_does_not_stop_others() {
        let scratch = tempfile::tempdir().unwrap();
        let mut ctx = context_in(scratch.path());
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        ctx.add_cleanup(move || {
            *flag.borrow_mut() = true;
            Ok(())
        });
        ctx.add_cleanup(|| Err(CaseError::failure("cleanup broke")));

        let errors = ctx.run_cleanups();
        assert_eq!(errors.len(), 1);
        assert!(*ran.borrow());
    }
}
