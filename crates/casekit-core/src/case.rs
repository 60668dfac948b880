use crate::config::CaseConfig;
use crate::errors::CaseError;
use crate::outcome::{TestObserver, TestOutcome};
use crate::temp::TestContext;
use crate::test_id::TestId;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

type Body = Box<dyn FnOnce(&mut TestContext) -> Result<(), CaseError>>;

/// A single runnable test: an id plus a body.
///
/// The body reports skips and failures by returning [`CaseError::Skip`] or
/// [`CaseError::Failure`]; a panic (e.g. a failed `assert!`) is a failure as
/// well. Any other error is reported as an error outcome.
pub struct TestCase {
    id: TestId,
    body: Body,
}

impl TestCase {
    pub fn new<F>(id: TestId, body: F) -> Self
    where
        F: FnOnce(&mut TestContext) -> Result<(), CaseError> + 'static,
    {
        Self {
            id,
            body: Box::new(body),
        }
    }

    pub fn id(&self) -> &TestId {
        &self.id
    }

    /// Run the body, then its cleanups, reporting to `observer`.
    ///
    /// The observer sees `start_test`, one `add_outcome` and `stop_test`, in
    /// that order. The returned outcome is the one reported.
    pub fn run(self, config: &CaseConfig, observer: &dyn TestObserver) -> TestOutcome {
        let TestCase { id, body } = self;
        observer.start_test(&id);

        let mut ctx = TestContext::new(id.clone(), config.clone());
        let result = panic::catch_unwind(AssertUnwindSafe(|| body(&mut ctx)));

        let outcome = match result {
            Ok(Ok(())) => TestOutcome::Passed,
            Ok(Err(e)) => outcome_for_error(e),
            Err(payload) => TestOutcome::Failed {
                message: panic_message(payload.as_ref()),
            },
        };

        let cleanup_errors = ctx.run_cleanups();
        let outcome = if cleanup_errors.is_empty() || !outcome.is_success() {
            outcome
        } else {
            TestOutcome::Errored {
                message: cleanup_errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            }
        };

        tracing::debug!(test_id = %id, status = ?outcome.status(), "test finished");
        observer.add_outcome(&id, &outcome);
        observer.stop_test(&id);
        outcome
    }
}

fn outcome_for_error(e: CaseError) -> TestOutcome {
    match e {
        CaseError::Skip { reason } => TestOutcome::Skipped { reason },
        CaseError::Failure { message } => TestOutcome::Failed { message },
        other => TestOutcome::Errored {
            message: other.to_string(),
        },
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    }
}
