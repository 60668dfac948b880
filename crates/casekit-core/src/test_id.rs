//! Mapping from dotted test identifiers to bounded relative paths.
//!
//! A test id such as `pkg.sub.TestClass.test_method` becomes
//! `pkg/TestClass/test_method`: the first component, the second-to-last
//! component and the last component, each bounded to a maximum length.
//! Interior components are dropped so every test lands at the same depth
//! regardless of how deeply its module is nested.

use crate::errors::PathError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Default bound on each path segment, in bytes.
pub const DEFAULT_MAX_SEGMENT_LENGTH: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(n) => n,
    None => panic!("default segment length must be non-zero"),
};

/// Number of hex digits appended to a shortened segment.
const DIGEST_LEN: usize = 8;

/// Placeholder for a segment that would otherwise be empty.
const EMPTY_SEGMENT: &str = "_";

/// Derive the relative directory for `id`, bounding every segment to
/// `max_length` bytes.
///
/// The result always has exactly three `/`-separated segments and never
/// starts with `/`. The same inputs always produce the same path.
pub fn path_for_test_id(id: &str, max_length: NonZeroUsize) -> Result<String, PathError> {
    let (module, class, method) = split_test_id(id)?;
    Ok(join_bounded(module, class, method, max_length.get()))
}

/// A validated test identifier with at least three dotted components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestId(String);

impl TestId {
    pub fn parse(id: impl Into<String>) -> Result<Self, PathError> {
        let id = id.into();
        split_test_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading module component.
    pub fn module(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }

    /// Second-to-last component.
    pub fn class(&self) -> &str {
        self.0.rsplit('.').nth(1).unwrap_or_default()
    }

    /// Last component.
    pub fn method(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or_default()
    }

    pub fn relative_path(&self, max_length: NonZeroUsize) -> String {
        join_bounded(self.module(), self.class(), self.method(), max_length.get())
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TestId {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TestId {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TestId> for String {
    fn from(id: TestId) -> Self {
        id.0
    }
}

fn split_test_id(id: &str) -> Result<(&str, &str, &str), PathError> {
    let segments = id.split('.').count();
    if segments < 3 {
        return Err(PathError::InvalidIdentifier {
            id: id.to_string(),
            segments,
        });
    }
    let module = id.split('.').next().unwrap_or_default();
    let mut tail = id.rsplit('.');
    let method = tail.next().unwrap_or_default();
    let class = tail.next().unwrap_or_default();
    Ok((module, class, method))
}

fn join_bounded(module: &str, class: &str, method: &str, max_length: usize) -> String {
    [module, class, method]
        .iter()
        .map(|segment| bound_segment(segment, max_length))
        .collect::<Vec<_>>()
        .join("/")
}

/// Bound one segment to `max_length` bytes.
///
/// Long segments keep a prefix plus a short digest of the full segment so
/// that names sharing a long prefix still map to distinct directories. When
/// the bound is too small to fit a digest the segment is simply cut.
fn bound_segment(segment: &str, max_length: usize) -> String {
    let clean: String = segment
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    let bounded = if clean.len() <= max_length {
        clean
    } else if max_length > DIGEST_LEN + 1 {
        let prefix = prefix_within(&clean, max_length - DIGEST_LEN - 1);
        format!("{}-{}", prefix, short_digest(segment))
    } else {
        prefix_within(&clean, max_length).to_string()
    };

    if bounded.is_empty() {
        EMPTY_SEGMENT.to_string()
    } else {
        bounded
    }
}

/// Longest prefix of `s` that is at most `max_bytes` long and ends on a char
/// boundary.
fn prefix_within(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn short_digest(segment: &str) -> String {
    let mut encoded = hex::encode(Sha256::digest(segment.as_bytes()));
    encoded.truncate(DIGEST_LEN);
    encoded
}
