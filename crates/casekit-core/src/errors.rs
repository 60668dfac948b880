use std::path::PathBuf;
use thiserror::Error;

/// Failure of the test-id path mapping. A malformed identifier is a caller
/// contract violation; there is no other failure mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("test id must have at least three dotted components (e.g. foo.bar.baz), got {segments}: {id:?}")]
    InvalidIdentifier { id: String, segments: usize },
}

/// Error returned by a test body or by the machinery around it.
///
/// `Skip` and `Failure` are ordinary control flow for a test body and map to
/// `Skipped` / `Failed` outcomes. Everything else is reported as `Errored`.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("skipped: {reason}")]
    Skip { reason: String },

    #[error("{message}")]
    Failure { message: String },

    #[error(transparent)]
    InvalidId(#[from] PathError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cleanup of {} failed: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CaseError {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}
