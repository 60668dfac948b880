pub mod case;
pub mod cleanup;
pub mod config;
pub mod errors;
pub mod outcome;
pub mod temp;
pub mod test_id;

pub use case::TestCase;
pub use cleanup::{remove_dir_tree, remove_path};
pub use config::CaseConfig;
pub use errors::{CaseError, PathError};
pub use outcome::{
    LoggingObserver, RecordingObserver, ResultEvent, TestObserver, TestOutcome, TestStatus,
};
pub use temp::TestContext;
pub use test_id::{path_for_test_id, TestId, DEFAULT_MAX_SEGMENT_LENGTH};
