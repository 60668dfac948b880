//! Test outcomes and the observer interface that receives them.

use crate::test_id::TestId;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pass,
    Fail,
    Skipped,
    Error,
}

/// Result of running a single test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed { message: String },
    Skipped { reason: String },
    Errored { message: String },
}

impl TestOutcome {
    pub fn status(&self) -> TestStatus {
        match self {
            TestOutcome::Passed => TestStatus::Pass,
            TestOutcome::Failed { .. } => TestStatus::Fail,
            TestOutcome::Skipped { .. } => TestStatus::Skipped,
            TestOutcome::Errored { .. } => TestStatus::Error,
        }
    }

    /// Passed and skipped tests do not fail a run.
    pub fn is_success(&self) -> bool {
        matches!(self, TestOutcome::Passed | TestOutcome::Skipped { .. })
    }
}

/// One event as seen by an observer, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResultEvent {
    StartTest { id: TestId },
    Outcome { id: TestId, outcome: TestOutcome },
    StopTest { id: TestId },
}

/// Receives lifecycle events for each test a [`crate::TestCase`] runs.
///
/// Every run emits `start_test`, exactly one `add_outcome`, then `stop_test`.
pub trait TestObserver {
    fn start_test(&self, id: &TestId);
    fn add_outcome(&self, id: &TestId, outcome: &TestOutcome);
    fn stop_test(&self, id: &TestId);
}

/// Observer that keeps every event in memory. Mostly useful as a test double.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ResultEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of events recorded so far.
    pub fn events(&self) -> Vec<ResultEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, event: ResultEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl TestObserver for RecordingObserver {
    fn start_test(&self, id: &TestId) {
        self.push(ResultEvent::StartTest { id: id.clone() });
    }

    fn add_outcome(&self, id: &TestId, outcome: &TestOutcome) {
        self.push(ResultEvent::Outcome {
            id: id.clone(),
            outcome: outcome.clone(),
        });
    }

    fn stop_test(&self, id: &TestId) {
        self.push(ResultEvent::StopTest { id: id.clone() });
    }
}

/// Observer that reports outcomes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl TestObserver for LoggingObserver {
    fn start_test(&self, id: &TestId) {
        tracing::debug!(test_id = %id, "test started");
    }

    fn add_outcome(&self, id: &TestId, outcome: &TestOutcome) {
        match outcome {
            TestOutcome::Passed => tracing::info!(test_id = %id, "pass"),
            TestOutcome::Skipped { reason } => tracing::info!(test_id = %id, %reason, "skipped"),
            TestOutcome::Failed { message } => tracing::warn!(test_id = %id, %message, "fail"),
            TestOutcome::Errored { message } => tracing::error!(test_id = %id, %message, "error"),
        }
    }

    fn stop_test(&self, id: &TestId) {
        tracing::debug!(test_id = %id, "test stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(TestOutcome::Passed.status(), TestStatus::Pass);
        assert_eq!(
            TestOutcome::Skipped { reason: "x".into() }.status(),
            TestStatus::Skipped
        );
        assert_eq!(
            TestOutcome::Failed { message: "x".into() }.status(),
            TestStatus::Fail
        );
        assert_eq!(
            TestOutcome::Errored { message: "x".into() }.status(),
            TestStatus::Error
        );
    }

    #[test]
    fn test_skip_counts_as_success() {
        assert!(TestOutcome::Passed.is_success());
        assert!(TestOutcome::Skipped { reason: "n/a".into() }.is_success());
        assert!(!TestOutcome::Failed { message: "boom".into() }.is_success());
        assert!(!TestOutcome::Errored { message: "io".into() }.is_success());
    }

    #[test]
    fn test_recording_observer_keeps_order() {
        let id = TestId::parse("pkg.Case.test_x").unwrap();
        let observer = RecordingObserver::new();
        observer.start_test(&id);
        observer.add_outcome(&id, &TestOutcome::Passed);
        observer.stop_test(&id);

        assert_eq!(
            observer.events(),
            vec![
                ResultEvent::StartTest { id: id.clone() },
                ResultEvent::Outcome {
                    id: id.clone(),
                    outcome: TestOutcome::Passed
                },
                ResultEvent::StopTest { id },
            ]
        );
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(TestOutcome::Skipped {
            reason: "no docker".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "skipped", "reason": "no docker" })
        );
    }
}
