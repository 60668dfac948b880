use crate::test_id::DEFAULT_MAX_SEGMENT_LENGTH;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const ENV_TEMP_ROOT: &str = "CASEKIT_TEMP_ROOT";
pub const ENV_MAX_SEGMENT_LENGTH: &str = "CASEKIT_MAX_SEGMENT_LENGTH";
pub const ENV_KEEP_TEMP: &str = "CASEKIT_KEEP_TEMP";

/// Settings shared by every test case in a run.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaseConfig {
    /// Directory under which per-test temporary paths are created.
    pub temp_root: PathBuf,

    /// Bound on each segment of the path derived from a test id.
    pub max_segment_length: NonZeroUsize,

    /// Leave per-test temporary directories behind after the test finishes.
    pub keep_temp: bool,
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            temp_root: std::env::temp_dir().join("casekit"),
            max_segment_length: DEFAULT_MAX_SEGMENT_LENGTH,
            keep_temp: false,
        }
    }
}

impl CaseConfig {
    /// Defaults with `CASEKIT_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `CASEKIT_*` overrides. Values that do not parse are ignored
    /// with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(root) = std::env::var_os(ENV_TEMP_ROOT).filter(|v| !v.is_empty()) {
            self.temp_root = PathBuf::from(root);
        }

        if let Ok(raw) = std::env::var(ENV_MAX_SEGMENT_LENGTH) {
            match raw.trim().parse::<NonZeroUsize>() {
                Ok(n) => self.max_segment_length = n,
                Err(e) => tracing::warn!(
                    var = ENV_MAX_SEGMENT_LENGTH,
                    value = %raw,
                    error = %e,
                    "ignoring invalid max segment length"
                ),
            }
        }

        if let Ok(raw) = std::env::var(ENV_KEEP_TEMP) {
            match parse_flag(&raw) {
                Some(flag) => self.keep_temp = flag,
                None => tracing::warn!(
                    var = ENV_KEEP_TEMP,
                    value = %raw,
                    "ignoring invalid boolean"
                ),
            }
        }

        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
