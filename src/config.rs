//! Runtime configuration read from the environment.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `GLYCORISK_MODEL_PATH` | model artifact file or directory | `models/diabetes_model.json` |
//! | `GLYCORISK_IMPORTANCE_PATH` | JSON importance table override | bundled table |
//! | `GLYCORISK_REQUIRE_PROBABILITIES` | refuse label-only models | `false` |
//! | `GLYCORISK_LOG_MODE` | `stderr` or `file` | `stderr` |
//! | `GLYCORISK_LOG_FILE` | log file path in `file` mode | `glycorisk.log` |

use std::path::{Path, PathBuf};

pub const MODEL_PATH_ENV: &str = "GLYCORISK_MODEL_PATH";
pub const IMPORTANCE_PATH_ENV: &str = "GLYCORISK_IMPORTANCE_PATH";
pub const REQUIRE_PROBABILITIES_ENV: &str = "GLYCORISK_REQUIRE_PROBABILITIES";
pub const LOG_MODE_ENV: &str = "GLYCORISK_LOG_MODE";
pub const LOG_FILE_ENV: &str = "GLYCORISK_LOG_FILE";

const DEFAULT_MODEL_PATH: &str = "models/diabetes_model.json";
const DEFAULT_LOG_FILE: &str = "glycorisk.log";

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

fn parse_bool_env(name: &str) -> bool {
    std::env::var(name).map(|v| parse_bool(&v)).unwrap_or(false)
}

fn path_env(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Settings needed to build a [`RiskEngine`](crate::RiskEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Classifier artifact (file, or directory holding one)
    pub model_path: PathBuf,

    /// Optional replacement for the bundled importance table
    pub importance_path: Option<PathBuf>,

    /// Refuse classifiers that cannot report probabilities
    pub require_probabilities: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            importance_path: None,
            require_probabilities: false,
        }
    }
}

impl EngineConfig {
    /// Read the configuration from `GLYCORISK_*` variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_path: path_env(MODEL_PATH_ENV).unwrap_or(defaults.model_path),
            importance_path: path_env(IMPORTANCE_PATH_ENV),
            require_probabilities: parse_bool_env(REQUIRE_PROBABILITIES_ENV),
        }
    }

    #[must_use]
    pub fn with_model_path(mut self, path: impl AsRef<Path>) -> Self {
        self.model_path = path.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn with_importance_path(mut self, path: impl AsRef<Path>) -> Self {
        self.importance_path = Some(path.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_require_probabilities(mut self, require: bool) -> Self {
        self.require_probabilities = require;
        self
    }
}

/// Log sink for the command-line front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMode {
    /// Standard error, keeping stdout free for report JSON
    Stderr,
    /// Append to a file
    File(PathBuf),
}

impl LogMode {
    /// Read `GLYCORISK_LOG_MODE` / `GLYCORISK_LOG_FILE`. Unknown modes fall
    /// back to stderr.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(LOG_MODE_ENV).as_deref().map(str::trim) {
            Ok("file") => Self::File(
                path_env(LOG_FILE_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            ),
            _ => Self::Stderr,
        }
    }
}
