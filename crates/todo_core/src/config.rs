//! Core configuration.
//!
//! # Responsibility
//! - Carry host-provided settings (database location, logging, undo window).
//! - Build the single process-wide store instance from those settings.
//!
//! # Invariants
//! - `undo_window_ms` is never zero after `validate()`.
//! - `log_dir`, when set, is absolute.

use crate::db::{open_db, open_db_in_memory};
use crate::logging::{default_log_level, normalize_level};
use crate::store::{SqliteNoteStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Long snackbar duration used by the list screen.
pub const DEFAULT_UNDO_WINDOW_MS: u64 = 2750;

/// Settings passed in by the host app at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file path. `None` keeps the note table in memory.
    pub db_path: Option<PathBuf>,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub log_dir: Option<PathBuf>,
    /// How long a swiped note can still be restored.
    pub undo_window_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            undo_window_ms: DEFAULT_UNDO_WINDOW_MS,
        }
    }
}

impl CoreConfig {
    /// Returns a config that stores notes at `path`.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_millis(self.undo_window_ms)
    }

    /// Checks values that would otherwise fail late.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.undo_window_ms == 0 {
            return Err(ConfigError::ZeroUndoWindow);
        }
        normalize_level(&self.log_level).map_err(ConfigError::InvalidLogLevel)?;
        if let Some(log_dir) = self.log_dir.as_ref() {
            if !log_dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(log_dir.clone()));
            }
        }
        Ok(())
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroUndoWindow,
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroUndoWindow => write!(f, "undo_window_ms must be greater than zero"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::RelativeLogDir(path) => {
                write!(f, "log_dir must be absolute, got `{}`", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Opens the note store described by `config`.
///
/// Called once at process start; the returned store is then handed to the
/// repository explicitly.
pub fn open_store(config: &CoreConfig) -> StoreResult<SqliteNoteStore> {
    let conn = match config.db_path.as_ref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    Ok(SqliteNoteStore::new(conn))
}
