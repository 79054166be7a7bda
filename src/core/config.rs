//! Output destination configuration
//!
//! An [`OutputConfig`] describes where log bytes go: the console, a
//! size/age-bounded rotating file, or both. Configurations are value
//! objects; a manager never mutates one in place, it is replaced
//! wholesale through `update_config`.

use crate::core::error::{Result, SinkError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default maximum file size in megabytes before rotation
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;
/// Default maximum age of rotated files in days
pub const DEFAULT_MAX_AGE_DAYS: u32 = 7;
/// Default number of rotated backup files to keep
pub const DEFAULT_MAX_BACKUPS: u32 = 5;
/// Whether rotated files are compressed by default
pub const DEFAULT_COMPRESS: bool = true;
/// Whether rotated-file names use local time by default
pub const DEFAULT_USE_LOCAL_TIME: bool = false;

/// Configuration for a log output destination
///
/// # Examples
///
/// ```
/// use logsink::OutputConfig;
///
/// // File destination with documented defaults
/// let config = OutputConfig::file("logs/app.log");
/// assert_eq!(config.max_size_mb, 100);
///
/// // Tuned via the builder methods
/// let config = OutputConfig::file("logs/app.log")
///     .with_max_size_mb(50)
///     .with_max_backups(10)
///     .with_compress(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the log file; `None` means console only
    pub file_path: Option<PathBuf>,
    /// Maximum file size in megabytes before rotation
    pub max_size_mb: u64,
    /// Maximum number of days to retain rotated files (0 = no age limit)
    pub max_age_days: u32,
    /// Maximum number of rotated files to keep (0 = no count limit)
    pub max_backups: u32,
    /// Whether rotated files are gzip-compressed
    pub compress: bool,
    /// Whether rotated-file names use local time instead of UTC
    pub use_local_time: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::console()
    }
}

impl OutputConfig {
    /// Create a console-only configuration
    #[must_use]
    pub fn console() -> Self {
        Self {
            file_path: None,
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            max_backups: DEFAULT_MAX_BACKUPS,
            compress: DEFAULT_COMPRESS,
            use_local_time: DEFAULT_USE_LOCAL_TIME,
        }
    }

    /// Create a file configuration with documented defaults
    /// (100 MB, 7 days, 5 backups, compression on, UTC naming)
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Self::console()
        }
    }

    /// Load a configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `JsonError` on malformed input; the result is not yet
    /// validated, call [`OutputConfig::validate`] before use.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the maximum file size in megabytes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(mut self, mb: u64) -> Self {
        self.max_size_mb = mb;
        self
    }

    /// Set the maximum age of rotated files in days
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: u32) -> Self {
        self.max_age_days = days;
        self
    }

    /// Set the maximum number of rotated files to keep
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: u32) -> Self {
        self.max_backups = count;
        self
    }

    /// Enable or disable compression of rotated files
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Use local time instead of UTC for rotated-file names
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_local_time(mut self, enabled: bool) -> Self {
        self.use_local_time = enabled;
        self
    }

    /// The rotation threshold in bytes, saturating at `u64::MAX`
    #[must_use]
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when `max_size_mb` is zero, or when a
    /// file path is given that has no usable directory or file name
    /// component. Performs no filesystem access.
    pub fn validate(&self) -> Result<()> {
        if self.max_size_mb == 0 {
            return Err(SinkError::config("max_size_mb", "must be positive"));
        }

        if let Some(ref path) = self.file_path {
            Self::validate_file_path(path)?;
        }

        Ok(())
    }

    fn validate_file_path(path: &Path) -> Result<()> {
        let raw = path.to_string_lossy();
        if raw.is_empty() {
            return Err(SinkError::config("file_path", "path cannot be empty"));
        }

        // A trailing separator means a directory, not a file
        if raw.ends_with('/') || raw.ends_with('\\') {
            return Err(SinkError::config("file_path", "filename cannot be empty"));
        }

        match path.file_name() {
            Some(name) if !name.is_empty() => {}
            _ => {
                return Err(SinkError::config("file_path", "filename cannot be empty"));
            }
        }

        // Require a real parent directory; a missing or bare "." parent
        // ("app.log", "./app.log") leaves the destination ambiguous
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && dir != Path::new(".") => Ok(()),
            _ => Err(SinkError::config(
                "file_path",
                "directory cannot be empty",
            )),
        }
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OutputConfig{{file_path: {}, max_size: {} MB, max_age: {} days, max_backups: {}, compress: {}, local_time: {}}}",
            self.file_path
                .as_deref()
                .map_or_else(|| "<console>".to_string(), |p| p.display().to_string()),
            self.max_size_mb,
            self.max_age_days,
            self.max_backups,
            self.compress,
            self.use_local_time
        )
    }
}
