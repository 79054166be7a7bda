//! Error types for the sink manager

pub type Result<T> = std::result::Result<T, SinkError>;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Invalid configuration with the offending field
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfiguration { field: String, message: String },

    /// Directory or file could not be created or opened
    #[error("resource unavailable at '{path}': {message}")]
    ResourceUnavailable {
        path: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Rotation requested on a manager without a file destination
    #[error("no file destination configured")]
    NoFileConfigured,

    /// File size query on a console-only manager
    #[error("manager is not in file mode")]
    NotInFileMode,

    /// The rotation primitive itself failed
    #[error("rotation failed for '{path}': {message}")]
    RotationFailed { path: String, message: String },

    /// Rotation failed but the file handle was successfully rebound;
    /// the manager remains writable
    #[error("rotation failed but recovery succeeded: {rotation}")]
    RotationRecovered {
        #[source]
        rotation: Box<SinkError>,
    },

    /// Rotation failed and rebinding the file handle failed too;
    /// the destination may be unusable
    #[error("rotation failed and recovery failed: rotation error: {rotation}, recovery error: {recovery}")]
    RotationAndRecoveryFailed {
        rotation: Box<SinkError>,
        recovery: Box<SinkError>,
    },

    /// Write attempted through a closed sink
    #[error("sink is closed")]
    SinkClosed,

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error (config loading)
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SinkError {
    /// Create an invalid configuration error
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        SinkError::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a resource unavailable error
    pub fn resource(
        path: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        SinkError::ResourceUnavailable {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a rotation error
    pub fn rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        SinkError::RotationFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        SinkError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Wrap a rotation failure whose recovery succeeded
    pub fn recovered(rotation: SinkError) -> Self {
        SinkError::RotationRecovered {
            rotation: Box::new(rotation),
        }
    }

    /// Wrap a rotation failure whose recovery also failed
    pub fn unrecovered(rotation: SinkError, recovery: SinkError) -> Self {
        SinkError::RotationAndRecoveryFailed {
            rotation: Box::new(rotation),
            recovery: Box::new(recovery),
        }
    }
}
