//! Rotation-primitive capability trait

use super::error::Result;
use crate::core::config::OutputConfig;
use std::path::Path;
use std::sync::Arc;

/// A file destination that can rotate itself on request
///
/// The manager only ever asks for an explicit rotation; whether and how the
/// file is renamed, compressed, or truncated is the implementation's
/// business. [`crate::sinks::RollingFile`] is the default implementation.
pub trait RotatingSink: Send + Sync {
    /// Append bytes to the current file
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Flush buffered bytes to disk
    fn flush(&mut self) -> Result<()>;

    /// Rotate the current file now
    fn rotate_now(&mut self) -> Result<()>;

    /// Release the underlying file handle
    fn close(&mut self) -> Result<()>;

    /// Path of the live log file
    fn path(&self) -> &Path;
}

/// Factory binding a sink to a validated file configuration
///
/// Called at construction, on reconfiguration, and when recovering from a
/// failed rotation. Tests inject factories producing faulty sinks.
pub type SinkFactory = Arc<dyn Fn(&OutputConfig) -> Result<Box<dyn RotatingSink>> + Send + Sync>;
