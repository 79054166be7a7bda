//! Sink implementations

pub mod rolling_file;

pub use rolling_file::RollingFile;

// Re-export the capability trait next to its default implementation
pub use crate::core::RotatingSink;
