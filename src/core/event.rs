//! Rotation events, statistics, and hook callbacks

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Snapshot of one rotation attempt, delivered to every registered hook
///
/// `new_path` equals `old_path`: rotation preserves the logical file name,
/// the rotated copy is archived under a timestamped name by the sink.
#[derive(Debug, Clone, Serialize)]
pub struct RotationEvent {
    /// When the rotation was attempted
    pub timestamp: DateTime<Utc>,
    /// Path of the file that was rotated
    pub old_path: PathBuf,
    /// Path of the live file after rotation
    pub new_path: PathBuf,
    /// File size in bytes just before the attempt (0 if unknown)
    pub pre_rotation_size_bytes: u64,
    /// Whether the rotation succeeded
    pub success: bool,
    /// Error description, present iff `success` is false
    pub error: Option<String>,
}

/// Rotation statistics snapshot
///
/// Both fields are updated inside the same critical section, so a count
/// bump is never observable without its matching timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RotationStats {
    /// Time of the last successful rotation
    pub last_rotation: Option<DateTime<Utc>>,
    /// Number of successful rotations
    pub rotation_count: u64,
}

/// Callback invoked with each completed rotation attempt
///
/// Hooks observe failures as well as successes. They run with no ordering
/// guarantee relative to each other and must not assume they complete
/// before process exit.
pub type RotationHook = Arc<dyn Fn(&RotationEvent) + Send + Sync>;
