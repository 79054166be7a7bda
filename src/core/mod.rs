//! Core sink-manager types and traits

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod manager;
pub mod sink;
pub mod writer;

pub use config::{
    OutputConfig, DEFAULT_COMPRESS, DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_BACKUPS,
    DEFAULT_MAX_SIZE_MB, DEFAULT_USE_LOCAL_TIME,
};
pub use dispatch::{DispatchMode, HookDispatcher};
pub use error::{Result, SinkError};
pub use event::{RotationEvent, RotationHook, RotationStats};
pub use manager::{OutputManager, OutputManagerBuilder};
pub use sink::{RotatingSink, SinkFactory};
pub use writer::SinkWriter;
