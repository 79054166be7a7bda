//! # logsink
//!
//! A thread-safe log output sink manager: it owns the physical destination a
//! structured logging pipeline writes to (console, a size/age-bounded
//! rotating file, or both), decides when rotation must occur, performs
//! rotation with failure recovery, and notifies registered hooks of rotation
//! outcomes without blocking the writer.
//!
//! ## Features
//!
//! - **Console, file, or both**: single active writer or a fan-out writer
//! - **Explicit rotation**: force it, or check the size threshold after writes
//! - **Failure recovery**: a failed rotation never leaves a broken handle
//! - **Rotation hooks**: asynchronous, individually fault-isolated observers
//! - **Thread safe**: one manager, any number of writing and polling threads

pub mod core;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        DispatchMode, OutputConfig, OutputManager, OutputManagerBuilder, Result, RotatingSink,
        RotationEvent, RotationHook, RotationStats, SinkError, SinkFactory, SinkWriter,
    };
    pub use crate::sinks::RollingFile;
}

pub use crate::core::{
    DispatchMode, HookDispatcher, OutputConfig, OutputManager, OutputManagerBuilder, Result,
    RotatingSink, RotationEvent, RotationHook, RotationStats, SinkError, SinkFactory, SinkWriter,
    DEFAULT_COMPRESS, DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_BACKUPS, DEFAULT_MAX_SIZE_MB,
    DEFAULT_USE_LOCAL_TIME,
};
pub use crate::sinks::RollingFile;
