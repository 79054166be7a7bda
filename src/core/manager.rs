//! Output manager: destination lifecycle, rotation orchestration, hooks
//!
//! An [`OutputManager`] owns the physical destination a logging pipeline
//! writes to. In console mode it hands out stdout; in file mode it binds a
//! [`RotatingSink`] and decides when and how that sink rotates. All mutable
//! state (configuration, bound sink, statistics, hook registry) sits behind
//! one `parking_lot::RwLock`, so the manager is usable from any number of
//! threads.

use super::config::OutputConfig;
use super::dispatch::{DispatchMode, HookDispatcher};
use super::error::{Result, SinkError};
use super::event::{RotationEvent, RotationHook, RotationStats};
use super::sink::{RotatingSink, SinkFactory};
use super::writer::{SinkWriter, WriteTarget};
use crate::sinks::RollingFile;
use chrono::Utc;
use parking_lot::RwLock;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) struct ManagerState {
    pub(crate) config: OutputConfig,
    pub(crate) sink: Option<Box<dyn RotatingSink>>,
    pub(crate) stats: RotationStats,
    pub(crate) hooks: Vec<RotationHook>,
}

pub(crate) struct ManagerInner {
    pub(crate) state: RwLock<ManagerState>,
    pub(crate) dispatcher: HookDispatcher,
    pub(crate) factory: SinkFactory,
}

/// Builder for [`OutputManager`]
///
/// # Examples
///
/// ```no_run
/// use logsink::{DispatchMode, OutputConfig, OutputManager};
///
/// let manager = OutputManager::builder(OutputConfig::file("logs/app.log"))
///     .dispatch_mode(DispatchMode::Inline)
///     .build()
///     .unwrap();
/// ```
pub struct OutputManagerBuilder {
    config: OutputConfig,
    dispatch_mode: DispatchMode,
    factory: SinkFactory,
}

impl OutputManagerBuilder {
    fn new(config: OutputConfig) -> Self {
        Self {
            config,
            dispatch_mode: DispatchMode::default(),
            factory: Arc::new(|config: &OutputConfig| {
                RollingFile::open(config).map(|sink| Box::new(sink) as Box<dyn RotatingSink>)
            }),
        }
    }

    /// How rotation events are delivered to hooks
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    /// Replace the factory that binds file sinks (used by tests to inject
    /// faulty sinks)
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn sink_factory(mut self, factory: SinkFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Validate the configuration and construct the manager
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if validation fails (no filesystem side
    /// effects occur in that case), `ResourceUnavailable` if the file
    /// destination cannot be bound. Never partially constructs.
    pub fn build(self) -> Result<OutputManager> {
        self.config.validate()?;

        let sink = match self.config.file_path {
            Some(_) => Some((self.factory)(&self.config)?),
            None => None,
        };

        Ok(OutputManager {
            inner: Arc::new(ManagerInner {
                state: RwLock::new(ManagerState {
                    config: self.config,
                    sink,
                    stats: RotationStats::default(),
                    hooks: Vec::new(),
                }),
                dispatcher: HookDispatcher::new(self.dispatch_mode),
                factory: self.factory,
            }),
        })
    }
}

/// Thread-safe manager for a console and/or rotating-file log destination
///
/// # Examples
///
/// ```no_run
/// use logsink::{OutputConfig, OutputManager};
/// use std::io::Write;
///
/// let manager = OutputManager::new(OutputConfig::file("logs/app.log")).unwrap();
/// let mut writer = manager.writer();
/// writeln!(writer, "service started").unwrap();
///
/// manager.force_rotation_if_needed().unwrap();
/// let stats = manager.rotation_stats();
/// println!("rotations so far: {}", stats.rotation_count);
/// ```
pub struct OutputManager {
    inner: Arc<ManagerInner>,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for OutputManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("OutputManager")
            .field("config", &state.config)
            .field("file_mode", &state.sink.is_some())
            .field("stats", &state.stats)
            .field("hooks", &state.hooks.len())
            .finish()
    }
}

impl OutputManager {
    /// Create a manager with default dispatch and the rolling-file sink
    ///
    /// # Errors
    ///
    /// See [`OutputManagerBuilder::build`].
    pub fn new(config: OutputConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a manager
    #[must_use]
    pub fn builder(config: OutputConfig) -> OutputManagerBuilder {
        OutputManagerBuilder::new(config)
    }

    /// Whether a file destination is bound
    #[must_use]
    pub fn is_file_mode(&self) -> bool {
        self.inner.state.read().sink.is_some()
    }

    /// Path of the current log file, if any
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        self.inner.state.read().config.file_path.clone()
    }

    /// Snapshot of the current configuration
    #[must_use]
    pub fn config(&self) -> OutputConfig {
        self.inner.state.read().config.clone()
    }

    /// Writer for the active destination: the file in file mode, stdout
    /// otherwise
    ///
    /// The handle follows reconfiguration; after `update_config` it writes
    /// to the newly bound destination.
    #[must_use]
    pub fn writer(&self) -> SinkWriter {
        SinkWriter::new(Arc::clone(&self.inner), WriteTarget::Active)
    }

    /// Writer duplicating every write to stdout and the file
    ///
    /// Degrades to console-only when no file is configured; never errors
    /// for that reason.
    #[must_use]
    pub fn multi_writer(&self) -> SinkWriter {
        SinkWriter::new(Arc::clone(&self.inner), WriteTarget::Tee)
    }

    /// Register a hook called once per rotation attempt, success or failure
    pub fn add_rotation_hook<F>(&self, hook: F)
    where
        F: Fn(&RotationEvent) + Send + Sync + 'static,
    {
        self.inner.state.write().hooks.push(Arc::new(hook));
    }

    /// Drop every registered rotation hook
    pub fn remove_all_rotation_hooks(&self) {
        self.inner.state.write().hooks.clear();
    }

    /// Snapshot of rotation statistics
    #[must_use]
    pub fn rotation_stats(&self) -> RotationStats {
        self.inner.state.read().stats
    }

    /// Size in bytes of the log file as it exists on disk
    ///
    /// # Errors
    ///
    /// `NotInFileMode` on a console-only manager; an IO error if the file
    /// cannot be stat-ed.
    pub fn current_file_size(&self) -> Result<u64> {
        let state = self.inner.state.read();
        let Some(sink) = state.sink.as_ref() else {
            return Err(SinkError::NotInFileMode);
        };
        let metadata = fs::metadata(sink.path()).map_err(|e| {
            SinkError::io_operation(
                "stat log file",
                format!("failed to stat '{}'", sink.path().display()),
                e,
            )
        })?;
        Ok(metadata.len())
    }

    /// Force a rotation now
    ///
    /// # Errors
    ///
    /// `NoFileConfigured` on a console-only manager; otherwise see
    /// [`OutputManager::force_rotation_if_needed`] for the recovery error
    /// contract.
    pub fn rotate(&self) -> Result<()> {
        self.rotate_with_recovery()
    }

    /// Rotate if the on-disk file has reached the configured size threshold
    ///
    /// Best-effort: returns `Ok(false)` without rotating when the manager is
    /// console-only, when the file cannot be stat-ed (for example, not yet
    /// created), or when the size is below `max_size_mb`.
    ///
    /// # Errors
    ///
    /// `RotationRecovered` when the rotation failed but the destination was
    /// rebound and stays writable; `RotationAndRecoveryFailed` when both
    /// steps failed and the destination may be unusable.
    pub fn force_rotation_if_needed(&self) -> Result<bool> {
        {
            let state = self.inner.state.read();
            let Some(sink) = state.sink.as_ref() else {
                return Ok(false);
            };
            let Ok(metadata) = fs::metadata(sink.path()) else {
                return Ok(false);
            };
            if metadata.len() < state.config.max_size_bytes() {
                return Ok(false);
            }
        }

        self.rotate_with_recovery()?;
        Ok(true)
    }

    /// Atomically replace the configuration
    ///
    /// The new destination is bound first; the old handle is closed and the
    /// stored configuration swapped only after binding succeeded. On any
    /// failure the prior configuration and handle are left intact.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration`, `ResourceUnavailable`, or the close error of
    /// the previous sink.
    pub fn update_config(&self, new_config: OutputConfig) -> Result<()> {
        new_config.validate()?;

        let new_sink = match new_config.file_path {
            Some(_) => Some((self.inner.factory)(&new_config)?),
            None => None,
        };

        let mut state = self.inner.state.write();
        if let Some(old) = state.sink.as_mut() {
            old.close()?;
        }
        state.sink = new_sink;
        state.config = new_config;
        Ok(())
    }

    /// Release the file handle; a no-op success in console mode
    ///
    /// The manager stays usable: a later write through a file-mode writer
    /// reopens the file.
    ///
    /// # Errors
    ///
    /// The sink's close error, typically a failed final flush.
    pub fn close(&self) -> Result<()> {
        let mut state = self.inner.state.write();
        if let Some(sink) = state.sink.as_mut() {
            sink.close()?;
        }
        Ok(())
    }

    /// Rotation with failure recovery
    ///
    /// Statistics only advance on success, count and timestamp in the same
    /// critical section. The rotation event reaches hooks whatever the
    /// outcome. On primitive failure the file handle is closed and rebound
    /// from the current configuration so the manager never keeps a broken
    /// handle.
    fn rotate_with_recovery(&self) -> Result<()> {
        let inner = &self.inner;
        let mut state = inner.state.write();

        let Some(sink) = state.sink.as_mut() else {
            return Err(SinkError::NoFileConfigured);
        };

        let path = sink.path().to_path_buf();
        let pre_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let rotation_time = Utc::now();
        let outcome = sink.rotate_now();

        let event = RotationEvent {
            timestamp: rotation_time,
            old_path: path.clone(),
            new_path: path,
            pre_rotation_size_bytes: pre_size,
            success: outcome.is_ok(),
            error: outcome.as_ref().err().map(ToString::to_string),
        };

        let result = match outcome {
            Ok(()) => {
                state.stats.last_rotation = Some(rotation_time);
                state.stats.rotation_count += 1;
                Ok(())
            }
            Err(rotation_err) => {
                // Never keep a broken handle: close best-effort, rebind fresh
                if let Some(sink) = state.sink.as_mut() {
                    let _ = sink.close();
                }
                match (inner.factory)(&state.config) {
                    Ok(new_sink) => {
                        state.sink = Some(new_sink);
                        Err(SinkError::recovered(rotation_err))
                    }
                    Err(recovery_err) => {
                        Err(SinkError::unrecovered(rotation_err, recovery_err))
                    }
                }
            }
        };

        // Snapshot hooks, then release the lock before dispatch
        let hooks = state.hooks.clone();
        drop(state);
        inner.dispatcher.dispatch(hooks, event);

        result
    }
}
