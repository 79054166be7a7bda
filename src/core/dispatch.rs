//! Hook dispatch with per-hook fault isolation
//!
//! Rotation outcomes are fanned out to registered hooks without blocking the
//! rotating caller. In the default [`DispatchMode::Background`] mode a
//! dedicated worker thread drains a bounded queue of dispatch jobs; each hook
//! runs supervised, so a panicking hook is reported to stderr and contained
//! instead of taking down the worker or its sibling hooks.
//! [`DispatchMode::Inline`] runs hooks on the caller thread with the same
//! supervision, which makes hook behavior deterministic in tests.

use super::event::{RotationEvent, RotationHook};
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

/// How rotation events reach registered hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Hand events to a background worker thread (fire-and-forget)
    #[default]
    Background,
    /// Run hooks synchronously on the rotating thread
    Inline,
}

/// Queue capacity for background dispatch jobs
const DISPATCH_QUEUE_CAPACITY: usize = 256;

struct DispatchJob {
    hooks: Vec<RotationHook>,
    event: RotationEvent,
}

/// Fans rotation events out to hooks according to a [`DispatchMode`]
pub struct HookDispatcher {
    mode: DispatchMode,
    sender: Option<Sender<DispatchJob>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl HookDispatcher {
    /// Create a dispatcher; `Background` mode spawns its worker thread here
    #[must_use]
    pub fn new(mode: DispatchMode) -> Self {
        match mode {
            DispatchMode::Inline => Self {
                mode,
                sender: None,
                worker: None,
            },
            DispatchMode::Background => {
                let (sender, receiver) = bounded::<DispatchJob>(DISPATCH_QUEUE_CAPACITY);
                let worker = thread::Builder::new()
                    .name("logsink-hooks".to_string())
                    .spawn(move || {
                        for job in receiver {
                            run_hooks(&job.hooks, &job.event);
                        }
                    })
                    .ok();

                // Thread spawn failure degrades to inline dispatch
                if worker.is_none() {
                    return Self {
                        mode: DispatchMode::Inline,
                        sender: None,
                        worker: None,
                    };
                }

                Self {
                    mode,
                    sender: Some(sender),
                    worker,
                }
            }
        }
    }

    /// The active dispatch mode
    #[must_use]
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Deliver one rotation event to a snapshot of the hook registry
    ///
    /// The caller passes an already-snapshotted hook list so no lock is held
    /// during hook execution. In background mode a full queue drops the
    /// delivery with a stderr diagnostic; hooks are best-effort.
    pub fn dispatch(&self, hooks: Vec<RotationHook>, event: RotationEvent) {
        if hooks.is_empty() {
            return;
        }

        match (&self.sender, self.mode) {
            (Some(sender), DispatchMode::Background) => {
                if let Err(TrySendError::Full(_)) = sender.try_send(DispatchJob { hooks, event }) {
                    eprintln!("[logsink] rotation hook queue full, event dropped");
                }
            }
            _ => run_hooks(&hooks, &event),
        }
    }
}

impl Drop for HookDispatcher {
    fn drop(&mut self) {
        // Disconnect the channel so the worker drains queued jobs and exits
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Run each hook under panic supervision
fn run_hooks(hooks: &[RotationHook], event: &RotationEvent) {
    for hook in hooks {
        let result = catch_unwind(AssertUnwindSafe(|| hook(event)));
        if let Err(panic_info) = result {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            eprintln!(
                "[logsink] rotation hook panicked: {}. Other hooks continue to run.",
                panic_msg
            );
        }
    }
}
