//! Integration tests for the output manager

use logsink::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

/// Sink whose rotation always fails; writes are swallowed
struct StuckSink {
    path: PathBuf,
}

impl RotatingSink for StuckSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn rotate_now(&mut self) -> Result<()> {
        Err(SinkError::rotation(
            self.path.display().to_string(),
            "simulated rotation failure",
        ))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Factory producing stuck sinks; can be told to fail after N bindings
fn stuck_factory(path: PathBuf, fail_after: Option<usize>) -> SinkFactory {
    let bindings = AtomicUsize::new(0);
    Arc::new(move |_config: &OutputConfig| {
        let n = bindings.fetch_add(1, Ordering::SeqCst);
        if fail_after.is_some_and(|limit| n >= limit) {
            return Err(SinkError::rotation(
                path.display().to_string(),
                "simulated rebind failure",
            ));
        }
        Ok(Box::new(StuckSink { path: path.clone() }) as Box<dyn RotatingSink>)
    })
}

fn inline_manager(config: OutputConfig) -> OutputManager {
    OutputManager::builder(config)
        .dispatch_mode(DispatchMode::Inline)
        .build()
        .unwrap()
}

#[test]
fn invalid_numeric_config_fails_without_side_effects() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("brand_new/app.log");

    let err = OutputManager::new(OutputConfig::file(&path).with_max_size_mb(0)).unwrap_err();
    assert!(matches!(err, SinkError::InvalidConfiguration { .. }));
    assert!(!path.parent().unwrap().exists());
}

#[test]
fn invalid_path_shapes_fail_construction() {
    for bad in ["logs/", "app.log", "./app.log", "logs/.."] {
        let err = OutputManager::new(OutputConfig::file(bad)).unwrap_err();
        assert!(
            matches!(err, SinkError::InvalidConfiguration { .. }),
            "path {:?} should be rejected",
            bad
        );
    }
}

#[test]
fn console_only_manager_has_no_file() {
    let manager = OutputManager::new(OutputConfig::console()).unwrap();
    assert!(!manager.is_file_mode());

    assert!(matches!(
        manager.current_file_size().unwrap_err(),
        SinkError::NotInFileMode
    ));

    // Console writer accepts writes
    let mut writer = manager.writer();
    writer.write_all(b"console line\n").unwrap();
    writer.flush().unwrap();
}

#[test]
fn construction_creates_directory_and_tracks_size() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("svc/logs/app.log");

    let manager = OutputManager::new(OutputConfig::file(&path)).unwrap();
    assert!(path.parent().unwrap().is_dir());

    let payload = b"exactly-twenty-bytes";
    let mut writer = manager.writer();
    writer.write_all(payload).unwrap();
    writer.flush().unwrap();

    assert_eq!(manager.current_file_size().unwrap(), payload.len() as u64);
}

#[test]
fn rotate_on_console_manager_leaves_stats_untouched() {
    let manager = inline_manager(OutputConfig::console());

    assert!(matches!(
        manager.rotate().unwrap_err(),
        SinkError::NoFileConfigured
    ));

    let stats = manager.rotation_stats();
    assert_eq!(stats.rotation_count, 0);
    assert!(stats.last_rotation.is_none());
}

#[test]
fn successful_rotation_advances_stats_atomically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let manager = inline_manager(OutputConfig::file(&path).with_compress(false));

    let start = chrono::Utc::now();
    manager.rotate().unwrap();

    let stats = manager.rotation_stats();
    assert_eq!(stats.rotation_count, 1);
    let last = stats.last_rotation.expect("timestamp must accompany the count");
    assert!(last >= start);
}

#[test]
fn hook_sees_each_rotation_exactly_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let manager = inline_manager(OutputConfig::file(&path).with_compress(false));

    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    manager.add_rotation_hook(move |event| {
        assert!(event.success);
        assert!(event.error.is_none());
        assert_eq!(event.old_path, event.new_path);
        c.fetch_add(1, Ordering::SeqCst);
    });

    manager.rotate().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    manager.remove_all_rotation_hooks();
    manager.rotate().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_hook_does_not_block_siblings_or_fail_rotation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let manager = inline_manager(OutputConfig::file(&path).with_compress(false));

    manager.add_rotation_hook(|_event| panic!("misbehaving observer"));

    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    manager.add_rotation_hook(move |_event| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    manager.rotate().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(manager.rotation_stats().rotation_count, 1);
}

#[test]
fn background_hooks_receive_events() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let manager = OutputManager::builder(OutputConfig::file(&path).with_compress(false))
        .dispatch_mode(DispatchMode::Background)
        .build()
        .unwrap();

    let (tx, rx) = crossbeam_channel::bounded(1);
    manager.add_rotation_hook(move |event| {
        let _ = tx.send(event.success);
    });

    manager.rotate().unwrap();
    let success = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(success);
}

#[test]
fn force_rotation_respects_threshold() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = OutputConfig::file(&path)
        .with_max_size_mb(1)
        .with_compress(false);
    let manager = inline_manager(config);

    // Below threshold: no rotation
    let mut writer = manager.writer();
    writer.write_all(&vec![b'x'; 1024]).unwrap();
    writer.flush().unwrap();
    assert!(!manager.force_rotation_if_needed().unwrap());
    assert_eq!(manager.rotation_stats().rotation_count, 0);

    // At/above threshold: exactly one rotation
    writer.write_all(&vec![b'x'; 2 * 1024 * 1024]).unwrap();
    writer.flush().unwrap();
    assert!(manager.force_rotation_if_needed().unwrap());
    assert_eq!(manager.rotation_stats().rotation_count, 1);
}

#[test]
fn force_rotation_triggers_at_exact_threshold() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = OutputConfig::file(&path)
        .with_max_size_mb(1)
        .with_compress(false);
    let manager = inline_manager(config.clone());

    // Exactly max_size_bytes on disk counts as "at the threshold"
    let mut writer = manager.writer();
    writer.write_all(&vec![b'x'; config.max_size_bytes() as usize]).unwrap();
    writer.flush().unwrap();
    assert_eq!(manager.current_file_size().unwrap(), config.max_size_bytes());

    assert!(manager.force_rotation_if_needed().unwrap());
    assert_eq!(manager.rotation_stats().rotation_count, 1);
}

#[test]
fn force_rotation_is_noop_when_file_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let manager = inline_manager(OutputConfig::file(&path).with_compress(false));

    fs::remove_file(&path).unwrap();
    assert!(!manager.force_rotation_if_needed().unwrap());
    assert_eq!(manager.rotation_stats().rotation_count, 0);
}

#[test]
fn end_to_end_oversized_file_is_rotated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = OutputConfig::file(&path)
        .with_max_size_mb(1)
        .with_compress(false);
    let manager = inline_manager(config);

    let mut writer = manager.writer();
    writer.write_all(&vec![b'y'; 2 * 1024 * 1024]).unwrap();
    writer.flush().unwrap();

    assert!(manager.force_rotation_if_needed().unwrap());
    assert_eq!(manager.rotation_stats().rotation_count, 1);

    // Live file starts over, old bytes are archived
    let live_size = fs::metadata(&path).unwrap().len();
    assert!(live_size < 2 * 1024 * 1024);
}

#[test]
fn update_config_rejects_invalid_and_keeps_writer_usable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let original = OutputConfig::file(&path);
    let manager = OutputManager::new(original.clone()).unwrap();

    let err = manager
        .update_config(OutputConfig::file("logs/"))
        .unwrap_err();
    assert!(matches!(err, SinkError::InvalidConfiguration { .. }));
    assert_eq!(manager.config(), original);

    let mut writer = manager.writer();
    writer.write_all(b"after failed update\n").unwrap();
    writer.flush().unwrap();
    assert!(manager.current_file_size().unwrap() > 0);
}

#[test]
fn failed_rotation_with_successful_recovery() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");

    let manager = OutputManager::builder(OutputConfig::file(&path))
        .dispatch_mode(DispatchMode::Inline)
        .sink_factory(stuck_factory(path.clone(), None))
        .build()
        .unwrap();

    let events = Arc::new(AtomicUsize::new(0));
    let e = Arc::clone(&events);
    manager.add_rotation_hook(move |event| {
        assert!(!event.success);
        let error = event.error.as_deref().expect("failed event carries error");
        assert!(error.contains("simulated rotation failure"));
        e.fetch_add(1, Ordering::SeqCst);
    });

    let err = manager.rotate().unwrap_err();
    assert!(matches!(err, SinkError::RotationRecovered { .. }));

    // Hooks observe the failure; stats do not advance
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(manager.rotation_stats().rotation_count, 0);

    // The manager stays usable after recovery
    assert!(manager.is_file_mode());
    let mut writer = manager.writer();
    writer.write_all(b"still alive\n").unwrap();
}

#[test]
fn failed_rotation_with_failed_recovery() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");

    // One successful binding (construction), then every rebind fails
    let manager = OutputManager::builder(OutputConfig::file(&path))
        .dispatch_mode(DispatchMode::Inline)
        .sink_factory(stuck_factory(path.clone(), Some(1)))
        .build()
        .unwrap();

    let err = manager.rotate().unwrap_err();
    match err {
        SinkError::RotationAndRecoveryFailed { rotation, recovery } => {
            assert!(rotation.to_string().contains("simulated rotation failure"));
            assert!(recovery.to_string().contains("simulated rebind failure"));
        }
        other => panic!("expected combined failure, got {}", other),
    }
    assert_eq!(manager.rotation_stats().rotation_count, 0);
}

#[test]
fn close_is_idempotent_and_console_close_succeeds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");

    let manager = OutputManager::new(OutputConfig::file(&path)).unwrap();
    manager.close().unwrap();
    manager.close().unwrap();

    let console = OutputManager::new(OutputConfig::console()).unwrap();
    console.close().unwrap();
}

#[test]
fn concurrent_writers_and_rotation_polling() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = OutputConfig::file(&path)
        .with_max_size_mb(1)
        .with_compress(false);
    let manager = inline_manager(config);

    let writer_manager = manager.clone();
    let writer_thread = thread::spawn(move || {
        let mut writer = writer_manager.writer();
        let line = vec![b'z'; 8 * 1024];
        for _ in 0..512 {
            writer.write_all(&line).unwrap();
        }
        writer.flush().unwrap();
    });

    let poll_manager = manager.clone();
    let poll_thread = thread::spawn(move || {
        for _ in 0..50 {
            let _ = poll_manager.force_rotation_if_needed().unwrap();
            thread::sleep(Duration::from_millis(1));
        }
    });

    writer_thread.join().unwrap();
    poll_thread.join().unwrap();

    // Whatever interleaving happened, the manager is consistent and usable
    let _ = manager.force_rotation_if_needed().unwrap();
    assert!(manager.current_file_size().unwrap() < 2 * 1024 * 1024);
}
