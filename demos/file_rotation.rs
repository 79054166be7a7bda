//! File rotation demo
//!
//! Writes log lines into a small rotating file, registers a rotation hook,
//! and forces a size-triggered rotation.

use logsink::prelude::*;
use std::io::Write;

fn main() -> Result<()> {
    let config = OutputConfig::file("logs/demo.log")
        .with_max_size_mb(1)
        .with_max_backups(3)
        .with_compress(true);

    let manager = OutputManager::new(config)?;

    manager.add_rotation_hook(|event| {
        println!(
            "rotated {} ({} bytes, success: {})",
            event.old_path.display(),
            event.pre_rotation_size_bytes,
            event.success
        );
    });

    let mut writer = manager.writer();
    for i in 0..50_000 {
        writeln!(writer, "demo log line number {}", i)?;
    }
    writer.flush()?;

    println!(
        "file size before check: {} bytes",
        manager.current_file_size()?
    );

    if manager.force_rotation_if_needed()? {
        let stats = manager.rotation_stats();
        println!(
            "rotation #{} at {:?}",
            stats.rotation_count, stats.last_rotation
        );
    }

    manager.close()?;
    Ok(())
}
