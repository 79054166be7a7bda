//! Rolling file sink with timestamped backups
//!
//! Default [`RotatingSink`] implementation. Rotation happens only when
//! explicitly requested: the live file is renamed to a timestamped backup
//! (`app-2024-05-01T12-30-05.123456789.log`), optionally gzip-compressed,
//! old backups are pruned by count and age, and a fresh file is opened under
//! the original name.

use crate::core::config::OutputConfig;
use crate::core::error::{Result, SinkError};
use crate::core::sink::RotatingSink;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Timestamp layout embedded in backup file names
///
/// Nanosecond precision keeps names unique across back-to-back rotations.
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.9f";

/// File sink that archives the live file under a timestamped name on rotation
#[derive(Debug)]
pub struct RollingFile {
    path: PathBuf,
    max_age_days: u32,
    max_backups: u32,
    compress: bool,
    use_local_time: bool,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl RollingFile {
    /// Open (creating if necessary) the log file described by `config`
    ///
    /// The parent directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns `NoFileConfigured` for a console-only config and
    /// `ResourceUnavailable` when the directory or file cannot be created.
    pub fn open(config: &OutputConfig) -> Result<Self> {
        let path = config
            .file_path
            .clone()
            .ok_or(SinkError::NoFileConfigured)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SinkError::resource(
                        parent.display().to_string(),
                        "failed to create log directory",
                        e,
                    )
                })?;
            }
        }

        let (writer, current_size) = Self::open_append(&path)?;

        Ok(Self {
            path,
            max_age_days: config.max_age_days,
            max_backups: config.max_backups,
            compress: config.compress,
            use_local_time: config.use_local_time,
            writer: Some(writer),
            current_size,
        })
    }

    fn open_append(path: &Path) -> Result<(BufWriter<File>, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                SinkError::resource(path.display().to_string(), "failed to open log file", e)
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                SinkError::resource(
                    path.display().to_string(),
                    "cannot access file metadata",
                    e,
                )
            })?
            .len();

        Ok((BufWriter::new(file), size))
    }

    /// Bytes written to the live file since open or last rotation
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    fn file_name_parts(&self) -> (String, String) {
        let name = self
            .path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("app.log");
        match name.rfind('.') {
            Some(idx) if idx > 0 => (name[..idx].to_string(), name[idx..].to_string()),
            _ => (name.to_string(), String::new()),
        }
    }

    fn backup_path(&self) -> PathBuf {
        let (stem, ext) = self.file_name_parts();
        let stamp = if self.use_local_time {
            Local::now().format(BACKUP_TIME_FORMAT).to_string()
        } else {
            Utc::now().format(BACKUP_TIME_FORMAT).to_string()
        };
        self.path.with_file_name(format!("{}-{}{}", stem, stamp, ext))
    }

    /// Parse the rotation time back out of a backup file name
    fn backup_time(&self, file_name: &str) -> Option<DateTime<Utc>> {
        let (stem, ext) = self.file_name_parts();
        let prefix = format!("{}-", stem);

        let rest = file_name.strip_prefix(&prefix)?;
        let rest = rest.strip_suffix(".gz").unwrap_or(rest);
        let stamp = if ext.is_empty() {
            rest
        } else {
            rest.strip_suffix(ext.as_str())?
        };

        let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;
        if self.use_local_time {
            Local
                .from_local_datetime(&naive)
                .single()
                .map(|t| t.with_timezone(&Utc))
        } else {
            Some(Utc.from_utc_datetime(&naive))
        }
    }

    /// List existing backups for this file, newest first
    fn list_backups(&self) -> Vec<(DateTime<Utc>, PathBuf)> {
        let Some(dir) = self.path.parent() else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };

        let mut backups: Vec<(DateTime<Utc>, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let time = self.backup_time(name.to_str()?)?;
                Some((time, entry.path()))
            })
            .collect();

        backups.sort_by(|a, b| b.0.cmp(&a.0));
        backups
    }

    /// Delete backups beyond the retention count or older than the age limit
    ///
    /// Also sweeps `.gz.tmp` leftovers from aborted compressions. Deletion
    /// failures are reported to stderr and skipped; pruning must not fail an
    /// otherwise successful rotation.
    fn prune_backups(&self) {
        self.sweep_stale_temp_files();

        let backups = self.list_backups();
        let cutoff = (self.max_age_days > 0)
            .then(|| Utc::now() - chrono::Duration::days(i64::from(self.max_age_days)));

        for (index, (time, path)) in backups.iter().enumerate() {
            let over_count = self.max_backups > 0 && index >= self.max_backups as usize;
            let over_age = cutoff.is_some_and(|c| *time < c);
            if !(over_count || over_age) {
                continue;
            }

            if let Err(e) = fs::remove_file(path) {
                eprintln!(
                    "[logsink] failed to remove old backup {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    /// Remove temp files a crashed or failed compression left behind
    fn sweep_stale_temp_files(&self) {
        let (stem, _) = self.file_name_parts();
        let prefix = format!("{}-", stem);
        let Some(dir) = self.path.parent() else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(&prefix) && name.ends_with(".gz.tmp") {
                if let Err(e) = fs::remove_file(entry.path()) {
                    eprintln!(
                        "[logsink] failed to remove stale temp file {}: {}",
                        entry.path().display(),
                        e
                    );
                }
            }
        }
    }

    /// Compress a rotated backup in place, replacing it with a `.gz` file
    ///
    /// Streams through a 64 KB buffer and writes to a temporary file first so
    /// the original is only removed after compression fully succeeded.
    fn compress_backup(&self, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or_else(|| SinkError::rotation(path.display().to_string(), "invalid backup name"))?;
        let gz_path = path.with_file_name(format!("{}.gz", file_name));
        let tmp_path = path.with_file_name(format!("{}.gz.tmp", file_name));

        let input = File::open(path).map_err(|e| {
            SinkError::io_operation(
                "compress rotated file",
                format!("failed to open '{}'", path.display()),
                e,
            )
        })?;
        let mut reader = BufReader::with_capacity(64 * 1024, input);

        let output = File::create(&tmp_path).map_err(|e| {
            SinkError::io_operation(
                "compress rotated file",
                format!("failed to create '{}'", tmp_path.display()),
                e,
            )
        })?;
        let mut encoder = flate2::write::GzEncoder::new(
            BufWriter::with_capacity(64 * 1024, output),
            flate2::Compression::default(),
        );

        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let bytes_read = reader.read(&mut buffer).map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                SinkError::io_operation(
                    "compress rotated file",
                    format!("failed to read '{}'", path.display()),
                    e,
                )
            })?;
            if bytes_read == 0 {
                break;
            }
            encoder.write_all(&buffer[..bytes_read]).map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                SinkError::io_operation(
                    "compress rotated file",
                    "failed to write compressed chunk".to_string(),
                    e,
                )
            })?;
        }

        encoder.finish().map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            SinkError::io_operation(
                "compress rotated file",
                "failed to finish compression".to_string(),
                e,
            )
        })?;

        fs::rename(&tmp_path, &gz_path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            SinkError::io_operation(
                "compress rotated file",
                format!("failed to move compressed file to '{}'", gz_path.display()),
                e,
            )
        })?;

        // Original stays behind only if removal fails; next prune picks it up
        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[logsink] compressed {} but failed to remove original: {}",
                path.display(),
                e
            );
        }

        Ok(())
    }
}

impl RotatingSink for RollingFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        // A closed or recovered sink reopens transparently on the next write
        if self.writer.is_none() {
            let (writer, size) = Self::open_append(&self.path)?;
            self.writer = Some(writer);
            self.current_size = size;
        }

        let writer = self.writer.as_mut().ok_or(SinkError::SinkClosed)?;
        writer.write_all(buf).map_err(|e| {
            SinkError::io_operation(
                "write log bytes",
                format!("failed to write to '{}'", self.path.display()),
                e,
            )
        })?;
        self.current_size += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                SinkError::io_operation(
                    "flush log file",
                    format!("failed to flush '{}'", self.path.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn rotate_now(&mut self) -> Result<()> {
        // Flush and release the handle before renaming
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                SinkError::rotation(
                    self.path.display().to_string(),
                    format!("failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.path.exists() {
            let backup = self.backup_path();
            fs::rename(&self.path, &backup).map_err(|e| {
                SinkError::rotation(
                    self.path.display().to_string(),
                    format!("failed to archive current file: {}", e),
                )
            })?;

            if self.compress {
                self.compress_backup(&backup)?;
            }
        }

        self.prune_backups();

        let (writer, size) = Self::open_append(&self.path)?;
        self.writer = Some(writer);
        self.current_size = size;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                SinkError::io_operation(
                    "close log file",
                    format!("failed to flush '{}'", self.path.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RollingFile {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
