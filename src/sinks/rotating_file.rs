//! Size-rotating file sink with backup pruning and optional compression

use super::Sink;
use crate::core::config::RotationConfig;
use crate::core::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

struct RotatingState {
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

/// File sink that rolls the active file over once it exceeds the configured
/// size. Rotated files become `<name>.1`, `<name>.2`, ... (`.gz` suffixed
/// when compression is on); backups beyond the count or age limits are
/// removed during rotation.
pub struct RotatingFileSink {
    base_path: PathBuf,
    max_size: u64,
    max_backups: usize,
    max_age: Option<Duration>,
    compress: bool,
    state: Mutex<RotatingState>,
}

impl RotatingFileSink {
    /// Open (or create) the log file described by `cfg`.
    ///
    /// # Errors
    ///
    /// Fails when the filename is empty or the file cannot be opened.
    pub fn new(cfg: &RotationConfig) -> Result<Self> {
        if cfg.filename.is_empty() {
            return Err(LoggerError::config("rotation", "empty filename"));
        }
        let base_path = PathBuf::from(&cfg.filename);

        if let Some(parent) = base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::rotation(
                        base_path.display().to_string(),
                        format!("cannot create log directory: {}", e),
                    )
                })?;
            }
        }

        let (file, size) = open_append(&base_path)?;

        let max_size_mb = if cfg.max_size_mb == 0 { 100 } else { cfg.max_size_mb };
        let max_age = (cfg.max_age_days > 0)
            .then(|| Duration::from_secs(u64::from(cfg.max_age_days) * 24 * 60 * 60));

        Ok(Self {
            base_path,
            max_size: max_size_mb * 1024 * 1024,
            max_backups: cfg.max_backups,
            max_age,
            compress: cfg.compress,
            state: Mutex::new(RotatingState {
                writer: Some(BufWriter::new(file)),
                current_size: size,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    fn rotate(&self, state: &mut RotatingState) -> Result<()> {
        if let Some(mut writer) = state.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::rotation(
                    self.base_path.display().to_string(),
                    format!("flush before rotation failed: {}", e),
                )
            })?;
        }

        self.prune_backups();

        // Shift <name>.N to <name>.N+1, newest backup last so renames never
        // clobber a file that still needs to move.
        if self.max_backups > 0 {
            for i in (1..self.max_backups).rev() {
                for (old, new) in [
                    (self.backup_path(i), self.backup_path(i + 1)),
                    (
                        gz_path(&self.backup_path(i)),
                        gz_path(&self.backup_path(i + 1)),
                    ),
                ] {
                    if old.exists() {
                        if new.exists() {
                            let _ = fs::remove_file(&new);
                        }
                        let _ = fs::rename(&old, &new);
                    }
                }
            }

            if self.base_path.exists() {
                let backup = self.backup_path(1);
                fs::rename(&self.base_path, &backup).map_err(|e| {
                    LoggerError::rotation(
                        self.base_path.display().to_string(),
                        format!("cannot move active file aside: {}", e),
                    )
                })?;
                if self.compress {
                    self.compress_backup(&backup)?;
                }
            }
        } else if self.base_path.exists() {
            // No backups retained: truncate by removing the active file.
            let _ = fs::remove_file(&self.base_path);
        }

        let (file, size) = open_append(&self.base_path)?;
        state.writer = Some(BufWriter::new(file));
        state.current_size = size;
        Ok(())
    }

    /// Remove backups beyond the retention count or older than max age.
    fn prune_backups(&self) {
        if self.max_backups > 0 {
            for path in [
                self.backup_path(self.max_backups),
                gz_path(&self.backup_path(self.max_backups)),
            ] {
                if path.exists() {
                    let _ = fs::remove_file(&path);
                }
            }
        }

        let Some(max_age) = self.max_age else { return };
        let cutoff = SystemTime::now().checked_sub(max_age);
        let Some(cutoff) = cutoff else { return };

        for i in 1..=self.max_backups.max(1) {
            for path in [self.backup_path(i), gz_path(&self.backup_path(i))] {
                let Ok(meta) = fs::metadata(&path) else { continue };
                if meta.modified().map(|m| m < cutoff).unwrap_or(false) {
                    let _ = fs::remove_file(&path);
                }
            }
        }
    }

    /// Gzip a rotated backup in place; the original is removed only after
    /// the compressed copy is fully written and renamed.
    fn compress_backup(&self, path: &Path) -> Result<()> {
        let target = gz_path(path);
        let tmp = path.with_extension("gz.tmp");

        let result = (|| -> io::Result<()> {
            let mut reader = BufReader::new(File::open(path)?);
            let out = BufWriter::new(File::create(&tmp)?);
            let mut encoder =
                flate2::write::GzEncoder::new(out, flate2::Compression::default());
            io::copy(&mut reader, &mut encoder)?;
            encoder.finish()?.flush()?;
            fs::rename(&tmp, &target)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(LoggerError::rotation(
                path.display().to_string(),
                format!("compression failed: {}", e),
            ));
        }

        let _ = fs::remove_file(path);
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::rotation(
                path.display().to_string(),
                format!("cannot open log file: {}", e),
            )
        })?;
    let size = file
        .metadata()
        .map_err(|e| {
            LoggerError::rotation(
                path.display().to_string(),
                format!("cannot stat log file: {}", e),
            )
        })?
        .len();
    Ok((file, size))
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".gz");
    path.with_file_name(name)
}

impl Sink for RotatingFileSink {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();

        if state.current_size >= self.max_size {
            if let Err(e) = self.rotate(&mut state) {
                // Keep logging into the oversized file rather than lose
                // records; size tracking resets so rotation is retried
                // later instead of on every write.
                eprintln!("[logger] rotation failed: {}", e);
                if state.writer.is_none() {
                    let (file, size) = open_append(&self.base_path)
                        .map_err(|err| io::Error::other(err.to_string()))?;
                    state.writer = Some(BufWriter::new(file));
                    state.current_size = size;
                } else {
                    state.current_size = 0;
                }
            }
        }

        let writer = state
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::other("rotating sink writer missing"))?;
        writer.write_all(buf)?;
        writer.flush()?;
        state.current_size += buf.len() as u64;
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        if let Some(mut writer) = state.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(path: &Path) -> RotationConfig {
        RotationConfig {
            enabled: true,
            filename: path.display().to_string(),
            max_size_mb: 1,
            max_age_days: 0,
            max_backups: 3,
            compress: false,
        }
    }

    #[test]
    fn test_create_and_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = RotatingFileSink::new(&config(&path)).unwrap();

        sink.write(b"line one\n").unwrap();
        sink.close().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "line one\n");
    }

    #[test]
    fn test_empty_filename_rejected() {
        let cfg = RotationConfig {
            filename: String::new(),
            ..config(Path::new("x"))
        };
        assert!(RotatingFileSink::new(&cfg).is_err());
    }

    #[test]
    fn test_rotation_creates_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roll.log");
        let mut cfg = config(&path);
        cfg.max_size_mb = 1;
        let sink = RotatingFileSink::new(&cfg).unwrap();

        // Force tiny threshold by writing more than max_size bytes.
        {
            let mut state = sink.state.lock();
            state.current_size = sink.max_size;
        }
        sink.write(b"after rotation\n").unwrap();
        sink.close().unwrap();

        assert!(path.with_file_name("roll.log.1").exists());
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "after rotation\n");
    }

    #[test]
    fn test_compressed_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gz.log");
        let mut cfg = config(&path);
        cfg.compress = true;
        let sink = RotatingFileSink::new(&cfg).unwrap();

        sink.write(b"first file contents\n").unwrap();
        {
            let mut state = sink.state.lock();
            state.current_size = sink.max_size;
        }
        sink.write(b"second file\n").unwrap();
        sink.close().unwrap();

        assert!(path.with_file_name("gz.log.1.gz").exists());
        assert!(!path.with_file_name("gz.log.1").exists());
    }

    #[test]
    fn test_backup_count_bounded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multi.log");
        let mut cfg = config(&path);
        cfg.max_backups = 2;
        let sink = RotatingFileSink::new(&cfg).unwrap();

        for i in 0..5 {
            sink.write(format!("entry {}\n", i).as_bytes()).unwrap();
            let mut state = sink.state.lock();
            state.current_size = sink.max_size;
        }
        sink.close().unwrap();

        let backups = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("multi.log."))
            .count();
        assert!(backups <= 2, "expected at most 2 backups, found {}", backups);
    }
}
