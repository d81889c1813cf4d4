//! Size-rotated log file sink
//!
//! `RotatingFile` is a plain `io::Write`: once the active file would grow
//! past `max_size` it is renamed to `<name>.1` (older backups shift up to
//! `<name>.N`), optionally gzip-compressed, and a fresh file is opened.
//! Backups beyond `max_backups` or older than `max_age` are deleted.

use crate::core::config::LoggerConfig;
use crate::core::error::{LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Rotation thresholds
///
/// # Examples
///
/// ```
/// use kv_logger::backends::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_backups(7)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(true);
/// assert_eq!(policy.max_backups, 7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPolicy {
    /// Rotate before the active file exceeds this many bytes
    pub max_size: u64,
    /// Maximum number of rotated files to keep
    pub max_backups: usize,
    /// Rotated files older than this are removed
    pub max_age: Option<Duration>,
    /// Whether to gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: 1024 * 1024 * 1024,
            max_backups: 3,
            max_age: Some(Duration::from_secs(30 * 24 * 3600)),
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Thresholds from a resolved configuration
    #[must_use]
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self {
            max_size: config.max_size_bytes(),
            max_backups: config.max_backups,
            max_age: config.max_age(),
            compress: config.compress,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// File sink with size-based rotation
pub struct RotatingFile {
    base_path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl RotatingFile {
    /// Open (or create) `path` for appending
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory or the file cannot be created
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open(&base_path)?;
        Ok(Self {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
        })
    }

    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        Self::new(&config.file, RotationPolicy::from_config(config))
    }

    fn open(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "open log file",
                    format!("Failed to open '{}'", path.display()),
                    e,
                )
            })?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok((file, size))
    }

    /// Get current file size
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Path of the `index`-th backup (1 is the newest)
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self
            .base_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "app.log".into());
        name.push(format!(".{}", index));
        self.base_path.with_file_name(name)
    }

    fn compressed_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.current_size > 0 && self.current_size + incoming as u64 > self.policy.max_size
    }

    /// Close the active file, shift backups and start a new file
    pub fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.policy.max_backups == 0 {
            fs::remove_file(&self.base_path).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to remove log file: {}", e),
                )
            })?;
        } else {
            // Oldest slot is overwritten by the shift below
            let oldest = self.backup_path(self.policy.max_backups);
            remove_if_exists(&oldest);
            remove_if_exists(&Self::compressed_path(&oldest));

            for i in (1..self.policy.max_backups).rev() {
                let from = self.backup_path(i);
                let to = self.backup_path(i + 1);
                for (src, dst) in [
                    (Self::compressed_path(&from), Self::compressed_path(&to)),
                    (from, to),
                ] {
                    if src.exists() {
                        fs::rename(&src, &dst).map_err(|e| {
                            LoggerError::file_rotation(
                                src.display().to_string(),
                                format!("Failed to shift backup: {}", e),
                            )
                        })?;
                    }
                }
            }

            let newest = self.backup_path(1);
            fs::rename(&self.base_path, &newest).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
            if self.policy.compress {
                compress_file(&newest)?;
            }
        }

        let (file, size) = Self::open(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;

        self.remove_expired();
        Ok(())
    }

    /// Delete backups older than `max_age`
    fn remove_expired(&self) {
        let Some(max_age) = self.policy.max_age else {
            return;
        };
        let now = SystemTime::now();
        for i in 1..=self.policy.max_backups {
            let plain = self.backup_path(i);
            for path in [Self::compressed_path(&plain), plain] {
                let expired = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > max_age);
                if expired {
                    remove_if_exists(&path);
                }
            }
        }
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            self.rotate().map_err(io::Error::other)?;
        }
        if self.writer.is_none() {
            // A failed rotation left no file open; try to recover
            let (file, size) = Self::open(&self.base_path).map_err(io::Error::other)?;
            self.current_size = size;
            self.writer = Some(BufWriter::new(file));
        }
        let written = match self.writer.as_mut() {
            Some(w) => w.write(buf)?,
            None => return Err(io::Error::other("log file is not open")),
        };
        self.current_size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush log file on drop: {}", e);
        }
    }
}

fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => eprintln!(
            "[LOGGER WARNING] Failed to remove old backup {}: {}",
            path.display(),
            e
        ),
    }
}

/// Gzip `path` to `path.gz`, removing the original only after success
fn compress_file(path: &Path) -> Result<()> {
    let gz_path = RotatingFile::compressed_path(path);
    let mut tmp_name = gz_path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let result = (|| -> io::Result<()> {
        let mut input = io::BufReader::new(File::open(path)?);
        let output = BufWriter::new(File::create(&tmp_path)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&tmp_path, &gz_path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    remove_if_exists(path);
    Ok(())
}
