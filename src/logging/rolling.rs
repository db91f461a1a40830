//! Size-based rolling log file
//!
//! `tracing-appender` only rotates on time, services here rotate on size:
//! once the next write would push the active file past `max_bytes` it is
//! renamed to `<stem>-<timestamp>.<ext>` and a fresh file is opened. Old
//! backups are then compressed and pruned according to the policy.

use chrono::{Duration, NaiveDateTime, SubsecRound, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::LogStdAndFileConfig;

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESSED_SUFFIX: &str = ".zst";

/// When to rotate and what to keep afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    /// Newest backups to keep, 0 keeps all.
    pub max_backups: usize,
    /// Backups older than this are removed, 0 disables the check.
    pub max_age_days: u64,
    pub compress: bool,
}

impl RotationPolicy {
    pub fn from_config(cfg: &LogStdAndFileConfig) -> Self {
        let max_size_mb = if cfg.log_max_size == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            cfg.log_max_size
        };
        Self {
            max_bytes: max_size_mb * MEGABYTE,
            max_backups: cfg.log_max_backups,
            max_age_days: cfg.log_max_age,
            compress: cfg.log_compress,
        }
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_SIZE_MB * MEGABYTE,
            max_backups: 0,
            max_age_days: 0,
            compress: false,
        }
    }
}

#[derive(Debug)]
struct Backup {
    path: PathBuf,
    timestamp: NaiveDateTime,
    compressed: bool,
}

/// Append-only log file that rotates itself by size.
#[derive(Debug)]
pub struct RollingFile {
    path: PathBuf,
    policy: RotationPolicy,
    file: File,
    size: u64,
}

impl RollingFile {
    /// Open (or create) the active log file, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            policy,
            file,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the active file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Rename the active file to a timestamped backup and start a new one.
    pub fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let backup = self.next_backup_path()?;
        fs::rename(&self.path, &backup)?;
        self.file = open_append(&self.path)?;
        self.size = 0;
        self.prune();
        Ok(())
    }

    /// Backup stamps have millisecond resolution and must sort after every
    /// existing backup, so a rotation inside the same millisecond moves on.
    fn next_backup_path(&self) -> io::Result<PathBuf> {
        let mut ts = Utc::now().naive_utc().trunc_subsecs(3);
        if let Some(newest) = self.backups()?.first() {
            if newest.timestamp >= ts {
                ts = newest.timestamp + Duration::milliseconds(1);
            }
        }
        Ok(self.backup_name(ts))
    }

    fn backup_name(&self, ts: NaiveDateTime) -> PathBuf {
        let (stem, ext) = self.name_parts();
        let stamp = ts.format(BACKUP_TIME_FORMAT);
        let name = match ext {
            Some(ext) => format!("{}-{}.{}", stem, stamp, ext),
            None => format!("{}-{}", stem, stamp),
        };
        self.dir().join(name)
    }

    fn name_parts(&self) -> (String, Option<String>) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().into_owned());
        (stem, ext)
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn parse_backup(&self, file_name: &str) -> Option<(NaiveDateTime, bool)> {
        let (stem, ext) = self.name_parts();
        let (name, compressed) = match file_name.strip_suffix(COMPRESSED_SUFFIX) {
            Some(rest) => (rest, true),
            None => (file_name, false),
        };
        let rest = name.strip_prefix(&stem)?.strip_prefix('-')?;
        let stamp = match &ext {
            Some(ext) => rest.strip_suffix(ext.as_str())?.strip_suffix('.')?,
            None => rest,
        };
        let ts = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;
        Some((ts, compressed))
    }

    /// Backups of this log file, newest first.
    fn backups(&self) -> io::Result<Vec<Backup>> {
        let mut backups = Vec::new();
        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some((timestamp, compressed)) = self.parse_backup(file_name) {
                backups.push(Backup {
                    path: entry.path(),
                    timestamp,
                    compressed,
                });
            }
        }
        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    fn prune(&self) {
        let mut backups = match self.backups() {
            Ok(backups) => backups,
            Err(e) => {
                tracing::warn!(dir = %self.dir().display(), error = %e, "Failed to list log backups");
                return;
            }
        };

        if self.policy.max_backups > 0 && backups.len() > self.policy.max_backups {
            for old in backups.split_off(self.policy.max_backups) {
                remove_backup(&old, "surplus");
            }
        }

        if let Some(cutoff) = age_cutoff(self.policy.max_age_days) {
            let (keep, expired): (Vec<_>, Vec<_>) =
                backups.into_iter().partition(|b| b.timestamp >= cutoff);
            for old in expired {
                remove_backup(&old, "expired");
            }
            backups = keep;
        }

        if self.policy.compress {
            for backup in backups.iter().filter(|b| !b.compressed) {
                if let Err(e) = compress_file(&backup.path) {
                    tracing::warn!(path = %backup.path.display(), error = %e, "Failed to compress log backup");
                }
            }
        }
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.policy.max_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {} exceeds maximum file size {}",
                    len, self.policy.max_bytes
                ),
            ));
        }
        if self.size + len > self.policy.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Oldest backup stamp still kept. `None` when age pruning is off or the
/// age reaches past the earliest representable time.
fn age_cutoff(max_age_days: u64) -> Option<NaiveDateTime> {
    if max_age_days == 0 {
        return None;
    }
    let age = Duration::try_days(i64::try_from(max_age_days).ok()?)?;
    Utc::now().naive_utc().checked_sub_signed(age)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_backup(backup: &Backup, reason: &str) {
    tracing::debug!(path = %backup.path.display(), reason, "Removing log backup");
    if let Err(e) = fs::remove_file(&backup.path) {
        tracing::warn!(path = %backup.path.display(), error = %e, "Failed to remove log backup");
    }
}

fn compress_file(path: &Path) -> io::Result<()> {
    let target = append_suffix(path, COMPRESSED_SUFFIX);
    let mut src = File::open(path)?;
    let dst = File::create(&target)?;
    zstd::stream::copy_encode(&mut src, dst, 0)?;
    fs::remove_file(path)
}
