//! The WAL archive directory.
//!
//! A flat directory holding completed segments (`<24 hex>`) and the
//! segment currently being streamed (`<24 hex>.partial`). Anything else
//! (timeline history files, backup labels, stray files) is ignored.
//!
//! The monitor and the restore orchestrator share one [`ArchiveDir`].
//! Scans take the shared side of its [`ArchiveLock`] and the snapshot copy
//! takes the exclusive side, so a scan never sees a half-written copy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{WalFileName, parse_wal_filename};
use crate::error::PitrError;

/// Suffix marking a segment that is still being written.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// A classified archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name as it appears on disk.
    pub raw_name: String,
    /// Name with any `.partial` suffix stripped.
    pub canonical_name: String,
    /// Parsed components of the canonical name.
    pub wal: WalFileName,
    /// Whether the entry carried the `.partial` suffix.
    pub is_partial: bool,
}

/// Splits a directory entry name into canonical name and partial flag,
/// returning `None` for anything that is not a WAL segment.
#[must_use]
pub fn classify_entry(raw_name: &str) -> Option<ArchiveEntry> {
    let (canonical, is_partial) = match raw_name.strip_suffix(PARTIAL_SUFFIX) {
        Some(stripped) => (stripped, true),
        None => (raw_name, false),
    };
    let wal = parse_wal_filename(canonical)?;
    Some(ArchiveEntry {
        raw_name: raw_name.to_string(),
        canonical_name: canonical.to_string(),
        wal,
        is_partial,
    })
}

/// A WAL segment seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedSegment {
    /// The classified entry.
    pub entry: ArchiveEntry,
    /// File size at the time of the scan.
    pub size_bytes: u64,
}

/// Outcome of one directory scan.
#[derive(Debug, Default)]
pub struct ArchiveScan {
    /// Entries that classified as WAL segments.
    pub segments: Vec<ObservedSegment>,
    /// Entries ignored as non-WAL or unreadable.
    pub skipped: usize,
}

/// Shared/exclusive coordination between archive scans and snapshots.
#[derive(Debug, Clone, Default)]
pub struct ArchiveLock(Arc<RwLock<()>>);

impl ArchiveLock {
    /// Creates a new unlocked lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the shared side (scans).
    pub async fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.0.read().await
    }

    /// Acquires the exclusive side (snapshots).
    pub async fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.0.write().await
    }
}

/// Handle on the archive directory.
#[derive(Debug, Clone)]
pub struct ArchiveDir {
    path: PathBuf,
    lock: ArchiveLock,
}

impl ArchiveDir {
    /// Creates a handle with its own lock.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: ArchiveLock::new(),
        }
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the lock shared by every clone of this handle.
    #[must_use]
    pub fn lock(&self) -> &ArchiveLock {
        &self.lock
    }

    /// Lists and classifies the directory.
    ///
    /// Callers that need consistency with snapshots must hold
    /// [`ArchiveLock::shared`] while calling this.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Io`] if the directory itself cannot be read.
    /// Individual entries whose metadata cannot be read are skipped.
    pub async fn scan(&self) -> Result<ArchiveScan, PitrError> {
        let mut dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| PitrError::io(format!("failed to read archive dir {}", self.path.display()), e))?;

        let mut scan = ArchiveScan::default();
        loop {
            let next = dir
                .next_entry()
                .await
                .map_err(|e| PitrError::io(format!("failed to read archive dir {}", self.path.display()), e))?;
            let Some(entry) = next else {
                break;
            };

            let raw_name = entry.file_name().to_string_lossy().into_owned();
            let Some(classified) = classify_entry(&raw_name) else {
                scan.skipped += 1;
                continue;
            };

            match entry.metadata().await {
                Ok(meta) if meta.is_file() => scan.segments.push(ObservedSegment {
                    entry: classified,
                    size_bytes: meta.len(),
                }),
                Ok(_) => scan.skipped += 1,
                Err(e) => {
                    tracing::warn!(file_name = %raw_name, error = %e, "failed to stat archive entry");
                    scan.skipped += 1;
                }
            }
        }
        Ok(scan)
    }

    /// Copies every `.partial` file to its suffix-stripped name, returning
    /// the canonical names written.
    ///
    /// Holds [`ArchiveLock::exclusive`] for the whole copy. An existing file
    /// under the canonical name is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Io`] on the first listing or copy failure.
    pub async fn snapshot_partials(&self) -> Result<Vec<String>, PitrError> {
        let _guard = self.lock.exclusive().await;

        let mut dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| PitrError::io(format!("failed to read archive dir {}", self.path.display()), e))?;

        let mut partials = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| PitrError::io(format!("failed to read archive dir {}", self.path.display()), e))?
        {
            let raw_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(canonical) = raw_name.strip_suffix(PARTIAL_SUFFIX)
                && !canonical.is_empty()
            {
                partials.push((raw_name.clone(), canonical.to_string()));
            }
        }
        // Deterministic order for logs and callers.
        partials.sort();

        let mut written = Vec::with_capacity(partials.len());
        for (raw_name, canonical) in partials {
            let src = self.path.join(&raw_name);
            let dst = self.path.join(&canonical);
            tracing::info!(from = %raw_name, to = %canonical, "snapshotting WAL");
            tokio::fs::copy(&src, &dst)
                .await
                .map_err(|e| PitrError::io(format!("failed to copy {} to {}", src.display(), dst.display()), e))?;
            written.push(canonical);
        }
        Ok(written)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn classify_complete_segment() {
        let Some(entry) = classify_entry("000000010000000000000002") else {
            panic!("should classify");
        };
        assert!(!entry.is_partial);
        assert_eq!(entry.canonical_name, "000000010000000000000002");
        assert_eq!(entry.wal.timeline_id, 1);
    }

    #[test]
    fn classify_partial_segment() {
        let Some(entry) = classify_entry("000000010000000000000003.partial") else {
            panic!("should classify");
        };
        assert!(entry.is_partial);
        assert_eq!(entry.raw_name, "000000010000000000000003.partial");
        assert_eq!(entry.canonical_name, "000000010000000000000003");
    }

    #[test]
    fn classify_ignores_other_files() {
        for name in [
            "00000002.history",
            "000000010000000000000002.00000028.backup",
            ".partial",
            "README",
            "000000010000000000000003.partial.tmp",
        ] {
            assert!(classify_entry(name).is_none(), "classified {name}");
        }
    }

    #[tokio::test]
    async fn scan_reports_sizes_and_skips() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let write = |name: &str, len: usize| std::fs::write(dir.path().join(name), vec![0u8; len]);
        assert!(write("000000010000000000000001", 64).is_ok());
        assert!(write("000000010000000000000002.partial", 10).is_ok());
        assert!(write("00000002.history", 3).is_ok());
        assert!(std::fs::create_dir(dir.path().join("000000010000000000000009")).is_ok());

        let archive = ArchiveDir::new(dir.path());
        let Ok(mut scan) = archive.scan().await else {
            panic!("scan failed");
        };
        scan.segments.sort_by(|a, b| a.entry.raw_name.cmp(&b.entry.raw_name));

        assert_eq!(scan.skipped, 2);
        assert_eq!(scan.segments.len(), 2);
        let sizes: Vec<(bool, u64)> = scan
            .segments
            .iter()
            .map(|s| (s.entry.is_partial, s.size_bytes))
            .collect();
        assert_eq!(sizes, vec![(false, 64), (true, 10)]);
    }

    #[tokio::test]
    async fn scan_of_missing_dir_is_io_error() {
        let archive = ArchiveDir::new("/nonexistent/wal_archive");
        assert!(matches!(archive.scan().await, Err(PitrError::Io { .. })));
    }

    #[tokio::test]
    async fn snapshot_copies_partials_byte_for_byte() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        assert!(std::fs::write(dir.path().join("000000010000000000000004.partial"), &payload).is_ok());
        assert!(std::fs::write(dir.path().join("000000010000000000000003"), b"done").is_ok());

        let archive = ArchiveDir::new(dir.path());
        let Ok(written) = archive.snapshot_partials().await else {
            panic!("snapshot failed");
        };
        assert_eq!(written, vec!["000000010000000000000004".to_string()]);

        let Ok(copy) = std::fs::read(dir.path().join("000000010000000000000004")) else {
            panic!("copy missing");
        };
        assert_eq!(copy, payload);
        // source is left in place
        assert!(dir.path().join("000000010000000000000004.partial").exists());
    }

    #[tokio::test]
    async fn snapshot_waits_for_scans() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let archive = ArchiveDir::new(dir.path());
        let guard = archive.lock().shared().await;

        let clone = archive.clone();
        let task = tokio::spawn(async move { clone.snapshot_partials().await });
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        drop(guard);
        let Ok(Ok(written)) = task.await else {
            panic!("snapshot failed");
        };
        assert!(written.is_empty());
    }
}
