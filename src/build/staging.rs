//! Moving engine output into the requested output directory.
//!
//! The engine process may still hold handles on its output for a short while
//! after it exits. Moves that fail with a "busy" error are retried per entry
//! under a [`RetryPolicy`]; other errors fail that entry immediately. One
//! failed entry never rolls back or blocks the others.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use uuid::Uuid;
use walkdir::WalkDir;

/// Bounded retry for a single file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Retry without sleeping, for tests.
    pub const fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempt ceiling is hit. Returns the number of attempts made.
    pub fn run<T>(&self, label: &str, mut op: impl FnMut() -> io::Result<T>) -> (u32, io::Result<T>) {
        let ceiling = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return (attempt, Ok(value)),
                Err(e) if is_transient(&e) && attempt < ceiling => {
                    tracing::debug!(
                        "{} busy (attempt {}/{}): {}, retrying in {:?}",
                        label,
                        attempt,
                        ceiling,
                        e,
                        self.delay
                    );
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                Err(e) => return (attempt, Err(e)),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(200))
    }
}

/// Whether an error is a lock/busy condition worth retrying.
pub fn is_transient(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::ResourceBusy | io::ErrorKind::WouldBlock => true,
        // Windows reports locked files as access denied or sharing/lock violations
        io::ErrorKind::PermissionDenied => cfg!(windows),
        _ => cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33)),
    }
}

/// Moves one directory entry to a destination path.
pub trait EntryMover: Send + Sync {
    /// Move `from` to `to`, replacing whatever is at `to`.
    fn move_entry(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Filesystem mover: rename, or copy then delete when rename is impossible
/// (e.g. across devices).
///
/// An existing entry at the destination is only replaced once the new one is
/// in place. Files are renamed straight over it. Directories, and entries of a
/// different type, are first set aside under a hidden sibling name and put
/// back if the move fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMover;

impl EntryMover for FsMover {
    fn move_entry(&self, from: &Path, to: &Path) -> io::Result<()> {
        let source_is_dir = fs::symlink_metadata(from)?.is_dir();
        let previous = match fs::symlink_metadata(to) {
            Ok(existing) if existing.is_dir() || source_is_dir => Some(set_aside(to)?),
            Ok(_) => None,
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        match place(from, to) {
            Ok(()) => {
                if let Some(old) = previous {
                    if let Err(e) = remove_entry(&old) {
                        tracing::warn!("Could not remove replaced entry {}: {}", old.display(), e);
                    }
                }
                Ok(())
            }
            Err(e) => {
                if let Some(old) = previous {
                    if let Err(restore) = fs::rename(&old, to) {
                        tracing::warn!(
                            "Could not restore {} from {}: {}",
                            to.display(),
                            old.display(),
                            restore
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

/// Hidden token-named sibling of `path`, in the same directory so renames
/// between the two stay on one device.
fn sibling(path: &Path, tag: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}-{}", name, tag, Uuid::new_v4().simple()))
}

fn set_aside(path: &Path) -> io::Result<PathBuf> {
    let old = sibling(path, "old");
    fs::rename(path, &old)?;
    Ok(old)
}

/// Put `from` at `to`. A file already at `to` is replaced atomically.
fn place(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_transient(&e) || e.kind() == io::ErrorKind::NotFound => Err(e),
        Err(e) => {
            tracing::debug!(
                "rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                e
            );
            let partial = sibling(to, "partial");
            if let Err(e) = copy_entry(from, &partial).and_then(|()| fs::rename(&partial, to)) {
                let _ = remove_entry(&partial);
                return Err(e);
            }
            if let Err(e) = remove_entry(from) {
                tracing::warn!("Copied {} but could not remove it: {}", from.display(), e);
            }
            Ok(())
        }
    }
}

/// Remove a file, symlink or directory tree. Missing paths are fine.
fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn copy_entry(from: &Path, to: &Path) -> io::Result<()> {
    if !fs::symlink_metadata(from)?.is_dir() {
        fs::copy(from, to)?;
        return Ok(());
    }

    for entry in WalkDir::new(from) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// An entry that could not be staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingFailure {
    pub entry: String,
    pub attempts: u32,
    pub error: String,
}

/// Outcome of staging one intermediate directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagingReport {
    pub staged: Vec<String>,
    pub failed: Vec<StagingFailure>,
}

impl StagingReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Move every entry of `intermediate` into `output_dir`.
///
/// Entries are processed in file-name order. Same-named entries already in
/// `output_dir` are replaced. Afterwards the intermediate directory is removed
/// if empty; a failure to remove it is only logged.
///
/// Returns `Err` only when the output directory cannot be created or the
/// intermediate directory cannot be listed. Per-entry failures are collected
/// in the report.
pub fn stage(
    intermediate: &Path,
    output_dir: &Path,
    policy: &RetryPolicy,
    mover: &dyn EntryMover,
) -> io::Result<StagingReport> {
    fs::create_dir_all(output_dir)?;

    let mut report = StagingReport::default();
    let mut entries = match fs::read_dir(intermediate) {
        Ok(iter) => iter.collect::<io::Result<Vec<_>>>()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(
                "Engine produced no output at {}, nothing to stage",
                intermediate.display()
            );
            return Ok(report);
        }
        Err(e) => return Err(e),
    };
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let target = output_dir.join(entry.file_name());

        let (attempts, result) =
            policy.run(&name, || mover.move_entry(&entry.path(), &target));
        match result {
            Ok(()) => {
                if attempts > 1 {
                    tracing::info!("Staged {} after {} attempts", name, attempts);
                }
                report.staged.push(name);
            }
            Err(e) => {
                tracing::warn!("Failed to stage {} after {} attempt(s): {}", name, attempts, e);
                report.failed.push(StagingFailure {
                    entry: name,
                    attempts,
                    error: e.to_string(),
                });
            }
        }
    }

    if let Err(e) = fs::remove_dir(intermediate) {
        tracing::warn!(
            "Could not remove intermediate directory {}: {}",
            intermediate.display(),
            e
        );
    }

    Ok(report)
}
