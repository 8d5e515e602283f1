//! Best-effort mirroring of persisted files to a versioned store.
//!
//! Local persistence is always finished before a mirror is asked to sync, and
//! a mirror failure never undoes it. [`sync_with_retry`] retries with
//! exponential backoff and turns the final failure into a warning string.

use crate::error::{EncoderError, Result};
use crate::store::atomic_write;
use chrono::{SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Log file appended to by [`DirectoryMirror`] on every commit.
pub const COMMIT_LOG: &str = "COMMITS.log";

/// A store that accepts a set of files as one commit.
pub trait RemoteMirror: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &str;

    /// Commit `paths` under `message`. Errors are reported as
    /// [`EncoderError::RemoteSync`].
    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<()>;
}

/// Outcome of a sync attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Committed,
    /// No mirror configured.
    Disabled,
    /// All attempts failed; local state is unaffected.
    Failed(String),
}

impl SyncStatus {
    pub fn warning(&self) -> Option<&str> {
        match self {
            SyncStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Bounded retries with delay `base · 2^attempt` after each failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 4,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(attempts: u32) -> Self {
        RetryPolicy {
            attempts,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Commit `paths` to `mirror`, retrying per `policy`.
pub fn sync_with_retry(
    mirror: Option<&dyn RemoteMirror>,
    paths: &[PathBuf],
    message: &str,
    policy: RetryPolicy,
) -> SyncStatus {
    let Some(mirror) = mirror else {
        return SyncStatus::Disabled;
    };
    let stamped = format!(
        "{message} | {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let mut last_err = None;
    for attempt in 0..policy.attempts {
        match mirror.commit(paths, &stamped) {
            Ok(()) => {
                info!(mirror = mirror.name(), attempt, files = paths.len(), "mirror commit");
                return SyncStatus::Committed;
            }
            Err(err) => {
                warn!(mirror = mirror.name(), attempt, "mirror commit failed: {err}");
                last_err = Some(err);
                thread::sleep(policy.delay(attempt));
            }
        }
    }
    let reason = last_err
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempts made".to_string());
    SyncStatus::Failed(format!("commit error: {reason}"))
}

/// Mirrors files into a local directory and keeps a line-per-commit log.
#[derive(Clone, Debug)]
pub struct DirectoryMirror {
    root: PathBuf,
}

impl DirectoryMirror {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        DirectoryMirror { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn copy_one(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .ok_or_else(|| EncoderError::RemoteSync(format!("not a file: {}", path.display())))?;
        let data = fs::read(path)?;
        atomic_write(&self.root.join(name), &data)
    }
}

impl RemoteMirror for DirectoryMirror {
    fn name(&self) -> &str {
        "directory"
    }

    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<()> {
        let wrap = |err: EncoderError| EncoderError::RemoteSync(err.to_string());
        fs::create_dir_all(&self.root).map_err(|e| wrap(e.into()))?;
        for path in paths {
            self.copy_one(path).map_err(wrap)?;
        }
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(COMMIT_LOG))
            .map_err(|e| wrap(e.into()))?;
        writeln!(log, "{message} ({} files)", paths.len()).map_err(|e| wrap(e.into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        fail_first: u32,
        calls: AtomicU32,
    }

    impl RemoteMirror for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn commit(&self, _paths: &[PathBuf], _message: &str) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(EncoderError::RemoteSync(format!("attempt {n}")))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn backoff_doubles() {
        let p = RetryPolicy::default();
        assert_eq!(p.attempts, 4);
        assert_eq!(p.delay(0), Duration::from_secs(1));
        assert_eq!(p.delay(3), Duration::from_secs(8));
    }

    #[test]
    fn recovers_within_budget() {
        let m = Flaky {
            fail_first: 3,
            calls: AtomicU32::new(0),
        };
        let status = sync_with_retry(Some(&m), &[], "msg", RetryPolicy::immediate(4));
        assert_eq!(status, SyncStatus::Committed);
        assert_eq!(m.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn gives_up_with_warning() {
        let m = Flaky {
            fail_first: 10,
            calls: AtomicU32::new(0),
        };
        let status = sync_with_retry(Some(&m), &[], "msg", RetryPolicy::immediate(4));
        assert_eq!(m.calls.load(Ordering::SeqCst), 4);
        assert!(status.warning().is_some_and(|w| w.contains("attempt 3")));
        assert_eq!(
            sync_with_retry(None, &[], "msg", RetryPolicy::immediate(4)),
            SyncStatus::Disabled
        );
    }

    #[test]
    fn directory_mirror_copies_and_logs() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let file = src.path().join("sphere_mir.csv");
        fs::write(&file, b"word\n").unwrap();
        let mirror = DirectoryMirror::new(dst.path());
        mirror.commit(&[file], "save").unwrap();
        assert_eq!(fs::read(dst.path().join("sphere_mir.csv")).unwrap(), b"word\n");
        let log = fs::read_to_string(dst.path().join(COMMIT_LOG)).unwrap();
        assert!(log.starts_with("save"));
    }
}
