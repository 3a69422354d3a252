//! Metadata extractor with bounded retry
//!
//! `extract` never fails: after the retry budget is exhausted the failure is
//! downgraded to an error record so one bad file cannot stop the pipeline.
//!
//! Retryability is a pluggable predicate. The default ([`RetryPolicy::retry_all`])
//! retries every failure, including permission-denied and vanished files that
//! can never succeed; callers can opt into [`RetryPolicy::retry_transient`]
//! instead. Which policy is right is a deployment decision, so it is
//! configuration, not a constant.

use crate::record::{FileRecord, FileType, RawMetadata};
use chrono::{DateTime, NaiveDateTime};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Source of raw stat metadata
///
/// Abstracted so retry behavior can be exercised without a filesystem.
pub trait Stat: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<RawMetadata>;
}

/// Stat via the local filesystem (lstat unless symlink-following is on)
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStat {
    pub follow_symlinks: bool,
}

impl Stat for FsStat {
    fn stat(&self, path: &Path) -> io::Result<RawMetadata> {
        let meta = if self.follow_symlinks {
            std::fs::metadata(path)?
        } else {
            std::fs::symlink_metadata(path)?
        };

        let file_type = if meta.file_type().is_file() {
            FileType::File
        } else if meta.file_type().is_symlink() {
            FileType::Symlink
        } else {
            FileType::Other
        };

        #[cfg(unix)]
        let (atime, mtime, ctime) = {
            use std::os::unix::fs::MetadataExt;
            (
                epoch_to_naive(meta.atime()),
                epoch_to_naive(meta.mtime()),
                epoch_to_naive(meta.ctime()),
            )
        };

        #[cfg(not(unix))]
        let (atime, mtime, ctime) = {
            let modified = system_time_to_naive(meta.modified()?);
            let accessed = meta
                .accessed()
                .map(system_time_to_naive)
                .unwrap_or(modified);
            (accessed, modified, modified)
        };

        Ok(RawMetadata {
            access_time: atime,
            modify_time: mtime,
            change_time: ctime,
            size: meta.len(),
            file_type,
        })
    }
}

#[cfg(unix)]
fn epoch_to_naive(secs: i64) -> NaiveDateTime {
    DateTime::from_timestamp(secs, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .naive_utc()
}

#[cfg(not(unix))]
fn system_time_to_naive(t: std::time::SystemTime) -> NaiveDateTime {
    DateTime::<chrono::Utc>::from(t).naive_utc()
}

/// Predicate deciding whether a stat failure is worth retrying
pub type RetryPredicate = Arc<dyn Fn(&io::Error) -> bool + Send + Sync>;

/// Bounded exponential-backoff retry policy
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts (including the first)
    pub attempts: u32,

    /// Delay before the second attempt
    pub initial_delay: Duration,

    /// Backoff multiplier between attempts
    pub multiplier: u32,

    /// Which failures are worth retrying
    retryable: RetryPredicate,
}

impl RetryPolicy {
    /// Policy with a doubling backoff that retries every failure
    pub fn new(attempts: u32, initial_delay: Duration) -> Self {
        Self {
            attempts,
            initial_delay,
            multiplier: 2,
            retryable: Arc::new(|_| true),
        }
    }

    /// Retry every failure, hopeless or not
    pub fn retry_all(mut self) -> Self {
        self.retryable = Arc::new(|_| true);
        self
    }

    /// Skip retries for failures that cannot succeed
    pub fn retry_transient(mut self) -> Self {
        self.retryable = Arc::new(|e: &io::Error| {
            !matches!(
                e.kind(),
                io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
            )
        });
        self
    }

    /// Install a custom retryability predicate
    pub fn with_predicate(mut self, predicate: RetryPredicate) -> Self {
        self.retryable = predicate;
        self
    }

    fn should_retry(&self, error: &io::Error) -> bool {
        (self.retryable)(error)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field("initial_delay", &self.initial_delay)
            .field("multiplier", &self.multiplier)
            .finish()
    }
}

/// Extracts one FileRecord per path, retrying per policy
pub struct MetadataExtractor<S: Stat = FsStat> {
    stat: S,
    policy: RetryPolicy,
}

impl MetadataExtractor<FsStat> {
    pub fn new(policy: RetryPolicy, follow_symlinks: bool) -> Self {
        Self {
            stat: FsStat { follow_symlinks },
            policy,
        }
    }
}

impl<S: Stat> MetadataExtractor<S> {
    pub fn with_stat(stat: S, policy: RetryPolicy) -> Self {
        Self { stat, policy }
    }

    /// Retrieve metadata for one path
    ///
    /// Always returns a record: a populated one on success, or one carrying
    /// only `path` and `error` once the retry budget is spent or the failure
    /// is judged non-retryable.
    pub fn extract(&self, path: &Path) -> FileRecord {
        let path_str = path.to_string_lossy().into_owned();
        let mut delay = self.policy.initial_delay;
        let mut remaining = self.policy.attempts;

        while remaining > 1 {
            match self.stat.stat(path) {
                Ok(meta) => return FileRecord::ok(path_str, meta),
                Err(e) => {
                    if !self.policy.should_retry(&e) {
                        return FileRecord::failed(path_str, e.to_string());
                    }
                    warn!(
                        path = %path_str,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "stat failed, retrying"
                    );
                    thread::sleep(delay);
                    delay *= self.policy.multiplier;
                    remaining -= 1;
                }
            }
        }

        match self.stat.stat(path) {
            Ok(meta) => FileRecord::ok(path_str, meta),
            Err(e) => FileRecord::failed(path_str, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;
    use tempfile::tempdir;

    /// Stat source that fails a fixed number of times before succeeding
    struct FlakyStat {
        failures: u32,
        calls: AtomicU32,
        kind: io::ErrorKind,
    }

    impl FlakyStat {
        fn new(failures: u32, kind: io::ErrorKind) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                kind,
            }
        }
    }

    impl Stat for FlakyStat {
        fn stat(&self, _path: &Path) -> io::Result<RawMetadata> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(io::Error::new(self.kind, "simulated failure"));
            }
            Ok(RawMetadata {
                access_time: DateTime::from_timestamp(1_700_000_000, 0)
                    .unwrap()
                    .naive_utc(),
                modify_time: DateTime::from_timestamp(1_690_000_000, 0)
                    .unwrap()
                    .naive_utc(),
                change_time: DateTime::from_timestamp(1_690_000_000, 0)
                    .unwrap()
                    .naive_utc(),
                size: 42,
                file_type: FileType::File,
            })
        }
    }

    #[test]
    fn test_retry_succeeds_on_third_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20));
        let stat = FlakyStat::new(2, io::ErrorKind::Interrupted);
        let extractor = MetadataExtractor::with_stat(stat, policy);

        let start = Instant::now();
        let record = extractor.extract(Path::new("/flaky"));
        let elapsed = start.elapsed();

        assert!(!record.is_error());
        assert_eq!(record.size, Some(42));
        // first two backoff delays: 20ms + 40ms
        assert!(
            elapsed >= Duration::from_millis(60),
            "elapsed {:?} shorter than backoff sum",
            elapsed
        );
        assert_eq!(extractor.stat.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_exhausted_retries_downgrade_to_error_record() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let stat = FlakyStat::new(10, io::ErrorKind::Interrupted);
        let extractor = MetadataExtractor::with_stat(stat, policy);

        let record = extractor.extract(Path::new("/gone"));
        assert!(record.is_error());
        assert!(record.size.is_none());
        assert_eq!(extractor.stat.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_transient_policy_skips_hopeless_errors() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1)).retry_transient();
        let stat = FlakyStat::new(10, io::ErrorKind::PermissionDenied);
        let extractor = MetadataExtractor::with_stat(stat, policy);

        let record = extractor.extract(Path::new("/forbidden"));
        assert!(record.is_error());
        // no retries were spent on an error that can never succeed
        assert_eq!(extractor.stat.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fs_stat_real_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, vec![0u8; 1234]).unwrap();

        let extractor =
            MetadataExtractor::new(RetryPolicy::new(1, Duration::from_millis(1)), false);
        let record = extractor.extract(&file);

        assert!(!record.is_error());
        assert_eq!(record.size, Some(1234));
        assert_eq!(record.file_type, FileType::File);
        assert!(record.access_time.is_some());
        assert!(record.modify_time.is_some());
        assert!(record.change_time.is_some());
    }

    #[test]
    fn test_missing_file_becomes_error_record() {
        let extractor =
            MetadataExtractor::new(RetryPolicy::new(2, Duration::from_millis(1)), false);
        let record = extractor.extract(Path::new("/definitely/not/here"));
        assert!(record.is_error());
        assert_eq!(record.path, "/definitely/not/here");
    }
}
