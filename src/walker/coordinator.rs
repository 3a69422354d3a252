//! Scan coordinator - orchestrates the parallel metadata collection
//!
//! Responsible for:
//! - Creating the sink (setup-tier: failure here aborts before any scanning)
//! - Spawning the dispatcher (producer + worker pool)
//! - Graceful shutdown on signal
//! - Final statistics

use crate::config::ScanConfig;
use crate::error::{Result, TierscanError};
use crate::sink::BatchedCsvSink;
use crate::walker::dispatcher::{DispatchStats, Dispatcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of a completed scan
#[derive(Debug)]
pub struct ScanSummary {
    /// Files discovered by the walker
    pub files_discovered: u64,

    /// Success records written
    pub records_ok: u64,

    /// Error records written (stat failures)
    pub records_err: u64,

    /// Directories that could not be entered
    pub dirs_failed: u64,

    /// Sum of file sizes across success records
    pub total_bytes: u64,

    /// Wall-clock duration
    pub duration: Duration,

    /// Whether the scan completed (vs was interrupted)
    pub completed: bool,
}

/// Progress snapshot for display
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    pub files_discovered: u64,
    pub records_ok: u64,
    pub records_err: u64,
    pub dirs_failed: u64,
    pub elapsed: Duration,
}

impl ScanProgress {
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.records_ok + self.records_err) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Coordinates the parallel metadata scan
pub struct ScanCoordinator {
    config: Arc<ScanConfig>,
    stats: Arc<DispatchStats>,
    shutdown: Arc<AtomicBool>,
}

impl ScanCoordinator {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config: Arc::new(config),
            stats: Arc::new(DispatchStats::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the scan to completion (or interruption)
    pub fn run(&self) -> Result<ScanSummary> {
        let start = Instant::now();

        info!(
            root = %self.config.root.display(),
            workers = self.config.worker_count,
            batch_size = self.config.batch_size,
            "starting metadata scan"
        );

        // Sink creation is the last setup-tier step; after this point all
        // failures are data-tier records.
        let sink = BatchedCsvSink::create(
            &self.config.output_path,
            &self.config.errors_path,
            self.config.fields.clone(),
            self.config.batch_size,
            self.config.batch_size * 2,
            Arc::clone(&self.shutdown),
        )
        .map_err(TierscanError::Sink)?;

        let sink_handle = sink.handle();

        let dispatcher = Dispatcher::spawn(
            Arc::clone(&self.config),
            sink_handle.clone(),
            Arc::clone(&self.stats),
            Arc::clone(&self.shutdown),
        )
        .map_err(TierscanError::Worker)?;

        // Workers exit once the walker finishes and the queue drains (or on
        // shutdown). Joining them before finishing the sink guarantees every
        // record they produced is in the sink channel.
        dispatcher.join().map_err(TierscanError::Worker)?;

        // finish() flushes the final partial batch, so byte totals are only
        // complete after it returns
        sink.finish().map_err(TierscanError::Sink)?;
        let total_bytes = sink_handle.stats().bytes_seen();

        let completed = !self.shutdown.load(Ordering::SeqCst);
        let duration = start.elapsed();

        let summary = ScanSummary {
            files_discovered: self.stats.files_discovered(),
            records_ok: self.stats.records_ok(),
            records_err: self.stats.records_err(),
            dirs_failed: self.stats.dirs_failed(),
            total_bytes,
            duration,
            completed,
        };

        info!(
            files = summary.files_discovered,
            ok = summary.records_ok,
            errors = summary.records_err,
            inaccessible_dirs = summary.dirs_failed,
            duration_secs = duration.as_secs(),
            "scan finished"
        );

        if !completed {
            warn!("scan was interrupted before completion");
        }

        Ok(summary)
    }

    /// Run the scan, invoking `progress_callback` periodically
    pub fn run_with_progress<F>(&self, progress_callback: F) -> Result<ScanSummary>
    where
        F: Fn(ScanProgress) + Send + 'static,
    {
        let start = Instant::now();
        let stats = Arc::clone(&self.stats);
        let shutdown = Arc::clone(&self.shutdown);
        let done = Arc::new(AtomicBool::new(false));
        let done_flag = Arc::clone(&done);

        let progress_handle = thread::spawn(move || {
            while !done_flag.load(Ordering::Relaxed) && !shutdown.load(Ordering::Relaxed) {
                progress_callback(ScanProgress {
                    files_discovered: stats.files_discovered(),
                    records_ok: stats.records_ok(),
                    records_err: stats.records_err(),
                    dirs_failed: stats.dirs_failed(),
                    elapsed: start.elapsed(),
                });
                thread::sleep(Duration::from_millis(100));
            }
        });

        let result = self.run();

        done.store(true, Ordering::SeqCst);
        let _ = progress_handle.join();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_progress_rate() {
        let progress = ScanProgress {
            files_discovered: 1100,
            records_ok: 1000,
            records_err: 100,
            dirs_failed: 0,
            elapsed: Duration::from_secs(10),
        };
        assert!((progress.files_per_second() - 110.0).abs() < 0.1);
    }
}
