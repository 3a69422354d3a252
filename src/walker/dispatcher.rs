//! Parallel dispatcher - worker pool over the walker's path stream
//!
//! One producer thread walks the tree and feeds a bounded path queue; N
//! worker threads pull paths, run the extractor, and push completed records
//! to the sink channel. Both channels are bounded, so a fast walker cannot
//! outrun extraction and fast extraction cannot outrun the sink.
//!
//! Records surface in completion order, not discovery order. Consumers must
//! treat the output as a multiset.

use crate::config::ScanConfig;
use crate::error::WorkerError;
use crate::record::ScanError;
use crate::sink::SinkHandle;
use crate::walker::extract::{MetadataExtractor, RetryPolicy};
use crate::walker::walk::TreeWalker;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

/// Shared counters for the scan pipeline
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Paths discovered by the walker
    pub files_discovered: AtomicU64,

    /// Successful extractions
    pub records_ok: AtomicU64,

    /// Extractions downgraded to error records
    pub records_err: AtomicU64,

    /// Directories the walker could not enter
    pub dirs_failed: AtomicU64,
}

impl DispatchStats {
    pub fn files_discovered(&self) -> u64 {
        self.files_discovered.load(Ordering::Relaxed)
    }

    pub fn records_ok(&self) -> u64 {
        self.records_ok.load(Ordering::Relaxed)
    }

    pub fn records_err(&self) -> u64 {
        self.records_err.load(Ordering::Relaxed)
    }

    pub fn dirs_failed(&self) -> u64 {
        self.dirs_failed.load(Ordering::Relaxed)
    }
}

/// Spawned pipeline threads, joined by the coordinator
pub struct Dispatcher {
    producer: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn the producer and the worker pool
    pub fn spawn(
        config: Arc<ScanConfig>,
        sink: SinkHandle,
        stats: Arc<DispatchStats>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let (path_tx, path_rx) = bounded::<PathBuf>(config.queue_size);

        let producer = {
            let config = Arc::clone(&config);
            let sink = sink.clone();
            let stats = Arc::clone(&stats);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("walker".into())
                .spawn(move || producer_loop(config, path_tx, sink, stats, shutdown))
                .map_err(|e| WorkerError::InitFailed {
                    id: 0,
                    reason: e.to_string(),
                })?
        };

        let mut workers = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count {
            let policy = retry_policy(&config);
            let extractor = MetadataExtractor::new(policy, config.follow_symlinks);
            let path_rx = path_rx.clone();
            let sink = sink.clone();
            let stats = Arc::clone(&stats);
            let shutdown = Arc::clone(&shutdown);

            let handle = thread::Builder::new()
                .name(format!("extract-{}", id))
                .spawn(move || worker_loop(id, extractor, path_rx, sink, stats, shutdown))
                .map_err(|e| WorkerError::InitFailed {
                    id,
                    reason: e.to_string(),
                })?;
            workers.push(handle);
        }

        Ok(Self { producer, workers })
    }

    /// Wait for the producer and all workers to stop
    pub fn join(self) -> Result<(), WorkerError> {
        self.producer
            .join()
            .map_err(|_| WorkerError::Panicked { id: 0 })?;
        for (id, worker) in self.workers.into_iter().enumerate() {
            worker.join().map_err(|_| WorkerError::Panicked { id })?;
        }
        Ok(())
    }
}

fn retry_policy(config: &ScanConfig) -> RetryPolicy {
    let policy = RetryPolicy::new(config.retry_attempts, config.retry_initial_delay);
    if config.retry_transient_only {
        policy.retry_transient()
    } else {
        policy.retry_all()
    }
}

/// Producer: sequential walk feeding the bounded path queue
fn producer_loop(
    config: Arc<ScanConfig>,
    path_tx: Sender<PathBuf>,
    sink: SinkHandle,
    stats: Arc<DispatchStats>,
    shutdown: Arc<AtomicBool>,
) {
    let walker = TreeWalker::new(&config.root)
        .follow_symlinks(config.follow_symlinks)
        .exclude(config.exclude_patterns.clone());

    let error_sink = sink.clone();
    let error_stats = Arc::clone(&stats);
    let on_error = move |err: ScanError| {
        error_stats.dirs_failed.fetch_add(1, Ordering::Relaxed);
        // A closed sink means the pipeline is already shutting down.
        let _ = error_sink.send_dir_error(err);
    };

    for path in walker.files(on_error) {
        if shutdown.load(Ordering::Relaxed) {
            debug!("walker stopping: shutdown requested");
            break;
        }
        stats.files_discovered.fetch_add(1, Ordering::Relaxed);

        // Bounded send with periodic shutdown checks so an interrupt is not
        // stuck behind a full queue.
        let mut pending = path;
        loop {
            match path_tx.send_timeout(pending, Duration::from_millis(100)) {
                Ok(()) => break,
                Err(crossbeam_channel::SendTimeoutError::Timeout(p)) => {
                    if shutdown.load(Ordering::Relaxed) {
                        debug!("walker dropping queued path: shutdown requested");
                        return;
                    }
                    pending = p;
                }
                Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                    debug!("walker stopping: path queue closed");
                    return;
                }
            }
        }
    }

    debug!("walker finished");
    // path_tx drops here; workers drain the queue and exit
}

/// Worker: pull a path, extract, push the record to the sink
fn worker_loop(
    id: usize,
    extractor: MetadataExtractor,
    path_rx: Receiver<PathBuf>,
    sink: SinkHandle,
    stats: Arc<DispatchStats>,
    shutdown: Arc<AtomicBool>,
) {
    debug!("worker {} started", id);

    loop {
        match path_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(path) => {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                trace!(worker = id, path = %path.display(), "extracting");
                let record = extractor.extract(&path);

                if record.is_error() {
                    stats.records_err.fetch_add(1, Ordering::Relaxed);
                } else {
                    stats.records_ok.fetch_add(1, Ordering::Relaxed);
                }

                if sink.send_record(record).is_err() {
                    debug!("worker {} stopping: sink closed", id);
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("worker {} finished", id);
}
