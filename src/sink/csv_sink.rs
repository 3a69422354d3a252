//! Batched CSV writer for scan records
//!
//! Runs in a dedicated thread and receives records via a bounded channel,
//! decoupling extraction rate from output latency. Records are written in
//! `batch_size` batches, each flushed as a unit; any partial batch is flushed
//! at shutdown. Inaccessible-directory reports go to a second file.
//!
//! A fatal write error raises the shared shutdown flag so the rest of the
//! pipeline winds down, and the error surfaces from [`BatchedCsvSink::finish`].

use crate::error::{SinkError, SinkResult};
use crate::record::{FileRecord, ScanError};
use crossbeam_channel::{bounded, Receiver, Sender};
use csv::Writer;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Message types sent to the writer thread
#[derive(Debug)]
pub enum SinkMessage {
    /// Persist a completed file record
    Record(FileRecord),

    /// Persist an inaccessible-directory report
    DirError(ScanError),

    /// Flush pending batches
    Flush,

    /// Flush and stop
    Shutdown,
}

/// Statistics about sink operations
#[derive(Debug, Default)]
pub struct SinkStats {
    /// Success records written
    pub records_written: AtomicU64,

    /// Error records written (stat failures)
    pub error_records_written: AtomicU64,

    /// Inaccessible-directory reports written
    pub dir_errors_written: AtomicU64,

    /// Batches flushed
    pub batches_committed: AtomicU64,

    /// Sum of file sizes seen in success records
    pub bytes_seen: AtomicU64,
}

impl SinkStats {
    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }

    pub fn error_records_written(&self) -> u64 {
        self.error_records_written.load(Ordering::Relaxed)
    }

    pub fn dir_errors_written(&self) -> u64 {
        self.dir_errors_written.load(Ordering::Relaxed)
    }

    pub fn bytes_seen(&self) -> u64 {
        self.bytes_seen.load(Ordering::Relaxed)
    }
}

/// Handle for sending records to the sink (clone per producer)
#[derive(Clone)]
pub struct SinkHandle {
    sender: Sender<SinkMessage>,
    stats: Arc<SinkStats>,
}

impl SinkHandle {
    /// Send a record to be written
    pub fn send_record(&self, record: FileRecord) -> SinkResult<()> {
        self.sender
            .send(SinkMessage::Record(record))
            .map_err(|_| SinkError::ChannelClosed)
    }

    /// Send an inaccessible-directory report
    pub fn send_dir_error(&self, error: ScanError) -> SinkResult<()> {
        self.sender
            .send(SinkMessage::DirError(error))
            .map_err(|_| SinkError::ChannelClosed)
    }

    /// Request a flush of pending batches
    pub fn flush(&self) -> SinkResult<()> {
        self.sender
            .send(SinkMessage::Flush)
            .map_err(|_| SinkError::ChannelClosed)
    }

    /// Get sink statistics
    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }
}

/// Batched CSV sink that runs in its own thread
pub struct BatchedCsvSink {
    handle: Option<JoinHandle<SinkResult<()>>>,
    sink_handle: SinkHandle,
    sender: Sender<SinkMessage>,
}

impl BatchedCsvSink {
    /// Create the output files, write headers, and spawn the writer thread
    ///
    /// Failing here is a setup-tier error: nothing has been scanned yet and
    /// no partial output is left behind beyond the empty header files.
    pub fn create(
        records_path: &Path,
        errors_path: &Path,
        fields: Vec<String>,
        batch_size: usize,
        channel_size: usize,
        shutdown: Arc<AtomicBool>,
    ) -> SinkResult<Self> {
        let mut records_writer = open_writer(records_path)?;
        records_writer.write_record(&fields)?;
        records_writer.flush()?;

        let mut errors_writer = open_writer(errors_path)?;
        errors_writer.write_record(["path", "error"])?;
        errors_writer.flush()?;

        let (sender, receiver) = bounded(channel_size);
        let stats = Arc::new(SinkStats::default());

        let sink_handle = SinkHandle {
            sender: sender.clone(),
            stats: Arc::clone(&stats),
        };

        let handle = thread::Builder::new()
            .name("csv-writer".into())
            .spawn(move || {
                writer_thread(
                    records_writer,
                    errors_writer,
                    receiver,
                    fields,
                    batch_size,
                    stats,
                    shutdown,
                )
            })
            .map_err(|e| SinkError::CreateFailed {
                path: records_path.to_path_buf(),
                reason: format!("Failed to spawn writer thread: {}", e),
            })?;

        Ok(Self {
            handle: Some(handle),
            sink_handle,
            sender,
        })
    }

    /// Get a handle for sending records to the sink
    pub fn handle(&self) -> SinkHandle {
        self.sink_handle.clone()
    }

    /// Flush remaining batches and wait for the writer to stop
    pub fn finish(mut self) -> SinkResult<()> {
        let _ = self.sender.send(SinkMessage::Shutdown);

        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(SinkError::WriterPanicked),
            },
            None => Ok(()),
        }
    }
}

fn open_writer(path: &Path) -> SinkResult<Writer<File>> {
    let file = File::create(path).map_err(|e| SinkError::CreateFailed {
        path: PathBuf::from(path),
        reason: e.to_string(),
    })?;
    Ok(Writer::from_writer(file))
}

/// Internal writer thread function
///
/// Generic over the destination so write failures can be injected in tests.
fn writer_thread<W: io::Write>(
    mut records_writer: Writer<W>,
    mut errors_writer: Writer<W>,
    receiver: Receiver<SinkMessage>,
    fields: Vec<String>,
    batch_size: usize,
    stats: Arc<SinkStats>,
    shutdown: Arc<AtomicBool>,
) -> SinkResult<()> {
    let mut buffer: Vec<FileRecord> = Vec::with_capacity(batch_size);

    let result = (|| -> SinkResult<()> {
        while let Ok(msg) = receiver.recv() {
            match msg {
                SinkMessage::Record(record) => {
                    buffer.push(record);
                    if buffer.len() >= batch_size {
                        flush_batch(&mut records_writer, &mut buffer, &fields, &stats)?;
                    }
                }
                SinkMessage::DirError(err) => {
                    errors_writer.write_record([err.path.as_str(), err.message.as_str()])?;
                    errors_writer.flush()?;
                    stats.dir_errors_written.fetch_add(1, Ordering::Relaxed);
                }
                SinkMessage::Flush => {
                    flush_batch(&mut records_writer, &mut buffer, &fields, &stats)?;
                }
                SinkMessage::Shutdown => break,
            }
        }

        // Final flush: a partial batch is still flushed at normal completion
        // and on interruption.
        flush_batch(&mut records_writer, &mut buffer, &fields, &stats)?;
        errors_writer.flush()?;
        Ok(())
    })();

    if let Err(ref e) = result {
        // Fatal write error: stop the pipeline rather than silently dropping
        // records. The failed batch is not flushed.
        error!("sink write failed, shutting down pipeline: {}", e);
        shutdown.store(true, Ordering::SeqCst);
    }

    debug!(
        records = stats.records_written(),
        errors = stats.error_records_written(),
        "csv writer finished"
    );

    result
}

/// Write and flush one batch as a unit
fn flush_batch<W: io::Write>(
    writer: &mut Writer<W>,
    buffer: &mut Vec<FileRecord>,
    fields: &[String],
    stats: &SinkStats,
) -> SinkResult<()> {
    if buffer.is_empty() {
        return Ok(());
    }

    let mut ok = 0u64;
    let mut errs = 0u64;
    let mut bytes = 0u64;
    for record in buffer.drain(..) {
        let row: Vec<String> = fields.iter().map(|f| record.field_value(f)).collect();
        writer.write_record(&row)?;

        if record.is_error() {
            errs += 1;
        } else {
            ok += 1;
            bytes += record.size.unwrap_or(0);
        }
    }
    writer.flush()?;

    // counters only reflect rows that reached the file
    stats.records_written.fetch_add(ok, Ordering::Relaxed);
    stats.error_records_written.fetch_add(errs, Ordering::Relaxed);
    stats.bytes_seen.fetch_add(bytes, Ordering::Relaxed);
    stats.batches_committed.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FileType, RawMetadata, ScanErrorKind, DEFAULT_FIELDS};
    use chrono::DateTime;
    use tempfile::tempdir;

    fn default_fields() -> Vec<String> {
        DEFAULT_FIELDS.iter().map(|s| s.to_string()).collect()
    }

    fn sample_record(path: &str, size: u64) -> FileRecord {
        FileRecord::ok(
            path.into(),
            RawMetadata {
                access_time: DateTime::from_timestamp(1_700_000_000, 0)
                    .unwrap()
                    .naive_utc(),
                modify_time: DateTime::from_timestamp(1_690_000_000, 0)
                    .unwrap()
                    .naive_utc(),
                change_time: DateTime::from_timestamp(1_690_000_000, 0)
                    .unwrap()
                    .naive_utc(),
                size,
                file_type: FileType::File,
            },
        )
    }

    #[test]
    fn test_sink_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let records = dir.path().join("out.csv");
        let errors = dir.path().join("out.errors.csv");

        let sink = BatchedCsvSink::create(
            &records,
            &errors,
            default_fields(),
            3,
            100,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        let handle = sink.handle();

        for i in 0..7 {
            handle
                .send_record(sample_record(&format!("/data/f{}.txt", i), 100 * i))
                .unwrap();
        }
        sink.finish().unwrap();

        let content = std::fs::read_to_string(&records).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "path,access_time,modify_time,change_time,size,file_type"
        );
        assert_eq!(lines.count(), 7);
    }

    #[test]
    fn test_sink_partial_batch_flushed_on_finish() {
        let dir = tempdir().unwrap();
        let records = dir.path().join("out.csv");
        let errors = dir.path().join("out.errors.csv");

        let sink = BatchedCsvSink::create(
            &records,
            &errors,
            default_fields(),
            1000,
            100,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        let handle = sink.handle();

        handle.send_record(sample_record("/a", 1)).unwrap();
        handle.send_record(sample_record("/b", 2)).unwrap();
        sink.finish().unwrap();

        assert_eq!(handle.stats().records_written(), 2);
        assert_eq!(handle.stats().bytes_seen(), 3);

        let content = std::fs::read_to_string(&records).unwrap();
        assert_eq!(content.lines().count(), 3); // header + 2 rows
    }

    #[test]
    fn test_sink_error_report() {
        let dir = tempdir().unwrap();
        let records = dir.path().join("out.csv");
        let errors = dir.path().join("out.errors.csv");

        let sink = BatchedCsvSink::create(
            &records,
            &errors,
            default_fields(),
            10,
            100,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        let handle = sink.handle();

        handle
            .send_dir_error(ScanError::new(
                "/data/locked".into(),
                ScanErrorKind::PermissionDenied,
                "Permission denied (os error 13)".into(),
            ))
            .unwrap();
        sink.finish().unwrap();

        let content = std::fs::read_to_string(&errors).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "path,error");
        assert!(lines.next().unwrap().starts_with("/data/locked,"));
        assert_eq!(handle.stats().dir_errors_written(), 1);
    }

    /// Write destination that rejects every write and flush
    struct FailingWriter;

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::WriteZero, "device full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::WriteZero, "device full"))
        }
    }

    #[test]
    fn test_mid_run_write_failure_stops_pipeline() {
        let (sender, receiver) = bounded(16);
        let stats = Arc::new(SinkStats::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        // a full batch forces a flush against the failing destination
        sender
            .send(SinkMessage::Record(sample_record("/a", 1)))
            .unwrap();
        sender
            .send(SinkMessage::Record(sample_record("/b", 2)))
            .unwrap();
        drop(sender);

        let result = writer_thread(
            Writer::from_writer(FailingWriter),
            Writer::from_writer(FailingWriter),
            receiver,
            default_fields(),
            2,
            Arc::clone(&stats),
            Arc::clone(&shutdown),
        );

        // the failure surfaces to the caller (and from finish() via join)
        assert!(result.is_err());
        // the rest of the pipeline is told to wind down
        assert!(shutdown.load(Ordering::SeqCst));
        // the failed batch is not counted as written
        assert_eq!(stats.records_written(), 0);
        assert_eq!(stats.bytes_seen(), 0);
    }

    #[test]
    fn test_sink_create_fails_on_bad_path() {
        let result = BatchedCsvSink::create(
            Path::new("/nonexistent-dir/out.csv"),
            Path::new("/nonexistent-dir/out.errors.csv"),
            default_fields(),
            10,
            100,
            Arc::new(AtomicBool::new(false)),
        );
        assert!(matches!(result, Err(SinkError::CreateFailed { .. })));
    }

    #[test]
    fn test_sink_field_subset() {
        let dir = tempdir().unwrap();
        let records = dir.path().join("out.csv");
        let errors = dir.path().join("out.errors.csv");

        let sink = BatchedCsvSink::create(
            &records,
            &errors,
            vec!["path".into(), "size".into()],
            10,
            100,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        let handle = sink.handle();
        handle.send_record(sample_record("/x.bin", 512)).unwrap();
        sink.finish().unwrap();

        let content = std::fs::read_to_string(&records).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "path,size");
        assert_eq!(lines.next().unwrap(), "/x.bin,512");
    }
}
