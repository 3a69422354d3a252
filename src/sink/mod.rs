//! Persistence sinks for scan output

pub mod csv_sink;

pub use csv_sink::{BatchedCsvSink, SinkHandle, SinkStats};
