//! tierscan - Filesystem Metadata Scanner with Tiering Analysis
//!
//! Walks a directory tree (local or network-mounted) with a pool of stat
//! workers, writes one CSV row per file, and classifies the resulting dataset
//! into hot/warm/cold tiers by access recency. Designed for storage-tiering
//! decisions over shares with millions of files, where some subtrees are
//! always unreadable and individual stat calls fail transiently.
//!
//! # Features
//!
//! - **Fault-Tolerant Collection**: Stat failures are retried with backoff
//!   and then downgraded to error records; unreadable directories are
//!   skipped and reported. A scan never aborts mid-tree.
//!
//! - **Parallel Extraction**: One walker thread feeds a bounded path queue
//!   consumed by N stat workers, sized for high-latency network mounts.
//!
//! - **Memory Efficient**: Both the path queue and the sink channel are
//!   bounded, so memory stays flat regardless of tree size.
//!
//! - **Tiering Analysis**: The collected dataset is classified hot/warm/cold
//!   and rolled up by extension, directory, depth, and organizational path
//!   segments.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    bounded     ┌───────────────────────┐
//! │  Walker  │ ─── paths ───▶ │   Stat Workers (xN)   │
//! │ (1 thread)│               │  retry w/ backoff     │
//! └────┬─────┘                └──────────┬────────────┘
//!      │ dir errors                      │ records
//!      ▼                                 ▼
//! ┌─────────────────────────────────────────────────┐
//! │            Batched CSV Sink (1 thread)          │
//! │   records → metadata.csv (batched)              │
//! │   dir errors → metadata.errors.csv (immediate)  │
//! └─────────────────────────────────────────────────┘
//!
//! metadata.csv ──▶ analyze: derive features ▶ classify ▶ rollups
//! ```
//!
//! # Example
//!
//! ```bash
//! # Collect metadata
//! tierscan scan /mnt/share -o metadata.csv -w 64
//!
//! # Classify and roll up
//! tierscan analyze metadata.csv --hot-days 30 --cold-days 180
//! ```

pub mod analyze;
pub mod config;
pub mod error;
pub mod progress;
pub mod record;
pub mod sink;
pub mod walker;

pub use analyze::{Analysis, Temperature, Thresholds};
pub use config::{AnalyzeConfig, CliArgs, Command, ScanConfig};
pub use error::{Result, TierscanError};
pub use record::{FileRecord, FileType};
pub use walker::{ScanCoordinator, ScanSummary};
