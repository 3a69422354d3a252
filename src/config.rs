//! Configuration types for tierscan
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Validated runtime configuration for both subcommands
//!
//! All validation happens here, at startup. A configuration that constructs
//! successfully never causes a setup failure later in the pipeline.

use crate::error::ConfigError;
use crate::record::{AVAILABLE_FIELDS, DEFAULT_FIELDS};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum queue size
const MIN_QUEUE_SIZE: usize = 100;

/// Batch size limits
const MIN_BATCH_SIZE: usize = 1;
const MAX_BATCH_SIZE: usize = 100_000;

/// Parallel filesystem metadata scanner with tiering analysis
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tierscan",
    version,
    about = "Parallel filesystem metadata scanner with hot/warm/cold tiering analysis",
    long_about = "Walks a directory tree (local or network-mounted) with a pool of stat \
                  workers and writes one CSV row per file, tolerating inaccessible \
                  subtrees.\n\n\
                  The resulting dataset can then be analyzed: records are classified \
                  hot/warm/cold by access recency and rolled up by extension, directory \
                  depth, and organizational path segments.",
    after_help = "EXAMPLES:\n    \
        tierscan scan /mnt/share -o metadata.csv -w 64\n    \
        tierscan scan /mnt/share -o metadata.csv --exclude '\\.snapshot'\n    \
        tierscan analyze metadata.csv --hot-days 30 --cold-days 180\n    \
        tierscan analyze metadata.csv --reference-date 2024-11-07 --mount-prefix /mnt/share"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Walk a directory tree and collect per-file metadata into a CSV dataset
    Scan {
        /// Root directory to scan
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Output CSV file for file records
        #[arg(short, long, default_value = "metadata.csv", value_name = "FILE")]
        output: PathBuf,

        /// Output CSV file for inaccessible-directory records
        #[arg(long, value_name = "FILE")]
        errors_output: Option<PathBuf>,

        /// Number of stat worker threads
        #[arg(short = 'w', long, default_value_t = default_workers(), value_name = "NUM")]
        workers: usize,

        /// Records per output batch
        #[arg(short = 'b', long, default_value = "1000", value_name = "NUM")]
        batch_size: usize,

        /// Path queue size (controls memory usage)
        #[arg(long, default_value = "10000", value_name = "NUM")]
        queue_size: usize,

        /// Metadata fields to emit (subset of path, access_time, modify_time,
        /// change_time, size, file_type, error)
        #[arg(long, value_name = "FIELD", num_args = 1.., value_delimiter = ',')]
        fields: Option<Vec<String>>,

        /// Follow symbolic links during traversal (may cycle)
        #[arg(long)]
        follow_symlinks: bool,

        /// Exclude paths matching pattern (can be repeated)
        #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
        exclude_patterns: Vec<String>,

        /// Stat attempts before downgrading to an error record
        #[arg(long, default_value = "3", value_name = "NUM")]
        retry_attempts: u32,

        /// Initial retry delay in milliseconds (doubles per attempt)
        #[arg(long, default_value = "2000", value_name = "MS")]
        retry_delay_ms: u64,

        /// Only retry transient errors (skip permission-denied / not-found)
        #[arg(long)]
        retry_transient: bool,

        /// Overwrite existing output without asking
        #[arg(short = 'f', long)]
        force: bool,

        /// Quiet mode - suppress progress output
        #[arg(short = 'q', long)]
        quiet: bool,

        /// Verbose output (show errors and warnings)
        #[arg(short = 'v', long)]
        verbose: bool,
    },

    /// Classify and aggregate a scan dataset by access recency
    Analyze {
        /// Scan dataset produced by `tierscan scan`
        #[arg(value_name = "CSV")]
        dataset: PathBuf,

        /// Reference date for recency calculations (YYYY-MM-DD, default: today)
        #[arg(long, value_name = "DATE")]
        reference_date: Option<String>,

        /// Days-since-access threshold at or below which data is hot
        #[arg(long, default_value = "30", value_name = "DAYS")]
        hot_days: i64,

        /// Days-since-access threshold at or above which data is cold
        #[arg(long, default_value = "180", value_name = "DAYS")]
        cold_days: i64,

        /// Maximum directory depth to roll up (default: deepest path seen)
        #[arg(long, value_name = "NUM")]
        max_depth: Option<usize>,

        /// Path prefix stripped before organizational-segment parsing
        #[arg(long, default_value = "/mnt/", value_name = "PREFIX")]
        mount_prefix: String,

        /// Names for the positional organizational slots
        #[arg(long, default_value = "season,event,department", value_name = "A,B,C")]
        org_slots: String,

        /// Label substituted for date-like (YYYY-MM) values in the last slot
        #[arg(long, default_value = "chassis", value_name = "LABEL")]
        date_label: String,

        /// Number of groups to keep per rollup before folding into "other"
        #[arg(short = 'n', long, default_value = "20", value_name = "NUM")]
        top: usize,

        /// Verbose output
        #[arg(short = 'v', long)]
        verbose: bool,
    },
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Validated configuration for the scan subcommand
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory to walk
    pub root: PathBuf,

    /// Records output path
    pub output_path: PathBuf,

    /// Inaccessible-directory report path
    pub errors_path: PathBuf,

    /// Number of extractor worker threads
    pub worker_count: usize,

    /// Records per sink batch
    pub batch_size: usize,

    /// Path queue capacity
    pub queue_size: usize,

    /// Field subset to emit
    pub fields: Vec<String>,

    /// Follow symlinks during traversal
    pub follow_symlinks: bool,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Stat attempts before giving up
    pub retry_attempts: u32,

    /// Initial backoff delay
    pub retry_initial_delay: std::time::Duration,

    /// Skip retries for errors that cannot succeed
    pub retry_transient_only: bool,

    /// Overwrite outputs without prompting
    pub force: bool,

    /// Show progress spinner
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl ScanConfig {
    /// Create and validate scan configuration from CLI arguments
    pub fn from_command(cmd: Command) -> Result<Self, ConfigError> {
        let Command::Scan {
            root,
            output,
            errors_output,
            workers,
            batch_size,
            queue_size,
            fields,
            follow_symlinks,
            exclude_patterns,
            retry_attempts,
            retry_delay_ms,
            retry_transient,
            force,
            quiet,
            verbose,
        } = cmd
        else {
            unreachable!("from_command called with non-scan command");
        };

        if !root.is_dir() {
            return Err(ConfigError::InvalidRoot {
                path: root,
                reason: "not an accessible directory".into(),
            });
        }

        if workers == 0 || workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: workers,
                max: MAX_WORKERS,
            });
        }

        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(ConfigError::InvalidBatchSize {
                size: batch_size,
                min: MIN_BATCH_SIZE,
                max: MAX_BATCH_SIZE,
            });
        }

        if queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        let fields = validate_fields(fields)?;

        let exclude_patterns = exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        validate_output_parent(&output)?;
        let errors_path = errors_output.unwrap_or_else(|| default_errors_path(&output));
        validate_output_parent(&errors_path)?;

        Ok(Self {
            root,
            output_path: output,
            errors_path,
            worker_count: workers,
            batch_size,
            queue_size,
            fields,
            follow_symlinks,
            exclude_patterns,
            retry_attempts,
            retry_initial_delay: std::time::Duration::from_millis(retry_delay_ms),
            retry_transient_only: retry_transient,
            force,
            show_progress: !quiet,
            verbose,
        })
    }

}

/// Derive the errors-report path from the records path
/// (`metadata.csv` -> `metadata.errors.csv`)
fn default_errors_path(output: &std::path::Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".into());
    output.with_file_name(format!("{}.errors.csv", stem))
}

fn validate_output_parent(path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ConfigError::InvalidOutputPath {
                path: path.to_path_buf(),
                reason: format!("Parent directory '{}' does not exist", parent.display()),
            });
        }
    }
    Ok(())
}

fn validate_fields(fields: Option<Vec<String>>) -> Result<Vec<String>, ConfigError> {
    let fields = match fields {
        Some(f) if !f.is_empty() => f,
        _ => return Ok(DEFAULT_FIELDS.iter().map(|s| s.to_string()).collect()),
    };

    for name in &fields {
        if !AVAILABLE_FIELDS.contains(&name.as_str()) {
            return Err(ConfigError::UnknownField {
                name: name.clone(),
                available: AVAILABLE_FIELDS.join(", "),
            });
        }
    }

    Ok(fields)
}

/// Organizational slot layout for path parsing
#[derive(Debug, Clone)]
pub struct OrgSlots {
    /// Slot names, in positional order
    pub names: Vec<String>,

    /// Slot index whose date-like values are remapped
    pub date_slot: usize,

    /// Replacement label for date-like values
    pub date_label: String,
}

impl OrgSlots {
    pub fn parse(value: &str, date_label: &str) -> Result<Self, ConfigError> {
        let names: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if names.is_empty() {
            return Err(ConfigError::InvalidOrgSlots {
                value: value.into(),
                reason: "at least one slot name is required".into(),
            });
        }

        Ok(Self {
            date_slot: names.len() - 1,
            names,
            date_label: date_label.to_string(),
        })
    }
}

/// Validated configuration for the analyze subcommand
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    /// Dataset to read
    pub dataset_path: PathBuf,

    /// Reference "now" for recency calculations
    pub reference_date: NaiveDateTime,

    /// Hot threshold (days since access, inclusive)
    pub hot_days: i64,

    /// Cold threshold (days since access, inclusive)
    pub cold_days: i64,

    /// Directory-depth rollup cap
    pub max_depth: Option<usize>,

    /// Prefix stripped before organizational parsing
    pub mount_prefix: String,

    /// Organizational slot layout
    pub org_slots: OrgSlots,

    /// Top-K per rollup
    pub top_k: usize,

    /// Verbose logging
    pub verbose: bool,
}

impl AnalyzeConfig {
    /// Create and validate analyze configuration from CLI arguments
    pub fn from_command(cmd: Command) -> Result<Self, ConfigError> {
        let Command::Analyze {
            dataset,
            reference_date,
            hot_days,
            cold_days,
            max_depth,
            mount_prefix,
            org_slots,
            date_label,
            top,
            verbose,
        } = cmd
        else {
            unreachable!("from_command called with non-analyze command");
        };

        if hot_days >= cold_days {
            return Err(ConfigError::InvalidThresholds {
                hot_days,
                cold_days,
            });
        }

        let reference_date = match reference_date {
            Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidReferenceDate {
                    value: value.clone(),
                })?
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always valid"),
            None => Utc::now().naive_utc(),
        };

        let org_slots = OrgSlots::parse(&org_slots, &date_label)?;

        Ok(Self {
            dataset_path: dataset,
            reference_date,
            hot_days,
            cold_days,
            max_depth,
            mount_prefix,
            org_slots,
            top_k: top,
            verbose,
        })
    }
}
