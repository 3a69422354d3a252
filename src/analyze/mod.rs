//! Tiering analysis over a scan dataset
//!
//! Reads the CSV dataset produced by `tierscan scan`, derives grouping
//! dimensions per record, classifies each record hot/warm/cold by access
//! recency, and prints ranked rollups. The whole stage is read-only: it never
//! touches the scanned filesystem.

pub mod aggregate;
pub mod classify;
pub mod features;
pub mod intern;
pub mod report;

pub use aggregate::{rank_groups, Analysis, GroupTotals, RankedGroup};
pub use classify::{classify, Temperature, Thresholds, TEMPERATURES};
pub use features::{AgeBucket, DerivedRecord, FeatureEngineer, AGE_BUCKET_COUNT};
pub use intern::{CategoryPool, Sym};

use crate::config::AnalyzeConfig;
use crate::error::{DatasetError, Result, TierscanError};
use crate::record::{parse_ts, FileRecord, FileType};
use std::path::Path;
use tracing::{debug, info, warn};

/// Counts describing the dataset read, before aggregation
#[derive(Debug, Default, Clone, Copy)]
pub struct DatasetSummary {
    /// Data rows in the dataset
    pub rows: u64,

    /// Rows that were error records from the scan
    pub error_rows: u64,

    /// Non-error rows without an access time (cannot be classified)
    pub unclassifiable: u64,
}

/// Read a scan dataset back into records
///
/// Only the `path` column is mandatory; datasets written with a field subset
/// load with the omitted fields absent. A non-empty `error` column makes the
/// row an error record regardless of what else is present.
pub fn read_dataset(path: &Path) -> std::result::Result<Vec<FileRecord>, DatasetError> {
    if !path.is_file() {
        return Err(DatasetError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let path_col = column("path").ok_or_else(|| DatasetError::MissingColumn {
        column: "path".to_string(),
    })?;
    let access_col = column("access_time");
    let modify_col = column("modify_time");
    let change_col = column("change_time");
    let size_col = column("size");
    let type_col = column("file_type");
    let error_col = column("error");

    let field = |row: &csv::StringRecord, col: Option<usize>| -> String {
        col.and_then(|i| row.get(i)).unwrap_or("").to_string()
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let row_path = field(&row, Some(path_col));

        let error = field(&row, error_col);
        if !error.is_empty() {
            records.push(FileRecord::failed(row_path, error));
            continue;
        }

        records.push(FileRecord {
            path: row_path,
            access_time: parse_ts(&field(&row, access_col)),
            modify_time: parse_ts(&field(&row, modify_col)),
            change_time: parse_ts(&field(&row, change_col)),
            size: field(&row, size_col).parse().ok(),
            file_type: FileType::parse(&field(&row, type_col)),
            error: None,
        });
    }

    Ok(records)
}

/// Classify and aggregate a set of records
pub fn analyze_records(
    records: &[FileRecord],
    config: &AnalyzeConfig,
) -> Result<(Analysis, CategoryPool, DatasetSummary)> {
    let thresholds =
        Thresholds::new(config.hot_days, config.cold_days).map_err(TierscanError::Config)?;

    let mut engineer = FeatureEngineer::new(
        config.reference_date,
        config.mount_prefix.clone(),
        config.org_slots.clone(),
        config.max_depth,
    );

    let mut analysis = Analysis::default();
    let mut summary = DatasetSummary::default();

    for record in records {
        summary.rows += 1;
        if record.is_error() {
            summary.error_rows += 1;
            continue;
        }
        match engineer.derive(record) {
            Some(derived) => analysis.accumulate(&derived, &thresholds),
            None => {
                debug!(path = %record.path, "row has no access time, skipping");
                summary.unclassifiable += 1;
            }
        }
    }

    if summary.error_rows > 0 {
        warn!(
            error_rows = summary.error_rows,
            "dataset contains scan error records, excluded from rollups"
        );
    }

    Ok((analysis, engineer.pool, summary))
}

/// Run the analyze subcommand end to end
pub fn run(config: &AnalyzeConfig) -> Result<()> {
    info!(
        dataset = %config.dataset_path.display(),
        hot_days = config.hot_days,
        cold_days = config.cold_days,
        "starting analysis"
    );

    let records = read_dataset(&config.dataset_path).map_err(TierscanError::Dataset)?;
    let (analysis, pool, summary) = analyze_records(&records, config)?;
    report::print_report(&analysis, &pool, &summary, config);

    Ok(())
}
