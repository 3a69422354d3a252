//! Scan record data model
//!
//! A `FileRecord` is created exactly once by the extractor and is immutable
//! afterwards: the sink writes it, the analysis stage reads it. The invariant
//! that an error record carries no metadata (and vice versa) is enforced by
//! only constructing records through [`FileRecord::ok`] and
//! [`FileRecord::failed`].

use chrono::NaiveDateTime;
use std::io;

/// Timestamp format used in the output dataset
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// All metadata fields the scanner can emit, in output order
pub const AVAILABLE_FIELDS: &[&str] = &[
    "path",
    "access_time",
    "modify_time",
    "change_time",
    "size",
    "file_type",
    "error",
];

/// Default field subset (matches the dataset consumed by `analyze`)
pub const DEFAULT_FIELDS: &[&str] = &[
    "path",
    "access_time",
    "modify_time",
    "change_time",
    "size",
    "file_type",
];

/// Type of a scanned filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    File,
    Symlink,
    Other,
    /// Sentinel used on error records
    #[default]
    Unknown,
}

impl FileType {
    /// Parse a dataset field back into a file type
    pub fn parse(value: &str) -> Self {
        match value {
            "file" => FileType::File,
            "symlink" => FileType::Symlink,
            "other" => FileType::Other,
            _ => FileType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::File => "file",
            FileType::Symlink => "symlink",
            FileType::Other => "other",
            FileType::Unknown => "",
        }
    }
}

/// Raw metadata for a successfully stat'ed path
#[derive(Debug, Clone, Copy)]
pub struct RawMetadata {
    pub access_time: NaiveDateTime,
    pub modify_time: NaiveDateTime,
    pub change_time: NaiveDateTime,
    pub size: u64,
    pub file_type: FileType,
}

/// One row of the scan dataset
///
/// Either all metadata fields are populated and `error` is `None`, or the
/// record is an error record: `path` and `error` set, everything else empty.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub access_time: Option<NaiveDateTime>,
    pub modify_time: Option<NaiveDateTime>,
    pub change_time: Option<NaiveDateTime>,
    pub size: Option<u64>,
    pub file_type: FileType,
    pub error: Option<String>,
}

impl FileRecord {
    /// Create a success record from stat metadata
    pub fn ok(path: String, meta: RawMetadata) -> Self {
        Self {
            path,
            access_time: Some(meta.access_time),
            modify_time: Some(meta.modify_time),
            change_time: Some(meta.change_time),
            size: Some(meta.size),
            file_type: meta.file_type,
            error: None,
        }
    }

    /// Create an error record (metadata fields stay empty)
    pub fn failed(path: String, error: String) -> Self {
        Self {
            path,
            access_time: None,
            modify_time: None,
            change_time: None,
            size: None,
            file_type: FileType::Unknown,
            error: Some(error),
        }
    }

    /// Whether this record represents an extraction failure
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Value of a named field, formatted for CSV output
    ///
    /// Unknown field names yield an empty string; the field subset is
    /// validated at configuration time, not here.
    pub fn field_value(&self, field: &str) -> String {
        match field {
            "path" => self.path.clone(),
            "access_time" => format_ts(self.access_time),
            "modify_time" => format_ts(self.modify_time),
            "change_time" => format_ts(self.change_time),
            "size" => self.size.map(|s| s.to_string()).unwrap_or_default(),
            "file_type" => self.file_type.as_str().to_string(),
            "error" => self.error.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

fn format_ts(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parse a dataset timestamp; empty strings are absent values
pub fn parse_ts(value: &str) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

/// Classification of a directory-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    PermissionDenied,
    Other,
}

impl ScanErrorKind {
    pub fn from_io_kind(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::PermissionDenied => ScanErrorKind::PermissionDenied,
            _ => ScanErrorKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanErrorKind::PermissionDenied => "permission_denied",
            ScanErrorKind::Other => "other",
        }
    }
}

/// A directory the walker could not enter
#[derive(Debug, Clone)]
pub struct ScanError {
    pub path: String,
    pub message: String,
    pub kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(path: String, kind: ScanErrorKind, message: String) -> Self {
        Self {
            path,
            message,
            kind,
        }
    }
}
