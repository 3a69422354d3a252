//! Feature engineering over raw scan records
//!
//! Turns each successful scan row into the derived dimensions the rollups
//! group by: days since access, age bucket, extension, directory prefixes,
//! and organizational path segments. Error records and records without an
//! access time carry no usable recency signal and are skipped (the caller
//! counts them separately).

use crate::analyze::intern::{CategoryPool, Sym};
use crate::config::OrgSlots;
use crate::record::FileRecord;
use chrono::NaiveDateTime;
use regex::Regex;
use tracing::debug;

/// Days per age-bucket month
const DAYS_PER_MONTH: i64 = 30;

/// Number of single-month buckets before the overflow bucket
const MONTH_BUCKETS: u8 = 24;

/// Total distinct age buckets (24 months + overflow + future)
pub const AGE_BUCKET_COUNT: usize = MONTH_BUCKETS as usize + 2;

/// Access-age bucket, 30-day months
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBucket {
    /// 0..=23 whole months old
    Month(u8),
    TwoYearsPlus,
    /// Timestamp ahead of the reference date
    Future,
}

impl AgeBucket {
    pub fn from_days(days: i64) -> Self {
        if days < 0 {
            return AgeBucket::Future;
        }
        let months = days / DAYS_PER_MONTH;
        if months >= MONTH_BUCKETS as i64 {
            AgeBucket::TwoYearsPlus
        } else {
            AgeBucket::Month(months as u8)
        }
    }

    /// Position in the zero-filled age distribution
    pub fn index(&self) -> usize {
        match self {
            AgeBucket::Month(m) => *m as usize,
            AgeBucket::TwoYearsPlus => MONTH_BUCKETS as usize,
            AgeBucket::Future => MONTH_BUCKETS as usize + 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            m if m < MONTH_BUCKETS as usize => Some(AgeBucket::Month(m as u8)),
            i if i == MONTH_BUCKETS as usize => Some(AgeBucket::TwoYearsPlus),
            i if i == MONTH_BUCKETS as usize + 1 => Some(AgeBucket::Future),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            AgeBucket::Month(m) => format!("{} months", m),
            AgeBucket::TwoYearsPlus => "24+ months".to_string(),
            AgeBucket::Future => "future".to_string(),
        }
    }
}

/// One record with all derived analysis dimensions attached
#[derive(Debug, Clone)]
pub struct DerivedRecord {
    pub size: u64,
    pub days_since_access: i64,
    pub age_bucket: AgeBucket,
    pub extension: Sym,
    pub parent_dir: Sym,
    /// Directory prefixes, one per depth level starting at 1
    pub dir_levels: Vec<Sym>,
    /// Organizational slot values, one per configured slot
    pub org: Vec<Sym>,
    /// All slot values joined, for grouping by the full tuple
    pub org_tuple: Sym,
}

/// Derives analysis dimensions from raw records
pub struct FeatureEngineer {
    pub pool: CategoryPool,
    reference_date: NaiveDateTime,
    mount_prefix: String,
    org_slots: OrgSlots,
    max_depth: Option<usize>,
    date_re: Regex,
    unknown: Sym,
}

impl FeatureEngineer {
    pub fn new(
        reference_date: NaiveDateTime,
        mount_prefix: String,
        org_slots: OrgSlots,
        max_depth: Option<usize>,
    ) -> Self {
        let mut pool = CategoryPool::new();
        let unknown = pool.intern("Unknown");
        Self {
            pool,
            reference_date,
            mount_prefix,
            org_slots,
            max_depth,
            // YYYY-MM values in the date slot get remapped to a fixed label
            date_re: Regex::new(r"^\d{4}-\d{2}$").expect("static pattern is valid"),
            unknown,
        }
    }

    /// Derive dimensions for one record
    ///
    /// Returns `None` for error records and records missing an access time;
    /// they cannot be classified by recency.
    pub fn derive(&mut self, record: &FileRecord) -> Option<DerivedRecord> {
        if record.is_error() {
            return None;
        }
        let access_time = record.access_time?;
        let path = record.path.replace('\\', "/");

        let days_since_access = (self.reference_date - access_time).num_days();

        let (dir_part, file_name) = split_path(&path);

        let extension = self.pool.intern(&extension_of(file_name));
        let parent_dir = self.pool.intern(if dir_part.is_empty() { "/" } else { dir_part });

        let segments: Vec<&str> = dir_part.split('/').filter(|s| !s.is_empty()).collect();

        let depth = match self.max_depth {
            Some(cap) => segments.len().min(cap),
            None => segments.len(),
        };
        let mut dir_levels = Vec::with_capacity(depth);
        let mut prefix = String::new();
        for segment in segments.iter().take(depth) {
            prefix.push('/');
            prefix.push_str(segment);
            dir_levels.push(self.pool.intern(&prefix));
        }

        let org = self.derive_org(&path);
        let org_tuple = {
            let joined = org
                .iter()
                .map(|&s| self.pool.resolve(s).to_string())
                .collect::<Vec<_>>()
                .join("/");
            self.pool.intern(&joined)
        };

        Some(DerivedRecord {
            size: record.size.unwrap_or(0),
            days_since_access,
            age_bucket: AgeBucket::from_days(days_since_access),
            extension,
            parent_dir,
            dir_levels,
            org,
            org_tuple,
        })
    }

    /// Fill the positional org slots from the path under the mount prefix
    ///
    /// Paths outside the mount prefix carry no organizational meaning; every
    /// slot stays "Unknown" rather than being filled from unrelated root
    /// segments.
    fn derive_org(&mut self, path: &str) -> Vec<Sym> {
        let slot_count = self.org_slots.names.len();

        let Some(relative) = path.strip_prefix(&self.mount_prefix) else {
            debug!(path = %path, "path outside mount prefix, org slots unknown");
            return vec![self.unknown; slot_count];
        };

        // the last path component is the file name, not an org segment
        let mut dirs: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        dirs.pop();

        let mut org = Vec::with_capacity(slot_count);
        for slot in 0..slot_count {
            let value = match dirs.get(slot) {
                Some(v) if slot == self.org_slots.date_slot && self.date_re.is_match(v) => {
                    self.pool.intern(&self.org_slots.date_label)
                }
                Some(v) => self.pool.intern(v),
                None => self.unknown,
            };
            org.push(value);
        }
        org
    }
}

/// Split a normalized path into (directory part, file name)
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Lowercased extension after the final dot, or "unknown"
fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() => file_name[idx + 1..].to_lowercase(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FileType, RawMetadata};
    use chrono::NaiveDate;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn engineer() -> FeatureEngineer {
        FeatureEngineer::new(
            reference(),
            "/mnt/".into(),
            OrgSlots::parse("season,event,department", "chassis").unwrap(),
            None,
        )
    }

    fn record(path: &str, accessed_days_ago: i64, modified_days_ago: i64) -> FileRecord {
        let ts = |days: i64| reference() - chrono::Duration::days(days);
        FileRecord::ok(
            path.into(),
            RawMetadata {
                access_time: ts(accessed_days_ago),
                modify_time: ts(modified_days_ago),
                change_time: ts(modified_days_ago),
                size: 1024,
                file_type: FileType::File,
            },
        )
    }

    #[test]
    fn test_age_bucket_boundaries() {
        assert_eq!(AgeBucket::from_days(0), AgeBucket::Month(0));
        assert_eq!(AgeBucket::from_days(15), AgeBucket::Month(0));
        assert_eq!(AgeBucket::from_days(30), AgeBucket::Month(1));
        assert_eq!(AgeBucket::from_days(719), AgeBucket::Month(23));
        assert_eq!(AgeBucket::from_days(720), AgeBucket::TwoYearsPlus);
        assert_eq!(AgeBucket::from_days(-1), AgeBucket::Future);
    }

    #[test]
    fn test_age_bucket_index_round_trip() {
        for i in 0..AGE_BUCKET_COUNT {
            let bucket = AgeBucket::from_index(i).unwrap();
            assert_eq!(bucket.index(), i);
        }
        assert!(AgeBucket::from_index(AGE_BUCKET_COUNT).is_none());
    }

    #[test]
    fn test_derive_dimensions() {
        let mut eng = engineer();
        let rec = record("/mnt/2024/monza/aero/run01/Data.MP4", 45, 45);
        let derived = eng.derive(&rec).unwrap();

        assert_eq!(derived.days_since_access, 45);
        assert_eq!(derived.age_bucket, AgeBucket::Month(1));
        assert_eq!(eng.pool.resolve(derived.extension), "mp4");
        assert_eq!(
            eng.pool.resolve(derived.parent_dir),
            "/mnt/2024/monza/aero/run01"
        );

        let levels: Vec<&str> = derived
            .dir_levels
            .iter()
            .map(|s| eng.pool.resolve(*s))
            .collect();
        assert_eq!(
            levels,
            vec!["/mnt", "/mnt/2024", "/mnt/2024/monza", "/mnt/2024/monza/aero", "/mnt/2024/monza/aero/run01"]
        );

        let org: Vec<&str> = derived.org.iter().map(|s| eng.pool.resolve(*s)).collect();
        assert_eq!(org, vec!["2024", "monza", "aero"]);
        assert_eq!(eng.pool.resolve(derived.org_tuple), "2024/monza/aero");
    }

    #[test]
    fn test_date_like_department_is_remapped() {
        let mut eng = engineer();
        let rec = record("/mnt/2024/monza/2024-06/file.dat", 10, 10);
        let derived = eng.derive(&rec).unwrap();
        let org: Vec<&str> = derived.org.iter().map(|s| eng.pool.resolve(*s)).collect();
        assert_eq!(org, vec!["2024", "monza", "chassis"]);
    }

    #[test]
    fn test_path_outside_mount_prefix_has_unknown_slots() {
        let mut eng = engineer();
        let rec = record("/data/projects/alpha/file.dat", 10, 10);
        let derived = eng.derive(&rec).unwrap();
        let org: Vec<&str> = derived.org.iter().map(|s| eng.pool.resolve(*s)).collect();
        assert_eq!(org, vec!["Unknown", "Unknown", "Unknown"]);
        assert_eq!(
            eng.pool.resolve(derived.org_tuple),
            "Unknown/Unknown/Unknown"
        );
        // the non-org dimensions are still derived
        assert_eq!(eng.pool.resolve(derived.extension), "dat");
        assert_eq!(derived.dir_levels.len(), 3);
    }

    #[test]
    fn test_shallow_path_fills_unknown() {
        let mut eng = engineer();
        let rec = record("/mnt/2024/file.dat", 10, 10);
        let derived = eng.derive(&rec).unwrap();
        let org: Vec<&str> = derived.org.iter().map(|s| eng.pool.resolve(*s)).collect();
        assert_eq!(org, vec!["2024", "Unknown", "Unknown"]);
    }

    #[test]
    fn test_extension_rules() {
        assert_eq!(extension_of("movie.MP4"), "mp4");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("README"), "unknown");
        assert_eq!(extension_of("trailing."), "unknown");
        assert_eq!(extension_of(".bashrc"), "bashrc");
    }

    #[test]
    fn test_backslash_paths_are_normalized() {
        let mut eng = engineer();
        let rec = record(r"\mnt\2024\monza\aero\file.csv", 5, 5);
        let derived = eng.derive(&rec).unwrap();
        let org: Vec<&str> = derived.org.iter().map(|s| eng.pool.resolve(*s)).collect();
        assert_eq!(org, vec!["2024", "monza", "aero"]);
    }

    #[test]
    fn test_error_record_is_skipped() {
        let mut eng = engineer();
        let rec = FileRecord::failed("/mnt/x".into(), "stat failed".into());
        assert!(eng.derive(&rec).is_none());
    }

    #[test]
    fn test_max_depth_caps_dir_levels() {
        let mut eng = FeatureEngineer::new(
            reference(),
            "/mnt/".into(),
            OrgSlots::parse("season,event,department", "chassis").unwrap(),
            Some(2),
        );
        let rec = record("/mnt/2024/monza/aero/file.csv", 5, 5);
        let derived = eng.derive(&rec).unwrap();
        assert_eq!(derived.dir_levels.len(), 2);
    }
}
