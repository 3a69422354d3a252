//! Rollup aggregation
//!
//! Accumulates derived records into grouped totals: per temperature tier, per
//! extension, per organizational slot, per parent directory, and per
//! directory-depth level. Every group keeps its totals split by temperature,
//! so the plain rollup and the temperature cross-tab come from the same pass.

use crate::analyze::classify::{classify, Temperature, Thresholds, TEMPERATURES};
use crate::analyze::features::{DerivedRecord, AGE_BUCKET_COUNT};
use crate::analyze::intern::{CategoryPool, Sym};
use std::collections::HashMap;

/// Count and byte totals for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupTotals {
    pub count: u64,
    pub total_size: u64,
}

impl GroupTotals {
    fn add(&mut self, size: u64) {
        self.count += 1;
        self.total_size += size;
    }
}

/// Per-group totals split by temperature tier
pub type TierTotals = [GroupTotals; 3];

/// Sum a tier split back into one total
pub fn tier_sum(tiers: &TierTotals) -> GroupTotals {
    let mut out = GroupTotals::default();
    for t in tiers {
        out.count += t.count;
        out.total_size += t.total_size;
    }
    out
}

/// Complete aggregation output for one dataset
#[derive(Debug, Default)]
pub struct Analysis {
    /// Records that carried usable recency data
    pub analyzed: u64,

    /// Sum of sizes across analyzed records
    pub total_size: u64,

    /// Totals per temperature tier
    pub temperature: TierTotals,

    pub by_extension: HashMap<Sym, TierTotals>,
    pub by_parent_dir: HashMap<Sym, TierTotals>,

    /// One map per organizational slot, in slot order
    pub by_org: Vec<HashMap<Sym, TierTotals>>,

    /// Full organizational tuple (all slots joined)
    pub by_org_tuple: HashMap<Sym, TierTotals>,

    /// One map per directory-depth level, starting at depth 1
    pub by_dir_level: Vec<HashMap<Sym, TierTotals>>,

    /// Zero-filled modification-age distribution
    pub age_distribution: [GroupTotals; AGE_BUCKET_COUNT],
}

impl Analysis {
    /// Fold one derived record into every rollup
    pub fn accumulate(&mut self, record: &DerivedRecord, thresholds: &Thresholds) {
        let temp = classify(record.days_since_access, thresholds);
        let t = temp.index();
        let size = record.size;

        self.analyzed += 1;
        self.total_size += size;
        self.temperature[t].add(size);
        self.age_distribution[record.age_bucket.index()].add(size);

        self.by_extension.entry(record.extension).or_default()[t].add(size);
        self.by_parent_dir.entry(record.parent_dir).or_default()[t].add(size);

        if self.by_org.len() < record.org.len() {
            self.by_org.resize_with(record.org.len(), HashMap::new);
        }
        for (slot, &sym) in record.org.iter().enumerate() {
            self.by_org[slot].entry(sym).or_default()[t].add(size);
        }
        self.by_org_tuple.entry(record.org_tuple).or_default()[t].add(size);

        if self.by_dir_level.len() < record.dir_levels.len() {
            self.by_dir_level
                .resize_with(record.dir_levels.len(), HashMap::new);
        }
        for (level, &sym) in record.dir_levels.iter().enumerate() {
            self.by_dir_level[level].entry(sym).or_default()[t].add(size);
        }
    }

    /// Share of analyzed bytes in one tier, 0..=100
    pub fn tier_percentage(&self, temp: Temperature) -> f64 {
        if self.total_size == 0 {
            return 0.0;
        }
        self.temperature[temp.index()].total_size as f64 / self.total_size as f64 * 100.0
    }
}

/// One row of a ranked rollup
#[derive(Debug, Clone)]
pub struct RankedGroup {
    pub label: String,
    pub tiers: TierTotals,
}

impl RankedGroup {
    pub fn total(&self) -> GroupTotals {
        tier_sum(&self.tiers)
    }
}

/// Rank groups by total size descending, keeping `top_k` and folding the
/// remainder into an "other" row
///
/// Ties break on label so repeated runs over the same dataset produce
/// identical reports.
pub fn rank_groups(
    groups: &HashMap<Sym, TierTotals>,
    pool: &CategoryPool,
    top_k: usize,
) -> Vec<RankedGroup> {
    let mut ranked: Vec<RankedGroup> = groups
        .iter()
        .map(|(&sym, &tiers)| RankedGroup {
            label: pool.resolve(sym).to_string(),
            tiers,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.total()
            .total_size
            .cmp(&a.total().total_size)
            .then_with(|| a.label.cmp(&b.label))
    });

    if ranked.len() > top_k {
        let rest = ranked.split_off(top_k);
        let mut other = RankedGroup {
            label: "other".to_string(),
            tiers: TierTotals::default(),
        };
        for group in rest {
            for temp in TEMPERATURES {
                let i = temp.index();
                other.tiers[i].count += group.tiers[i].count;
                other.tiers[i].total_size += group.tiers[i].total_size;
            }
        }
        ranked.push(other);
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::features::AgeBucket;

    fn derived(
        pool: &mut CategoryPool,
        size: u64,
        days: i64,
        ext: &str,
        org: &[&str],
    ) -> DerivedRecord {
        DerivedRecord {
            size,
            days_since_access: days,
            age_bucket: AgeBucket::from_days(days),
            extension: pool.intern(ext),
            parent_dir: pool.intern("/mnt/x"),
            dir_levels: vec![pool.intern("/mnt"), pool.intern("/mnt/x")],
            org: org.iter().map(|s| pool.intern(s)).collect(),
            org_tuple: pool.intern(&org.join("/")),
        }
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(30, 180).unwrap()
    }

    #[test]
    fn test_totals_are_conserved_across_rollups() {
        let mut pool = CategoryPool::new();
        let mut analysis = Analysis::default();
        let t = thresholds();

        analysis.accumulate(&derived(&mut pool, 100, 5, "mp4", &["2024", "monza"]), &t);
        analysis.accumulate(&derived(&mut pool, 200, 90, "mp4", &["2024", "spa"]), &t);
        analysis.accumulate(&derived(&mut pool, 300, 400, "csv", &["2023", "spa"]), &t);

        assert_eq!(analysis.analyzed, 3);
        assert_eq!(analysis.total_size, 600);

        // every rollup must account for every byte
        let ext_total: u64 = analysis
            .by_extension
            .values()
            .map(|tiers| tier_sum(tiers).total_size)
            .sum();
        assert_eq!(ext_total, 600);

        let temp_total: u64 = analysis.temperature.iter().map(|g| g.total_size).sum();
        assert_eq!(temp_total, 600);

        let age_total: u64 = analysis.age_distribution.iter().map(|g| g.total_size).sum();
        assert_eq!(age_total, 600);

        for slot in &analysis.by_org {
            let slot_total: u64 = slot.values().map(|tiers| tier_sum(tiers).total_size).sum();
            assert_eq!(slot_total, 600);
        }

        let tuple_total: u64 = analysis
            .by_org_tuple
            .values()
            .map(|tiers| tier_sum(tiers).total_size)
            .sum();
        assert_eq!(tuple_total, 600);
    }

    #[test]
    fn test_temperature_split() {
        let mut pool = CategoryPool::new();
        let mut analysis = Analysis::default();
        let t = thresholds();

        analysis.accumulate(&derived(&mut pool, 100, 5, "mp4", &["a"]), &t);
        analysis.accumulate(&derived(&mut pool, 200, 90, "mp4", &["a"]), &t);
        analysis.accumulate(&derived(&mut pool, 300, 400, "mp4", &["a"]), &t);

        assert_eq!(analysis.temperature[Temperature::Hot.index()].total_size, 100);
        assert_eq!(analysis.temperature[Temperature::Warm.index()].total_size, 200);
        assert_eq!(analysis.temperature[Temperature::Cold.index()].total_size, 300);
        assert!((analysis.tier_percentage(Temperature::Cold) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_groups_orders_and_folds() {
        let mut pool = CategoryPool::new();
        let mut groups: HashMap<Sym, TierTotals> = HashMap::new();
        for (name, size) in [("mp4", 500u64), ("csv", 300), ("dat", 200), ("log", 100)] {
            let mut tiers = TierTotals::default();
            tiers[0] = GroupTotals {
                count: 1,
                total_size: size,
            };
            groups.insert(pool.intern(name), tiers);
        }

        let ranked = rank_groups(&groups, &pool, 2);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].label, "mp4");
        assert_eq!(ranked[1].label, "csv");
        assert_eq!(ranked[2].label, "other");
        assert_eq!(ranked[2].total().total_size, 300);
        assert_eq!(ranked[2].total().count, 2);

        // conserved through the fold
        let total: u64 = ranked.iter().map(|g| g.total().total_size).sum();
        assert_eq!(total, 1100);
    }

    #[test]
    fn test_rank_groups_tie_break_is_deterministic() {
        let mut pool = CategoryPool::new();
        let mut groups: HashMap<Sym, TierTotals> = HashMap::new();
        for name in ["zeta", "alpha", "mid"] {
            let mut tiers = TierTotals::default();
            tiers[0] = GroupTotals {
                count: 1,
                total_size: 100,
            };
            groups.insert(pool.intern(name), tiers);
        }

        let ranked = rank_groups(&groups, &pool, 10);
        let labels: Vec<&str> = ranked.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_age_distribution_is_zero_filled() {
        let mut pool = CategoryPool::new();
        let mut analysis = Analysis::default();
        analysis.accumulate(&derived(&mut pool, 100, 45, "mp4", &["a"]), &thresholds());

        assert_eq!(analysis.age_distribution.len(), AGE_BUCKET_COUNT);
        assert_eq!(analysis.age_distribution[1].count, 1);
        let empty = analysis
            .age_distribution
            .iter()
            .filter(|g| g.count == 0)
            .count();
        assert_eq!(empty, AGE_BUCKET_COUNT - 1);
    }
}
