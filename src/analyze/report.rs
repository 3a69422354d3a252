//! Console report for the analysis results

use crate::analyze::aggregate::{rank_groups, Analysis, RankedGroup};
use crate::analyze::classify::TEMPERATURES;
use crate::analyze::features::AgeBucket;
use crate::analyze::intern::CategoryPool;
use crate::analyze::DatasetSummary;
use crate::config::AnalyzeConfig;
use crate::progress::format_number;
use console::style;
use humansize::{format_size, BINARY};

const LABEL_WIDTH: usize = 32;

/// Print the full analysis report
pub fn print_report(
    analysis: &Analysis,
    pool: &CategoryPool,
    summary: &DatasetSummary,
    config: &AnalyzeConfig,
) {
    print_dataset_section(analysis, summary, config);
    print_temperature_section(analysis, config);

    print_ranked_section(
        "Top Extensions",
        &rank_groups(&analysis.by_extension, pool, config.top_k),
    );

    for (slot, groups) in analysis.by_org.iter().enumerate() {
        let name = &config.org_slots.names[slot];
        print_ranked_section(
            &format!("By {}", capitalize(name)),
            &rank_groups(groups, pool, config.top_k),
        );
    }

    print_ranked_section(
        &format!("By {}", config.org_slots.names.join("/")),
        &rank_groups(&analysis.by_org_tuple, pool, config.top_k),
    );

    print_ranked_section(
        "Top Directories",
        &rank_groups(&analysis.by_parent_dir, pool, config.top_k),
    );

    for (level, groups) in analysis.by_dir_level.iter().enumerate() {
        print_ranked_section(
            &format!("Depth {}", level + 1),
            &rank_groups(groups, pool, config.top_k),
        );
    }

    print_age_section(analysis);
}

fn print_dataset_section(analysis: &Analysis, summary: &DatasetSummary, config: &AnalyzeConfig) {
    println!();
    println!(
        "{} {}",
        style("Tiering Analysis").cyan().bold(),
        config.dataset_path.display()
    );
    println!("{}", style("─".repeat(72)).dim());
    println!(
        "  {} {}",
        style("Reference Date:").bold(),
        config.reference_date.format("%Y-%m-%d")
    );
    println!(
        "  {} hot ≤ {} days, cold ≥ {} days",
        style("Thresholds:").bold(),
        config.hot_days,
        config.cold_days
    );
    println!("  {} {}", style("Rows:").bold(), format_number(summary.rows));
    println!(
        "  {} {}",
        style("Analyzed:").bold(),
        format_number(analysis.analyzed)
    );
    if summary.error_rows > 0 {
        println!(
            "  {} {}",
            style("Scan Errors:").yellow().bold(),
            format_number(summary.error_rows)
        );
    }
    if summary.unclassifiable > 0 {
        println!(
            "  {} {}",
            style("No Access Time:").yellow().bold(),
            format_number(summary.unclassifiable)
        );
    }
    println!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(analysis.total_size, BINARY)
    );
    if analysis.analyzed > 0 {
        println!(
            "  {} {}",
            style("Mean Size:").bold(),
            format_size(analysis.total_size / analysis.analyzed, BINARY)
        );
    }
    println!(
        "  {} {}",
        style("Extensions:").bold(),
        format_number(analysis.by_extension.len() as u64)
    );
    println!();
}

fn print_temperature_section(analysis: &Analysis, _config: &AnalyzeConfig) {
    println!("{}", style("Temperature Tiers").cyan().bold());
    println!("{}", style("─".repeat(72)).dim());
    println!(
        "  {:<12} {:>12} {:>12} {:>8}",
        "tier", "files", "size", "bytes%"
    );
    for temp in TEMPERATURES {
        let totals = analysis.temperature[temp.index()];
        println!(
            "  {:<12} {:>12} {:>12} {:>7.1}%",
            temp.label(),
            format_number(totals.count),
            format_size(totals.total_size, BINARY),
            analysis.tier_percentage(temp)
        );
    }
    println!();
}

fn print_ranked_section(title: &str, ranked: &[RankedGroup]) {
    if ranked.is_empty() {
        return;
    }

    println!("{}", style(title).cyan().bold());
    println!("{}", style("─".repeat(72)).dim());
    println!(
        "  {:<32} {:>10} {:>12} {:>6} {:>6} {:>6}",
        "group", "files", "size", "hot%", "warm%", "cold%"
    );
    for group in ranked {
        let total = group.total();
        let tier_pct = |i: usize| {
            if total.total_size > 0 {
                group.tiers[i].total_size as f64 / total.total_size as f64 * 100.0
            } else {
                0.0
            }
        };
        println!(
            "  {:<32} {:>10} {:>12} {:>5.1}% {:>5.1}% {:>5.1}%",
            truncate_label(&group.label),
            format_number(total.count),
            format_size(total.total_size, BINARY),
            tier_pct(0),
            tier_pct(1),
            tier_pct(2)
        );
    }
    println!();
}

fn print_age_section(analysis: &Analysis) {
    println!("{}", style("Age Distribution (by access time)").cyan().bold());
    println!("{}", style("─".repeat(72)).dim());
    println!("  {:<12} {:>12} {:>12}", "age", "files", "size");
    for (index, totals) in analysis.age_distribution.iter().enumerate() {
        let label = match AgeBucket::from_index(index) {
            Some(bucket) => bucket.label(),
            None => continue,
        };
        println!(
            "  {:<12} {:>12} {:>12}",
            label,
            format_number(totals.count),
            format_size(totals.total_size, BINARY)
        );
    }
    println!();
}

/// Keep long labels (deep directory paths) readable by eliding the front
fn truncate_label(label: &str) -> String {
    let count = label.chars().count();
    if count <= LABEL_WIDTH {
        return label.to_string();
    }
    let tail: String = label
        .chars()
        .skip(count - (LABEL_WIDTH - 1))
        .collect();
    format!("…{}", tail)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("mp4"), "mp4");
        let long = "/mnt/2024/monza/aero/run01/session02/telemetry/raw";
        let out = truncate_label(long);
        assert!(out.starts_with('…'));
        assert_eq!(out.chars().count(), LABEL_WIDTH);
        assert!(out.ends_with("raw"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("season"), "Season");
        assert_eq!(capitalize(""), "");
    }
}
