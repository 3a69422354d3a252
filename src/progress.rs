//! Progress reporting for the scanner
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::walker::{ScanProgress, ScanSummary};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays scan status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &ScanProgress) {
        let msg = format!(
            "Discovered: {} | Records: {} | Errors: {} | Skipped dirs: {} | Rate: {:.0}/s",
            format_number(progress.files_discovered),
            format_number(progress.records_ok),
            format_number(progress.records_err),
            format_number(progress.dirs_failed),
            progress.files_per_second(),
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a header at the start of the scan
pub fn print_header(root: &str, workers: usize, output: &str) {
    println!();
    println!(
        "{} {}",
        style("tierscan").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}

/// Print a summary of the scan results
pub fn print_summary(summary: &ScanSummary, output: &str, errors_output: &str) {
    let duration_secs = summary.duration.as_secs_f64();
    let written = summary.records_ok + summary.records_err;
    let rate = if duration_secs > 0.0 {
        written as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    if summary.completed {
        println!("{}", style("Scan Complete").green().bold());
    } else {
        println!("{}", style("Scan Interrupted").yellow().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(summary.files_discovered)
    );
    println!(
        "  {} {}",
        style("Records:").bold(),
        format_number(summary.records_ok)
    );
    println!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(summary.total_bytes, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if summary.records_err > 0 {
        println!(
            "  {} {}",
            style("Stat Errors:").yellow().bold(),
            format_number(summary.records_err)
        );
    }
    if summary.dirs_failed > 0 {
        println!(
            "  {} {} (see {})",
            style("Skipped Dirs:").yellow().bold(),
            format_number(summary.dirs_failed),
            errors_output
        );
    }
    println!("  {} {}", style("Dataset:").bold(), output);
    println!();
}
