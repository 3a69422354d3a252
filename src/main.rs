//! tierscan - Filesystem Metadata Scanner with Tiering Analysis
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tierscan::analyze;
use tierscan::config::{AnalyzeConfig, CliArgs, Command, ScanConfig};
use tierscan::progress::{print_header, print_summary, ProgressReporter};
use tierscan::walker::ScanCoordinator;

/// Exit code when the user declines the overwrite prompt
const EXIT_CANCELLED: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = CliArgs::parse();

    match args.command {
        cmd @ Command::Scan { .. } => {
            let verbose = matches!(cmd, Command::Scan { verbose: true, .. });
            setup_logging(verbose)?;
            let config = ScanConfig::from_command(cmd).context("Invalid configuration")?;
            run_scan(config)
        }
        cmd @ Command::Analyze { .. } => {
            let verbose = matches!(cmd, Command::Analyze { verbose: true, .. });
            setup_logging(verbose)?;
            let config = AnalyzeConfig::from_command(cmd).context("Invalid configuration")?;
            analyze::run(&config).context("Analysis failed")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_scan(config: ScanConfig) -> Result<ExitCode> {
    if !config.force && !confirm_overwrite(&config)? {
        println!("Scan cancelled.");
        return Ok(ExitCode::from(EXIT_CANCELLED));
    }

    if config.show_progress {
        print_header(
            &config.root.display().to_string(),
            config.worker_count,
            &config.output_path.display().to_string(),
        );
    }

    let output = config.output_path.display().to_string();
    let errors_output = config.errors_path.display().to_string();
    let show_progress = config.show_progress;

    let coordinator = ScanCoordinator::new(config);

    // Graceful shutdown on Ctrl-C: in-flight work drains, partial batches
    // are flushed, and the summary reports the scan as interrupted.
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let summary = if show_progress {
        let reporter = std::sync::Arc::new(ProgressReporter::new());
        reporter.set_status("Scanning...");
        let update = std::sync::Arc::clone(&reporter);
        let result = coordinator.run_with_progress(move |progress| update.update(&progress));
        reporter.finish_and_clear();
        result.context("Scan failed")?
    } else {
        coordinator.run().context("Scan failed")?
    };

    print_summary(&summary, &output, &errors_output);

    if !summary.completed {
        info!("Scan was interrupted before completion");
    }

    Ok(ExitCode::SUCCESS)
}

/// Ask before clobbering an existing dataset
fn confirm_overwrite(config: &ScanConfig) -> Result<bool> {
    if !config.output_path.exists() {
        return Ok(true);
    }

    print!(
        "Output '{}' already exists. Overwrite? [y/N] ",
        config.output_path.display()
    );
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("tierscan=debug,warn")
    } else {
        EnvFilter::new("tierscan=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
