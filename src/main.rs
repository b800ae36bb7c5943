//! smallify CLI - writes `_small` copies of images and image directories

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use console::style;
use tracing::debug;

use smallify::{init_with_config, Config, LogTarget, RunReport, Walker};

/// smallify - batch image down-scaler
#[derive(Parser)]
#[command(
    name = "smallify",
    version,
    about = "Write resized _small copies of images without touching the originals",
    long_about = "Each PATH is processed independently. An image file gets a sibling \
                  <name>_small.jpg or <name>_small.png. A directory gets a sibling \
                  <name>_small/ holding resized copies of its direct entries; nested \
                  directories are skipped. Outputs fit within 640x480 in either \
                  orientation.",
    arg_required_else_help = true
)]
struct Cli {
    /// Image files or directories to shrink
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the run report as JSON; logs go to stderr
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) if report.has_failures() => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunReport> {
    let config = build_config(cli);

    init_with_config(&config).context("Failed to initialize logging")?;

    let walker = Walker::new(&config).context("Failed to start worker pool")?;
    debug!("Processing {} argument(s)", cli.paths.len());

    let report = walker.run(&cli.paths);

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(report)
}

/// Only logging is adjustable from the command line
fn build_config(cli: &Cli) -> Config {
    let mut config = Config::default();

    config.logging.level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    }
    .to_string();

    if cli.json {
        config.logging.target = LogTarget::Stderr;
    }

    config
}

/// Print processing summary
fn print_summary(report: &RunReport) {
    println!();
    println!("{}", style("Summary:").bold());
    println!("  {}: {}", style("Resized").green(), report.resized.len());
    if !report.directories.is_empty() {
        println!("  {}: {}", style("Directories").cyan(), report.directories.len());
    }
    if !report.skipped.is_empty() {
        println!("  {}: {}", style("Skipped").yellow(), report.skipped.len());
    }
    if report.has_failures() {
        println!("  {}: {}", style("Failed").red(), report.failures.len());
    }
    println!("  {}: {:.2}s", style("Duration").blue(), report.elapsed.as_secs_f64());

    if report.has_failures() {
        println!();
        println!("{}", style("Errors:").red().bold());
        for (i, failure) in report.failures.iter().enumerate() {
            println!("  {}: {}", i + 1, failure.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_from_flags() {
        let cli = Cli::parse_from(["smallify", "-q", "a.jpg"]);
        assert_eq!(build_config(&cli).logging.level, "error");

        let cli = Cli::parse_from(["smallify", "--verbose", "a.jpg", "b"]);
        assert_eq!(cli.paths.len(), 2);
        assert_eq!(build_config(&cli).logging.level, "debug");

        let cli = Cli::parse_from(["smallify", "--json", "a.jpg"]);
        let config = build_config(&cli);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.target, LogTarget::Stderr);
    }

    #[test]
    fn test_paths_are_required() {
        assert!(Cli::try_parse_from(["smallify"]).is_err());
        assert!(Cli::try_parse_from(["smallify", "-v", "-q", "x"]).is_err());
    }
}
