//! Top-level application orchestration.
//!
//! `src/main.rs` is a thin wrapper; this module is the real main that:
//! - parses CLI arguments and sets up logging
//! - runs the fetch/align/detect pipeline
//! - prints reports and charts
//! - writes optional exports

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, RunArgs, ShowArgs};
use crate::cycles::select_recent;
use crate::domain::{DetectorConfig, Panel, RunConfig};
use crate::error::AppError;
use crate::io::{cycle_file, read_cycles_json, write_aligned_csv, write_cycles_json};
use crate::report::{format_cycles, format_dashboard, format_summary};

pub mod pipeline;

/// Entry point for the `cuts` binary.
pub fn run() -> Result<(), AppError> {
    // `cuts` and `cuts --offline` behave like `cuts report ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Report(args) => handle_run(args, OutputMode::Full),
        Command::Cycles(args) => handle_run(args, OutputMode::CyclesOnly),
        Command::Show(args) => handle_show(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    CyclesOnly,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_run(args: RunArgs, mode: OutputMode) -> Result<(), AppError> {
    let mut config = run_config_from_args(&args);
    if mode == OutputMode::CyclesOnly {
        // Only the policy rate is needed to list cycles.
        config.panels.clear();
        config.plot = false;
    }
    let data = pipeline::run(&config)?;

    println!(
        "{}",
        format_summary(&data.source, &data.aligned, &config.detector, data.all_cycles.len(), &data.missing)
    );
    match mode {
        OutputMode::Full => {
            println!("{}", format_cycles(&data.cycles));
            print!("{}", format_dashboard(&data.panels));
        }
        OutputMode::CyclesOnly => {
            println!("{}", format_cycles(&select_recent(&data.all_cycles, data.all_cycles.len())));
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_aligned {
        write_aligned_csv(path, &data.aligned)?;
    }
    if let Some(path) = &config.export_cycles {
        let file = cycle_file(&data.source, &data.aligned, config.detector, &data.all_cycles, &data.cycles);
        write_cycles_json(path, &file)?;
    }

    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = read_cycles_json(&args.cycles)?;

    let span = match (file.first_month, file.last_month) {
        (Some(first), Some(last)) => format!("{}..{}", first.format("%Y-%m"), last.format("%Y-%m")),
        _ => "empty".to_string(),
    };
    println!(
        "{} cycles in {} ({span}) | source={} | drop > {:.3} | gap > {}d\n",
        file.tool, file.series_id, file.source, file.detector.drop_threshold, file.detector.gap_days
    );
    let set = if args.all {
        select_recent(&file.all_cycles, file.all_cycles.len())
    } else {
        file.selected
    };
    println!("{}", format_cycles(&set));
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    let detector = match args.drop_bps {
        Some(bps) => DetectorConfig {
            gap_days: args.gap_days,
            ..DetectorConfig::with_drop_bps(bps)
        },
        None => DetectorConfig {
            drop_threshold: args.drop_threshold,
            gap_days: args.gap_days,
        },
    };

    RunConfig {
        start: args.start,
        detector,
        top_n: args.top,
        panels: if args.panels.is_empty() {
            Panel::ALL.to_vec()
        } else {
            args.panels.clone()
        },
        offline: args.offline,
        seed: args.seed,
        cache_ttl: Duration::from_secs(args.cache_ttl),
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_aligned: args.export.clone(),
        export_cycles: args.export_cycles.clone(),
    }
}

/// Rewrite argv so `cuts` defaults to `cuts report`.
///
/// Rules:
/// - `cuts`                      -> `cuts report`
/// - `cuts --offline ...`        -> `cuts report --offline ...`
/// - `cuts -v ...`               -> unchanged (global flag, subcommand follows)
/// - `cuts --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(first_arg) = argv.iter().skip(1).position(|a| !is_verbosity_flag(a)).map(|i| i + 1) else {
        argv.push("report".to_string());
        return argv;
    };
    let arg = argv[first_arg].as_str();

    let is_top_level_help_or_version = matches!(arg, "-h" | "--help" | "-V" | "--version" | "help");
    let is_subcommand = matches!(arg, "report" | "cycles" | "show");
    if is_top_level_help_or_version || is_subcommand {
        return argv;
    }

    if arg.starts_with('-') {
        argv.insert(first_arg, "report".to_string());
    }
    argv
}

fn is_verbosity_flag(arg: &str) -> bool {
    if arg == "--verbose" {
        return true;
    }
    arg.strip_prefix('-')
        .is_some_and(|flags| !flags.is_empty() && flags.chars().all(|c| c == 'v'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_report() {
        assert_eq!(rewrite_args(argv(&["cuts"])), argv(&["cuts", "report"]));
        assert_eq!(rewrite_args(argv(&["cuts", "-vv"])), argv(&["cuts", "-vv", "report"]));
    }

    #[test]
    fn leading_flags_go_to_report() {
        assert_eq!(
            rewrite_args(argv(&["cuts", "-v", "--offline", "--top", "2"])),
            argv(&["cuts", "-v", "report", "--offline", "--top", "2"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_are_untouched() {
        for args in [&["cuts", "cycles", "--offline"][..], &["cuts", "--help"], &["cuts", "show", "x.json"]] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn empty_panel_list_means_all_panels() {
        let cli = crate::cli::Cli::parse_from(["cuts", "report", "--no-plot", "--drop-threshold", "0.1"]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        let config = run_config_from_args(&args);
        assert_eq!(config.panels, Panel::ALL.to_vec());
        assert!(!config.plot);
        assert_eq!(config.detector.drop_threshold, 0.1);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn drop_bps_converts_to_percentage_points() {
        let cli = crate::cli::Cli::parse_from(["cuts", "cycles", "--drop-bps", "25", "--gap-days", "90"]);
        let Command::Cycles(args) = cli.command else {
            panic!("expected cycles");
        };
        let config = run_config_from_args(&args);
        assert_eq!(config.detector, DetectorConfig { drop_threshold: 0.25, gap_days: 90 });
    }
}
