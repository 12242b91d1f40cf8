//! Command-line parsing for the rate-cut cycle dashboard.
//!
//! Argument parsing and command dispatch stay separate from the alignment and
//! detection code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};

use crate::domain::Panel;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cuts", version, about = "Rate-cut cycle dashboard (FRED-based)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). Overrides `RUST_LOG`.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch series, detect cycles and print every panel with charts and tables.
    Report(RunArgs),
    /// Detect and list rate-cut cycles only (fetches just the policy rate).
    Cycles(RunArgs),
    /// Print a previously exported cycle JSON.
    Show(ShowArgs),
}

/// Common options for a dashboard run.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Earliest observation date requested (YYYY-MM-DD).
    #[arg(long, default_value = "1990-01-01")]
    pub start: NaiveDate,

    /// Use deterministic synthetic data instead of FRED (no API key needed).
    #[arg(long)]
    pub offline: bool,

    /// Random seed for synthetic data.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Month-over-month decline (percentage points) that counts as a cut.
    #[arg(long, default_value_t = 0.05)]
    pub drop_threshold: f64,

    /// The same threshold in basis points; overrides `--drop-threshold`.
    #[arg(long, conflicts_with = "drop_threshold")]
    pub drop_bps: Option<f64>,

    /// Days without a cut after which a cycle closes.
    #[arg(long, default_value_t = 180)]
    pub gap_days: i64,

    /// Number of most recent cycles to overlay.
    #[arg(long, default_value_t = 3)]
    pub top: usize,

    /// Panels to show (repeatable). Defaults to all.
    #[arg(long = "panel", value_enum)]
    pub panels: Vec<Panel>,

    /// Seconds a fetched series stays cached.
    #[arg(long, default_value_t = 3600)]
    pub cache_ttl: u64,

    /// Disable the terminal charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the aligned monthly series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export detected cycles to JSON.
    #[arg(long = "export-cycles")]
    pub export_cycles: Option<PathBuf>,
}

/// Options for printing a saved cycle file.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Cycle JSON file produced by `cuts ... --export-cycles`.
    #[arg(value_name = "JSON")]
    pub cycles: PathBuf,

    /// List every detected cycle instead of the selected ones.
    #[arg(long)]
    pub all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_flags_parse() {
        let cli = Cli::parse_from([
            "cuts", "-vv", "report", "--offline", "--panel", "credit", "--panel", "payments", "--top", "2",
            "--start", "2000-01-01",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert!(args.offline);
        assert_eq!(args.panels, vec![Panel::Credit, Panel::Payments]);
        assert_eq!(args.top, 2);
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(args.gap_days, 180);
    }
}
