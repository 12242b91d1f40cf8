//! Shared dashboard pipeline used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch -> align -> detect -> select recent cycles -> per-panel analytics
//!
//! The CLI handlers then focus on presentation (printing and exports).

use tracing::{info, warn};

use crate::cycles::{detect_cycles, select_recent};
use crate::data::sample::default_end;
use crate::data::{CachedSource, FredClient, SeriesSource, SyntheticSource};
use crate::domain::{Cycle, CycleSet, POLICY_RATE, Panel, RawSeries, RunConfig, series_ids_for};
use crate::error::AppError;
use crate::plot::render_panel;
use crate::report::{PanelReport, growth_table, lag_table, overlay_windows};
use crate::resample::{AlignedSet, align};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct DashboardData {
    /// Name of the source the series came from.
    pub source: String,
    pub aligned: AlignedSet,
    /// Every detected cycle, most recent first.
    pub all_cycles: Vec<Cycle>,
    /// The `top_n` most recent cycles.
    pub cycles: CycleSet,
    /// Series that could not be fetched and were aligned as empty.
    pub missing: Vec<String>,
    pub panels: Vec<PanelReport>,
}

/// Execute the pipeline against FRED (or the synthetic source when offline).
pub fn run(config: &RunConfig) -> Result<DashboardData, AppError> {
    if config.offline {
        let source = CachedSource::new(
            SyntheticSource::new(config.seed, config.start, default_end()),
            config.cache_ttl,
        );
        run_with_source(config, &source)
    } else {
        let source = CachedSource::new(FredClient::from_env(config.start)?, config.cache_ttl);
        run_with_source(config, &source)
    }
}

/// Execute the pipeline against any source.
///
/// A failure to fetch the policy rate aborts the run; any other series that
/// fails is logged and aligned as empty so its panel still renders.
pub fn run_with_source<S: SeriesSource>(config: &RunConfig, source: &S) -> Result<DashboardData, AppError> {
    validate(config)?;

    // 1) Fetch every series the requested panels need.
    let mut raw = Vec::new();
    let mut missing = Vec::new();
    for id in series_ids_for(&config.panels) {
        match source.fetch_series(id) {
            Ok(series) => raw.push(series),
            Err(err) if id == POLICY_RATE => return Err(err),
            Err(err) => {
                warn!(series_id = id, source = source.name(), error = %err, "series unavailable, continuing without it");
                missing.push(id.to_string());
                raw.push(RawSeries::empty(id));
            }
        }
    }

    // 2) Align onto one monthly timeline.
    let aligned = align(&raw)?;

    // 3) Detect easing cycles on the policy rate.
    let policy = aligned
        .get(POLICY_RATE)
        .ok_or_else(|| AppError::new(4, format!("{POLICY_RATE} missing from aligned data.")))?;
    let all_cycles = detect_cycles(policy, &config.detector)?;
    if all_cycles.is_empty() {
        return Err(AppError::new(5, format!("Could not detect rate-cut cycles in {POLICY_RATE} data.")));
    }
    let cycles = select_recent(&all_cycles, config.top_n);

    info!(
        source = source.name(),
        months = aligned.timeline().len(),
        detected = all_cycles.len(),
        selected = cycles.len(),
        missing = missing.len(),
        "pipeline complete"
    );

    // 4) Per-panel overlays, tables and charts.
    let panels = config
        .panels
        .iter()
        .map(|&panel| panel_report(&aligned, &cycles, panel, config))
        .collect();

    Ok(DashboardData {
        source: source.name().to_string(),
        aligned,
        all_cycles,
        cycles,
        missing,
        panels,
    })
}

fn panel_report(aligned: &AlignedSet, cycles: &CycleSet, panel: Panel, config: &RunConfig) -> PanelReport {
    let overlays = overlay_windows(cycles, panel.window_months());
    let chart = config
        .plot
        .then(|| render_panel(aligned, panel, &overlays, config.plot_width, config.plot_height));
    PanelReport {
        panel,
        lags: lag_table(aligned, cycles, panel.lag_series()),
        growth: growth_table(aligned, cycles, panel.growth_series()),
        overlays,
        chart,
    }
}

fn validate(config: &RunConfig) -> Result<(), AppError> {
    config.detector.validate()?;
    if config.top_n == 0 {
        return Err(AppError::new(2, "--top must be at least 1."));
    }
    Ok(())
}
