//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed from the core (alignment + detection) to the presentation layer
//! - exported to JSON/CSV
//! - reloaded later for overlays on other charts

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Effective federal funds rate (monthly, percent).
pub const FEDFUNDS: &str = "FEDFUNDS";
/// 30-year fixed mortgage average (weekly, percent).
pub const MORTGAGE30US: &str = "MORTGAGE30US";
/// Bank prime loan rate (daily, percent).
pub const DPRIME: &str = "DPRIME";
/// Credit card delinquency rate (quarterly, percent).
pub const DRCCLACBS: &str = "DRCCLACBS";
/// Consumer loan delinquency rate (quarterly, percent).
pub const DRCLACBS: &str = "DRCLACBS";
/// Single-family residential mortgage delinquency rate (quarterly, percent).
pub const DRSFRMACBS: &str = "DRSFRMACBS";
/// Retail sales excluding food services (monthly, $M).
pub const RSXFS: &str = "RSXFS";
/// Personal consumption expenditures (monthly, $B).
pub const PCE: &str = "PCE";

/// The series the cycle detector runs on.
pub const POLICY_RATE: &str = FEDFUNDS;

/// A single raw reading. Dates need not be month-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A series as delivered by a data source: irregular, possibly sparse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub id: String,
    pub observations: Vec<Observation>,
}

impl RawSeries {
    pub fn new(id: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            id: id.into(),
            observations,
        }
    }

    pub fn empty(id: impl Into<String>) -> Self {
        Self::new(id, Vec::new())
    }

    pub fn from_pairs(id: impl Into<String>, pairs: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self::new(
            id,
            pairs
                .into_iter()
                .map(|(date, value)| Observation::new(date, value))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// One month of an aligned series. `value` is `None` before the series' first
/// observation; it is never zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// A series resampled onto a month-start timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub id: String,
    pub points: Vec<MonthlyPoint>,
}

impl MonthlySeries {
    pub fn new(id: impl Into<String>, points: Vec<MonthlyPoint>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }

    /// Build a fully-populated series from consecutive values starting at `first`.
    pub fn from_values(id: impl Into<String>, first: NaiveDate, values: &[f64]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| MonthlyPoint {
                date: crate::resample::add_months(first, i as i32),
                value: Some(v),
            })
            .collect();
        Self::new(id, points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when no month carries a value.
    pub fn has_no_values(&self) -> bool {
        self.points.iter().all(|p| p.value.is_none())
    }

    /// Latest known value at or before `date`.
    pub fn value_asof(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .iter()
            .take_while(|p| p.date <= date)
            .filter_map(|p| p.value)
            .last()
    }

    /// Values in the half-open date window `(after, through]`.
    pub fn values_between(&self, after: NaiveDate, through: NaiveDate) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.date > after && p.date <= through)
            .filter_map(|p| p.value)
            .collect()
    }
}

/// One contiguous easing episode in the policy rate.
///
/// `index` is the recency rank (0 = most recent). `end` is `None` while the
/// episode is still running at the end of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub index: usize,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl Cycle {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Date-range intersection; open cycles extend indefinitely.
    pub fn overlaps(&self, other: &Cycle) -> bool {
        let a_end = self.end.unwrap_or(NaiveDate::MAX);
        let b_end = other.end.unwrap_or(NaiveDate::MAX);
        self.start <= b_end && other.start <= a_end
    }

    /// Chart label, e.g. `Cut 1 (Sep 2024)`.
    pub fn label(&self) -> String {
        format!("Cut {} ({})", self.index + 1, self.start.format("%b %Y"))
    }
}

/// The most recent cycles, exposed for overlay on every chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSet {
    pub limit: usize,
    pub cycles: Vec<Cycle>,
}

impl CycleSet {
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cycle> {
        self.cycles.iter()
    }

    pub fn most_recent(&self) -> Option<&Cycle> {
        self.cycles.first()
    }
}

/// Parameters of the easing detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Minimum month-over-month decline (series units) that counts as a cut.
    /// Strictly greater-than.
    pub drop_threshold: f64,
    /// Quiet period (calendar days since the last cut) after which a cycle closes.
    pub gap_days: i64,
}

impl DetectorConfig {
    pub const DEFAULT_DROP_THRESHOLD: f64 = 0.05;
    pub const DEFAULT_GAP_DAYS: i64 = 180;
    /// Longest calendar month; a tolerance below one step cannot separate episodes.
    pub const MIN_GAP_DAYS: i64 = 31;

    /// Threshold given in basis points, for series quoted in percent.
    pub fn with_drop_bps(bps: f64) -> Self {
        Self {
            drop_threshold: bps / 100.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.drop_threshold.is_finite() && self.drop_threshold >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "drop threshold must be a finite, non-negative number (got {})",
                self.drop_threshold
            )));
        }
        if self.gap_days < Self::MIN_GAP_DAYS {
            return Err(CoreError::InvalidConfig(format!(
                "gap tolerance must be at least {} days (got {})",
                Self::MIN_GAP_DAYS,
                self.gap_days
            )));
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            drop_threshold: Self::DEFAULT_DROP_THRESHOLD,
            gap_days: Self::DEFAULT_GAP_DAYS,
        }
    }
}

/// Portable record of a detection run (`cuts cycles --export-cycles`).
///
/// Holds everything needed to redraw the overlays without refetching data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleFile {
    pub tool: String,
    /// Data source name (`fred`, `synthetic`, ...).
    pub source: String,
    pub series_id: String,
    pub detector: DetectorConfig,
    /// Months covered by the policy series, first and last.
    pub first_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
    /// Every detected cycle, most recent first.
    pub all_cycles: Vec<Cycle>,
    pub selected: CycleSet,
}

/// A series shown on a panel, with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSeries {
    pub id: &'static str,
    pub label: &'static str,
}

/// Annotated chart views over the aligned set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    /// Policy, mortgage and prime rates.
    Lending,
    /// Delinquency rates against the policy rate.
    Credit,
    /// Retail sales and consumption.
    Payments,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Lending, Panel::Credit, Panel::Payments];

    pub fn title(self) -> &'static str {
        match self {
            Panel::Lending => "Lending Impact",
            Panel::Credit => "Credit Risk",
            Panel::Payments => "Payment Volumes",
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            Panel::Lending => "Should we reprice our loan products?",
            Panel::Credit => "Are our credit models still valid?",
            Panel::Payments => "Should we expect payment volume to shift?",
        }
    }

    pub fn series(self) -> &'static [PanelSeries] {
        match self {
            Panel::Lending => &[
                PanelSeries { id: FEDFUNDS, label: "Fed Funds Rate" },
                PanelSeries { id: MORTGAGE30US, label: "30-Yr Fixed Mortgage" },
                PanelSeries { id: DPRIME, label: "Prime Rate" },
            ],
            Panel::Credit => &[
                PanelSeries { id: DRCCLACBS, label: "Credit Card Delinquency" },
                PanelSeries { id: DRCLACBS, label: "Consumer Loan Delinquency" },
                PanelSeries { id: DRSFRMACBS, label: "SF Mortgage Delinquency" },
                PanelSeries { id: FEDFUNDS, label: "Fed Funds Rate" },
            ],
            Panel::Payments => &[
                PanelSeries { id: RSXFS, label: "Retail Sales ex. Food ($M)" },
                PanelSeries { id: PCE, label: "Personal Consumption ($B)" },
            ],
        }
    }

    /// Months shaded after each cycle start.
    pub fn window_months(self) -> u32 {
        match self {
            Panel::Lending => 12,
            Panel::Credit => 18,
            Panel::Payments => 12,
        }
    }

    /// Series sharing one y-axis; otherwise each series is scaled on its own.
    pub fn shared_axis(self) -> bool {
        !matches!(self, Panel::Payments)
    }

    /// Series whose pass-through lag is tabulated for this panel.
    pub fn lag_series(self) -> &'static [&'static str] {
        match self {
            Panel::Lending => &[MORTGAGE30US, DPRIME],
            Panel::Credit | Panel::Payments => &[],
        }
    }

    /// Series whose spending growth is tabulated for this panel.
    pub fn growth_series(self) -> &'static [&'static str] {
        match self {
            Panel::Payments => &[RSXFS, PCE],
            Panel::Lending | Panel::Credit => &[],
        }
    }
}

/// Every series id needed by `panels`, policy rate first, without duplicates.
pub fn series_ids_for(panels: &[Panel]) -> Vec<&'static str> {
    let mut ids = vec![POLICY_RATE];
    for panel in panels {
        for s in panel.series() {
            if !ids.contains(&s.id) {
                ids.push(s.id);
            }
        }
    }
    ids
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Earliest observation date requested from the source.
    pub start: NaiveDate,
    pub detector: DetectorConfig,
    /// How many recent cycles to expose.
    pub top_n: usize,
    pub panels: Vec<Panel>,

    /// Use the deterministic synthetic source instead of FRED.
    pub offline: bool,
    pub seed: u64,
    pub cache_ttl: Duration,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_aligned: Option<PathBuf>,
    pub export_cycles: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(NaiveDate::MIN),
            detector: DetectorConfig::default(),
            top_n: 3,
            panels: Panel::ALL.to_vec(),
            offline: false,
            seed: 42,
            cache_ttl: Duration::from_secs(3600),
            plot: true,
            plot_width: 100,
            plot_height: 20,
            export_aligned: None,
            export_cycles: None,
        }
    }
}
