//! Per-cycle analytics shown alongside the charts.
//!
//! - overlay windows: the shaded post-cut region drawn on every panel
//! - pass-through lag: months until a lending rate has fallen 25bp from its
//!   level at the cycle start
//! - spending growth: mean of the 12 months after a cycle start vs the 12 before

use std::fmt;

use chrono::NaiveDate;

use crate::domain::{Cycle, CycleSet, MonthlySeries, Panel};
use crate::resample::{AlignedSet, add_months};

pub mod format;

pub use format::*;

/// Months scanned after a cycle start when measuring pass-through.
pub const LAG_HORIZON_MONTHS: usize = 24;
/// Decline (percentage points) a lending rate must show to count as passed through.
pub const PASS_THROUGH_DECLINE: f64 = 0.25;
/// Months on each side of a cycle start compared for spending growth.
pub const GROWTH_WINDOW_MONTHS: i32 = 12;

/// Shaded region `[start, end]` following a cycle start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayWindow {
    pub cycle: Cycle,
    pub end: NaiveDate,
    pub label: String,
}

impl OverlayWindow {
    pub fn start(&self) -> NaiveDate {
        self.cycle.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.cycle.start && date <= self.end
    }
}

pub fn overlay_windows(cycles: &CycleSet, window_months: u32) -> Vec<OverlayWindow> {
    cycles
        .iter()
        .map(|c| OverlayWindow {
            cycle: *c,
            end: add_months(c.start, window_months as i32),
            label: c.label(),
        })
        .collect()
}

/// Months until a 25bp decline, relative to the level at the cycle start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lag {
    Months(usize),
    /// No qualifying decline within the horizon.
    Beyond(usize),
    /// No value at or before the cycle start.
    Unavailable,
}

impl fmt::Display for Lag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lag::Months(n) => write!(f, "{n} mo"),
            Lag::Beyond(n) => write!(f, ">{n} mo"),
            Lag::Unavailable => write!(f, "n/a"),
        }
    }
}

pub fn pass_through_lag(series: &MonthlySeries, cycle_start: NaiveDate) -> Lag {
    let Some(base) = series.value_asof(cycle_start) else {
        return Lag::Unavailable;
    };
    series
        .points
        .iter()
        .filter(|p| p.date >= cycle_start)
        .take(LAG_HORIZON_MONTHS)
        .position(|p| p.value.is_some_and(|v| v - base <= -PASS_THROUGH_DECLINE))
        .map_or(Lag::Beyond(LAG_HORIZON_MONTHS), Lag::Months)
}

/// Percent change of the post-start mean over the pre-start mean.
///
/// `None` when either window is empty or the pre-start mean is zero.
pub fn spending_growth(series: &MonthlySeries, cycle_start: NaiveDate) -> Option<f64> {
    let post = series.values_between(cycle_start, add_months(cycle_start, GROWTH_WINDOW_MONTHS));
    let pre = series.values_between(add_months(cycle_start, -GROWTH_WINDOW_MONTHS), cycle_start);
    if post.is_empty() || pre.is_empty() {
        return None;
    }
    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    let (post_mean, pre_mean) = (mean(&post), mean(&pre));
    if pre_mean == 0.0 {
        return None;
    }
    Some((post_mean - pre_mean) / pre_mean * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LagRow {
    pub cycle: Cycle,
    pub series_id: String,
    pub lag: Lag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRow {
    pub cycle: Cycle,
    pub series_id: String,
    pub change_pct: f64,
}

/// Lag rows for every cycle and every listed series that has data.
pub fn lag_table(aligned: &AlignedSet, cycles: &CycleSet, series_ids: &[&str]) -> Vec<LagRow> {
    let mut rows = Vec::new();
    for cycle in cycles.iter() {
        for series in present(aligned, series_ids) {
            rows.push(LagRow {
                cycle: *cycle,
                series_id: series.id.clone(),
                lag: pass_through_lag(series, cycle.start),
            });
        }
    }
    rows
}

/// Growth rows for every cycle and every listed series with both windows populated.
pub fn growth_table(aligned: &AlignedSet, cycles: &CycleSet, series_ids: &[&str]) -> Vec<GrowthRow> {
    let mut rows = Vec::new();
    for cycle in cycles.iter() {
        for series in present(aligned, series_ids) {
            if let Some(change_pct) = spending_growth(series, cycle.start) {
                rows.push(GrowthRow {
                    cycle: *cycle,
                    series_id: series.id.clone(),
                    change_pct,
                });
            }
        }
    }
    rows
}

/// Everything shown for one panel of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelReport {
    pub panel: Panel,
    pub overlays: Vec<OverlayWindow>,
    pub lags: Vec<LagRow>,
    pub growth: Vec<GrowthRow>,
    /// Rendered chart, when plotting is enabled.
    pub chart: Option<String>,
}

fn present<'a>(aligned: &'a AlignedSet, series_ids: &'a [&str]) -> impl Iterator<Item = &'a MonthlySeries> {
    series_ids
        .iter()
        .filter_map(|id| aligned.get(id))
        .filter(|s| !s.has_no_values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycles::select_recent;
    use crate::domain::{MonthlyPoint, Panel, RawSeries};
    use crate::resample::align;

    fn m(y: i32, mo: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, 1).unwrap()
    }

    fn cycle(start: NaiveDate) -> Cycle {
        Cycle { index: 0, start, end: None }
    }

    #[test]
    fn overlay_windows_extend_from_cycle_start() {
        let set = select_recent(&[cycle(m(2024, 8))], 3);
        let windows = overlay_windows(&set, 18);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end, m(2026, 2));
        assert_eq!(windows[0].label, "Cut 1 (Aug 2024)");
        assert!(windows[0].contains(m(2025, 1)));
        assert!(!windows[0].contains(m(2024, 7)));
    }

    #[test]
    fn lag_counts_months_until_quarter_point_decline() {
        // Mortgage at 7.0 at the start, falls to 6.75 four months later.
        let s = MonthlySeries::from_values("MORTGAGE30US", m(2019, 1), &[7.0, 7.0, 6.9, 6.8, 6.75, 6.5]);
        assert_eq!(pass_through_lag(&s, m(2019, 1)), Lag::Months(4));
        assert_eq!(pass_through_lag(&s, m(2019, 6)), Lag::Beyond(LAG_HORIZON_MONTHS));
        assert_eq!(Lag::Months(4).to_string(), "4 mo");
        assert_eq!(Lag::Beyond(24).to_string(), ">24 mo");
    }

    #[test]
    fn lag_is_unavailable_without_a_base_value() {
        let s = MonthlySeries::new(
            "DPRIME",
            vec![
                MonthlyPoint { date: m(2019, 1), value: None },
                MonthlyPoint { date: m(2019, 2), value: Some(5.5) },
            ],
        );
        assert_eq!(pass_through_lag(&s, m(2019, 1)), Lag::Unavailable);
        assert_eq!(Lag::Unavailable.to_string(), "n/a");
    }

    #[test]
    fn growth_compares_post_and_pre_windows() {
        // 12 months at 100 through the start month, then 12 months at 110.
        let mut values = vec![100.0; 12];
        values.extend(vec![110.0; 12]);
        let s = MonthlySeries::from_values("RSXFS", m(2019, 1), &values);
        let change = spending_growth(&s, m(2019, 12)).unwrap();
        assert!((change - 10.0).abs() < 1e-9);

        assert_eq!(spending_growth(&s, m(2018, 6)), None);
    }

    #[test]
    fn growth_with_zero_baseline_is_skipped() {
        let s = MonthlySeries::from_values("PCE", m(2019, 1), &[0.0, 0.0, 5.0]);
        assert_eq!(spending_growth(&s, m(2019, 2)), None);
    }

    #[test]
    fn tables_skip_series_without_data() {
        let raw = vec![
            RawSeries::from_pairs("MORTGAGE30US", (1..=12).map(|mo| (m(2020, mo), 4.0 - 0.1 * mo as f64))),
            RawSeries::empty("DPRIME"),
        ];
        let aligned = align(&raw).unwrap();
        let cycles = select_recent(&[cycle(m(2020, 1))], 3);

        let lags = lag_table(&aligned, &cycles, Panel::Lending.lag_series());
        assert_eq!(lags.len(), 1);
        assert_eq!(lags[0].series_id, "MORTGAGE30US");
        assert_eq!(lags[0].lag, Lag::Months(3));

        assert!(growth_table(&aligned, &cycles, Panel::Payments.growth_series()).is_empty());
    }
}
