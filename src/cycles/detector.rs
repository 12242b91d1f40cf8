//! Easing-cycle detection over a month-aligned policy-rate series.
//!
//! The scan is an explicit two-state machine:
//!
//! - `Idle`: no episode in progress. A qualifying drop at month `m` opens one
//!   that starts at month `m-1` (the last pre-cut reading).
//! - `InCycle`: every further qualifying drop refreshes `last_drop`. Once the
//!   calendar gap between the current month and `last_drop` exceeds the
//!   tolerance, the cycle closes with `end = last_drop`.
//!
//! The gap check runs before the drop check, so a cut that arrives after the
//! tolerance has already elapsed closes the old episode and opens a new one.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Cycle, DetectorConfig, MonthlySeries};
use crate::error::CoreError;
use crate::resample::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    Idle,
    InCycle { start: NaiveDate, last_drop: NaiveDate },
}

/// Relative slack absorbing the rounding of a decimal subtraction.
const DROP_EPSILON: f64 = 1e-12;

/// `prev - current` strictly above the threshold. Missing values never qualify.
///
/// A decline equal to the threshold in decimal terms (5.55 -> 5.50 at 0.05)
/// never qualifies, whichever side of it the `f64` difference lands on.
fn is_qualifying_drop(prev: Option<f64>, current: Option<f64>, threshold: f64) -> bool {
    match (prev, current) {
        (Some(p), Some(c)) => {
            let slack = DROP_EPSILON * p.abs().max(c.abs()).max(1.0);
            p - c > threshold + slack
        }
        _ => false,
    }
}

fn gap_exceeded(last_drop: NaiveDate, current: NaiveDate, gap_days: i64) -> bool {
    (current - last_drop).num_days() > gap_days
}

/// Detect every easing cycle in `rate`, most recent first.
///
/// Fewer than two months yields an empty list. The series must sit on a
/// hole-free month-start timeline (as produced by [`crate::resample::align`]).
pub fn detect_cycles(rate: &MonthlySeries, config: &DetectorConfig) -> Result<Vec<Cycle>, CoreError> {
    config.validate()?;
    if rate.len() < 2 {
        return Ok(Vec::new());
    }
    Timeline::from_months(rate.points.iter().map(|p| p.date).collect()).map_err(|e| match e {
        CoreError::MalformedInput { detail, .. } => CoreError::malformed(&rate.id, detail),
        other => other,
    })?;

    // (start, end) in chronological order.
    let mut closed: Vec<(NaiveDate, Option<NaiveDate>)> = Vec::new();
    let mut state = DetectorState::Idle;

    for window in rate.points.windows(2) {
        let (prev, current) = (window[0], window[1]);

        if let DetectorState::InCycle { start, last_drop } = state
            && gap_exceeded(last_drop, current.date, config.gap_days)
        {
            debug!(%start, end = %last_drop, "easing cycle closed");
            closed.push((start, Some(last_drop)));
            state = DetectorState::Idle;
        }

        if !is_qualifying_drop(prev.value, current.value, config.drop_threshold) {
            continue;
        }

        state = match state {
            DetectorState::Idle => {
                debug!(start = %prev.date, first_cut = %current.date, "easing cycle opened");
                DetectorState::InCycle {
                    start: prev.date,
                    last_drop: current.date,
                }
            }
            DetectorState::InCycle { start, .. } => DetectorState::InCycle {
                start,
                last_drop: current.date,
            },
        };
    }

    if let DetectorState::InCycle { start, .. } = state {
        debug!(%start, "easing cycle still open at end of data");
        closed.push((start, None));
    }

    Ok(closed
        .into_iter()
        .rev()
        .enumerate()
        .map(|(index, (start, end))| Cycle { index, start, end })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MonthlyPoint;
    use crate::resample::add_months;

    fn m(y: i32, mo: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, 1).unwrap()
    }

    fn series(first: NaiveDate, values: &[f64]) -> MonthlySeries {
        MonthlySeries::from_values("FEDFUNDS", first, values)
    }

    fn detect(s: &MonthlySeries) -> Vec<Cycle> {
        detect_cycles(s, &DetectorConfig::default()).unwrap()
    }

    /// Flat series of `len` months at `level`, with `cuts` applied at the given offsets.
    fn with_cuts(len: usize, level: f64, cuts: &[(usize, f64)]) -> Vec<f64> {
        let mut v = vec![level; len];
        for &(at, size) in cuts {
            for x in v.iter_mut().skip(at) {
                *x -= size;
            }
        }
        v
    }

    #[test]
    fn fed_funds_like_series_yields_one_open_cycle() {
        let first = m(2024, 1);
        let s = series(first, &[5.50, 5.50, 5.25, 5.25, 4.75, 4.75, 4.75, 4.50]);
        let cycles = detect(&s);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].index, 0);
        assert_eq!(cycles[0].start, add_months(first, 1));
        assert_eq!(cycles[0].end, None);
    }

    #[test]
    fn drop_equal_to_threshold_does_not_qualify() {
        let exact = series(m(2020, 1), &[1.0, 0.75, 0.75]);
        let cfg = DetectorConfig { drop_threshold: 0.25, gap_days: 180 };
        assert!(detect_cycles(&exact, &cfg).unwrap().is_empty());

        let above = series(m(2020, 1), &[1.0, 0.75 - 1e-9, 0.75 - 1e-9]);
        let cycles = detect_cycles(&above, &cfg).unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].start, m(2020, 1));
    }

    #[test]
    fn five_bp_cuts_at_the_default_threshold_never_qualify() {
        for (prev, cur) in [(1.20, 1.15), (5.55, 5.50), (0.15, 0.10), (2.40, 2.35), (4.83, 4.78)] {
            let s = series(m(2020, 1), &[prev, cur]);
            assert!(detect(&s).is_empty(), "{prev} -> {cur} counted as a cut");
        }

        let six_bp = series(m(2020, 1), &[1.20, 1.14]);
        assert_eq!(detect(&six_bp).len(), 1);
    }

    #[test]
    fn cuts_three_months_apart_merge_into_one_cycle() {
        // Jan -> Feb cut, Apr -> May cut: 89 days between qualifying months.
        let values = with_cuts(14, 5.0, &[(1, 0.25), (4, 0.25)]);
        let cycles = detect(&series(m(2019, 1), &values));

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].start, m(2019, 1));
        assert_eq!(cycles[0].end, Some(m(2019, 5)));
    }

    #[test]
    fn cuts_seven_months_apart_form_two_cycles() {
        // Qualifying months Feb and Sep 2019 are 212 days apart.
        let values = with_cuts(20, 5.0, &[(1, 0.25), (8, 0.25)]);
        let cycles = detect(&series(m(2019, 1), &values));

        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].index, 0);
        assert_eq!(cycles[0].start, m(2019, 8));
        assert_eq!(cycles[0].end, Some(m(2019, 9)));
        assert_eq!(cycles[1].index, 1);
        assert_eq!(cycles[1].start, m(2019, 1));
        assert_eq!(cycles[1].end, Some(m(2019, 2)));
    }

    #[test]
    fn cycle_closes_at_last_cut_not_at_gap_boundary() {
        let values = with_cuts(24, 5.0, &[(3, 0.5), (4, 0.5), (5, 0.25)]);
        let cycles = detect(&series(m(2007, 6), &values));

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].start, m(2007, 8));
        assert_eq!(cycles[0].end, Some(m(2007, 11)));
    }

    #[test]
    fn first_month_never_opens_a_cycle() {
        let s = MonthlySeries::new(
            "FEDFUNDS",
            vec![
                MonthlyPoint { date: m(2020, 1), value: None },
                MonthlyPoint { date: m(2020, 2), value: Some(1.5) },
                MonthlyPoint { date: m(2020, 3), value: Some(1.5) },
            ],
        );
        assert!(detect(&s).is_empty());
    }

    #[test]
    fn short_series_yield_no_cycles() {
        assert!(detect(&series(m(2020, 1), &[])).is_empty());
        assert!(detect(&series(m(2020, 1), &[5.0])).is_empty());
    }

    #[test]
    fn rising_rates_never_open_a_cycle() {
        let s = series(m(2022, 1), &[0.25, 0.5, 1.0, 1.75, 2.5, 3.25]);
        assert!(detect(&s).is_empty());
    }

    #[test]
    fn cycles_are_ordered_disjoint_and_well_formed() {
        let values = with_cuts(
            120,
            6.0,
            &[(10, 0.5), (12, 0.5), (40, 0.25), (42, 0.25), (80, 0.5), (119, 0.25)],
        );
        let cycles = detect(&series(m(2000, 1), &values));

        assert_eq!(cycles.len(), 4);
        for (i, c) in cycles.iter().enumerate() {
            assert_eq!(c.index, i);
            if let Some(end) = c.end {
                assert!(c.start < end);
            }
        }
        for pair in cycles.windows(2) {
            assert!(pair[0].start > pair[1].start);
            assert!(!pair[0].overlaps(&pair[1]));
        }
        assert!(cycles[0].is_open());
        assert!(cycles[1..].iter().all(|c| !c.is_open()));
    }

    #[test]
    fn late_cut_after_elapsed_gap_reopens() {
        // Aug 2021 is 181 days after the Feb cut; the Sep cut starts a new cycle.
        let values = with_cuts(12, 3.0, &[(1, 0.25), (8, 0.25)]);
        let cycles = detect(&series(m(2021, 1), &values));
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].start, m(2021, 8));
        assert!(cycles[0].is_open());
    }

    #[test]
    fn holes_and_misaligned_dates_are_malformed() {
        let holed = MonthlySeries::new(
            "FEDFUNDS",
            vec![
                MonthlyPoint { date: m(2020, 1), value: Some(1.0) },
                MonthlyPoint { date: m(2020, 3), value: Some(0.5) },
            ],
        );
        assert!(matches!(
            detect_cycles(&holed, &DetectorConfig::default()),
            Err(CoreError::MalformedInput { series, .. }) if series == "FEDFUNDS"
        ));

        let unordered = MonthlySeries::new(
            "FEDFUNDS",
            vec![
                MonthlyPoint { date: m(2020, 2), value: Some(1.0) },
                MonthlyPoint { date: m(2020, 1), value: Some(0.5) },
            ],
        );
        assert!(detect_cycles(&unordered, &DetectorConfig::default()).is_err());
    }

    #[test]
    fn invalid_config_is_reported() {
        let s = series(m(2020, 1), &[1.0, 0.5]);
        let cfg = DetectorConfig { drop_threshold: -0.1, gap_days: 180 };
        assert!(matches!(detect_cycles(&s, &cfg), Err(CoreError::InvalidConfig(_))));
    }
}
