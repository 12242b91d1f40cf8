//! Deterministic synthetic FRED-like series for offline runs.
//!
//! The policy rate follows a scripted path of target changes (noise-free, so
//! cycle detection on it is exact). Every other series is derived from it with
//! seeded Gaussian noise at its real publication cadence:
//!
//! - `DPRIME`: business-daily, policy + 300bp
//! - `MORTGAGE30US`: weekly
//! - delinquency rates: quarterly, rising after easing
//! - `RSXFS`, `PCE`: monthly, trend growth

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::debug;

use crate::data::SeriesSource;
use crate::domain::{
    DPRIME, DRCCLACBS, DRCLACBS, DRSFRMACBS, FEDFUNDS, MORTGAGE30US, Observation, PCE, RSXFS, RawSeries,
};
use crate::error::AppError;
use crate::resample::{add_months, month_start, months_between};

/// Policy-rate level effective from each `(year, month)`.
const POLICY_PATH: &[(i32, u32, f64)] = &[
    (1990, 1, 8.25),
    (1990, 7, 8.00),
    (1990, 11, 7.50),
    (1991, 1, 6.75),
    (1991, 4, 5.75),
    (1991, 9, 5.25),
    (1991, 12, 4.50),
    (1992, 4, 3.75),
    (1992, 9, 3.00),
    (1994, 3, 3.50),
    (1994, 6, 4.25),
    (1994, 11, 5.50),
    (1995, 3, 6.00),
    (1995, 8, 5.75),
    (1996, 1, 5.25),
    (1998, 10, 5.00),
    (1998, 11, 4.75),
    (1999, 7, 5.00),
    (1999, 12, 5.50),
    (2000, 5, 6.50),
    (2001, 1, 5.50),
    (2001, 3, 5.00),
    (2001, 5, 4.00),
    (2001, 8, 3.50),
    (2001, 10, 2.50),
    (2001, 12, 1.75),
    (2002, 11, 1.25),
    (2003, 7, 1.00),
    (2004, 7, 1.25),
    (2005, 1, 2.25),
    (2005, 7, 3.25),
    (2006, 1, 4.25),
    (2006, 7, 5.25),
    (2007, 9, 4.75),
    (2007, 11, 4.50),
    (2008, 1, 3.00),
    (2008, 4, 2.25),
    (2008, 5, 2.00),
    (2008, 10, 1.50),
    (2008, 11, 1.00),
    (2008, 12, 0.12),
    (2015, 12, 0.25),
    (2016, 12, 0.50),
    (2017, 6, 1.25),
    (2018, 6, 1.75),
    (2018, 12, 2.40),
    (2019, 8, 2.15),
    (2019, 10, 1.75),
    (2020, 3, 0.65),
    (2020, 4, 0.05),
    (2022, 3, 0.25),
    (2022, 6, 1.50),
    (2022, 9, 3.00),
    (2022, 12, 4.25),
    (2023, 3, 4.75),
    (2023, 7, 5.33),
    (2024, 9, 5.13),
    (2024, 10, 4.83),
    (2024, 12, 4.48),
];

/// Last month produced when no explicit end is given.
pub fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    start: NaiveDate,
    end: NaiveDate,
}

impl SyntheticSource {
    pub fn new(seed: u64, start: NaiveDate, end: NaiveDate) -> Self {
        Self { seed, start, end }
    }

    fn rng_for(&self, series_id: &str) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ series_key(series_id))
    }

    fn generate(&self, series_id: &str) -> Result<Vec<Observation>, AppError> {
        let mut rng = self.rng_for(series_id);
        let mut noisy = |dates: Vec<NaiveDate>, sd: f64, f: &dyn Fn(NaiveDate) -> f64| {
            let normal = Normal::new(0.0, sd)
                .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
            Ok::<_, AppError>(
                dates
                    .into_iter()
                    .map(|d| Observation::new(d, f(d) + normal.sample(&mut rng)))
                    .collect::<Vec<_>>(),
            )
        };

        match series_id {
            FEDFUNDS => Ok(self
                .monthly_dates()
                .into_iter()
                .map(|d| Observation::new(d, policy_level(d)))
                .collect()),
            DPRIME => Ok(self
                .business_days()
                .into_iter()
                .map(|d| Observation::new(d, policy_level(d) + 3.0))
                .collect()),
            MORTGAGE30US => noisy(self.weekly_dates(), 0.08, &|d: NaiveDate| 3.5 + 0.7 * policy_level(d)),
            DRCCLACBS => noisy(self.quarterly_dates(), 0.10, &|d: NaiveDate| 3.0 + 0.35 * easing_pressure(d)),
            DRCLACBS => noisy(self.quarterly_dates(), 0.08, &|d: NaiveDate| 2.2 + 0.25 * easing_pressure(d)),
            DRSFRMACBS => noisy(self.quarterly_dates(), 0.10, &|d: NaiveDate| 2.0 + 0.60 * easing_pressure(d)),
            RSXFS => {
                let rel = noisy(self.monthly_dates(), 0.004, &|_: NaiveDate| 0.0)?;
                Ok(rel
                    .into_iter()
                    .map(|o| Observation::new(o.date, 150_000.0 * trend(o.date, 0.0038) * (1.0 + o.value)))
                    .collect())
            }
            PCE => {
                let rel = noisy(self.monthly_dates(), 0.002, &|_: NaiveDate| 0.0)?;
                Ok(rel
                    .into_iter()
                    .map(|o| Observation::new(o.date, 3_800.0 * trend(o.date, 0.0042) * (1.0 + o.value)))
                    .collect())
            }
            other => Err(AppError::new(4, format!("No synthetic data for series {other}."))),
        }
    }

    fn monthly_dates(&self) -> Vec<NaiveDate> {
        let first = if self.start.day() == 1 {
            self.start
        } else {
            add_months(month_start(self.start), 1)
        };
        let mut out = Vec::new();
        let mut d = first;
        while d <= self.end {
            out.push(d);
            d = add_months(d, 1);
        }
        out
    }

    fn quarterly_dates(&self) -> Vec<NaiveDate> {
        self.monthly_dates()
            .into_iter()
            .filter(|d| d.month0() % 3 == 0)
            .collect()
    }

    fn weekly_dates(&self) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        let mut d = self.start;
        while d <= self.end {
            out.push(d);
            d += Duration::days(7);
        }
        out
    }

    fn business_days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect()
    }
}

impl SeriesSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_series(&self, series_id: &str) -> Result<RawSeries, AppError> {
        let observations = self.generate(series_id)?;
        debug!(series_id, observations = observations.len(), seed = self.seed, "generated synthetic series");
        Ok(RawSeries::new(series_id, observations))
    }
}

/// FNV-1a over the id bytes: a per-series seed that stays fixed across toolchains.
fn series_key(series_id: &str) -> u64 {
    series_id
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3))
}

/// Scripted policy rate in effect during `date`'s month.
pub fn policy_level(date: NaiveDate) -> f64 {
    let key = (date.year(), date.month());
    POLICY_PATH
        .iter()
        .take_while(|(y, m, _)| (*y, *m) <= key)
        .last()
        .or(POLICY_PATH.first())
        .map(|&(_, _, level)| level)
        .unwrap_or(0.0)
}

/// How far the policy rate has fallen over the past year (zero when it rose).
fn easing_pressure(date: NaiveDate) -> f64 {
    (policy_level(add_months(date, -12)) - policy_level(date)).max(0.0)
}

fn trend(date: NaiveDate, monthly_growth: f64) -> f64 {
    let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(date);
    (monthly_growth * months_between(base, date) as f64).exp()
}
