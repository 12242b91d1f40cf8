//! Month-start bucketing and forward-fill onto a shared timeline.

use chrono::{Datelike, Months, NaiveDate};
use tracing::debug;

use crate::domain::{MonthlyPoint, MonthlySeries, RawSeries};
use crate::error::CoreError;

/// First day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift by whole months, saturating at the representable date range.
pub fn add_months(date: NaiveDate, n: i32) -> NaiveDate {
    if n >= 0 {
        date.checked_add_months(Months::new(n as u32))
            .unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_months(Months::new(n.unsigned_abs()))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Signed number of calendar months from `from` to `to` (day-of-month ignored).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month0() as i32 - from.month0() as i32
}

/// A contiguous, strictly increasing run of month-start dates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Timeline {
    months: Vec<NaiveDate>,
}

impl Timeline {
    /// Every month from `first` through `last` inclusive (both snapped to month start).
    pub fn spanning(first: NaiveDate, last: NaiveDate) -> Self {
        let first = month_start(first);
        let last = month_start(last);
        let n = months_between(first, last);
        if n < 0 {
            return Self::default();
        }
        Self {
            months: (0..=n).map(|i| add_months(first, i)).collect(),
        }
    }

    /// Accept an explicit month list; it must already be a hole-free monthly run.
    pub fn from_months(months: Vec<NaiveDate>) -> Result<Self, CoreError> {
        for (i, &m) in months.iter().enumerate() {
            if m.day() != 1 {
                return Err(CoreError::malformed("timeline", format!("{m} is not a month start")));
            }
            if i > 0 && months_between(months[i - 1], m) != 1 {
                return Err(CoreError::malformed(
                    "timeline",
                    format!("{} is not the month after {}", m, months[i - 1]),
                ));
            }
        }
        Ok(Self { months })
    }

    pub fn months(&self) -> &[NaiveDate] {
        &self.months
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.months.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.months.last().copied()
    }
}

/// Reject raw input that breaks the source contract.
pub fn validate_raw(raw: &RawSeries) -> Result<(), CoreError> {
    for (i, obs) in raw.observations.iter().enumerate() {
        if !obs.value.is_finite() {
            return Err(CoreError::malformed(
                &raw.id,
                format!("non-finite value at {}", obs.date),
            ));
        }
        if i == 0 {
            continue;
        }
        let prev = raw.observations[i - 1].date;
        if obs.date == prev {
            return Err(CoreError::malformed(&raw.id, format!("duplicate date {}", obs.date)));
        }
        if obs.date < prev {
            return Err(CoreError::malformed(
                &raw.id,
                format!("dates out of order: {} follows {}", obs.date, prev),
            ));
        }
    }
    Ok(())
}

/// Group observations by month start; several readings in one month are averaged.
pub fn bucket_monthly(raw: &RawSeries) -> Result<Vec<(NaiveDate, f64)>, CoreError> {
    validate_raw(raw)?;

    let mut out: Vec<(NaiveDate, f64)> = Vec::new();
    let mut current: Option<(NaiveDate, f64, usize)> = None;

    for obs in &raw.observations {
        let month = month_start(obs.date);
        match current {
            Some((m, sum, n)) if m == month => current = Some((m, sum + obs.value, n + 1)),
            Some((m, sum, n)) => {
                out.push((m, sum / n as f64));
                current = Some((month, obs.value, 1));
            }
            None => current = Some((month, obs.value, 1)),
        }
    }
    if let Some((m, sum, n)) = current {
        out.push((m, sum / n as f64));
    }

    Ok(out)
}

/// Month range covering every series in the working set: from the earliest
/// first-observation month to the latest last-observation month.
///
/// Empty series do not widen the range.
pub fn derive_timeline(series: &[RawSeries]) -> Timeline {
    let mut first: Option<NaiveDate> = None;
    let mut last: Option<NaiveDate> = None;
    for s in series {
        for obs in &s.observations {
            first = Some(first.map_or(obs.date, |f| f.min(obs.date)));
            last = Some(last.map_or(obs.date, |l| l.max(obs.date)));
        }
    }
    match (first, last) {
        (Some(f), Some(l)) => Timeline::spanning(f, l),
        _ => Timeline::default(),
    }
}

/// Resample `raw` to one value per timeline month.
///
/// Months without a reading carry the latest earlier value forward (including
/// readings dated before the timeline). Months before the first reading stay `None`.
pub fn resample(raw: &RawSeries, timeline: &Timeline) -> Result<MonthlySeries, CoreError> {
    let buckets = bucket_monthly(raw)?;

    let mut pending = buckets.iter().peekable();
    let mut carry: Option<f64> = None;
    let mut points = Vec::with_capacity(timeline.len());

    for &month in timeline.months() {
        while let Some(&&(bucket, value)) = pending.peek() {
            if bucket > month {
                break;
            }
            carry = Some(value);
            pending.next();
        }
        points.push(MonthlyPoint { date: month, value: carry });
    }

    Ok(MonthlySeries::new(raw.id.clone(), points))
}

/// A working set of series sharing one monthly timeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSet {
    timeline: Timeline,
    series: Vec<MonthlySeries>,
}

impl AlignedSet {
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn get(&self, id: &str) -> Option<&MonthlySeries> {
        self.series.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MonthlySeries> {
        self.series.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Validate every series, derive the shared timeline and resample each onto it.
pub fn align(series: &[RawSeries]) -> Result<AlignedSet, CoreError> {
    for (i, s) in series.iter().enumerate() {
        if series[..i].iter().any(|other| other.id == s.id) {
            return Err(CoreError::malformed(&s.id, "series supplied more than once"));
        }
        validate_raw(s)?;
    }

    let timeline = derive_timeline(series);
    let aligned = series
        .iter()
        .map(|s| resample(s, &timeline))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        series = aligned.len(),
        months = timeline.len(),
        first = ?timeline.first(),
        last = ?timeline.last(),
        "aligned series onto monthly timeline"
    );

    Ok(AlignedSet {
        timeline,
        series: aligned,
    })
}
