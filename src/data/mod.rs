//! Data sources feeding the alignment core.
//!
//! - `fred`: FRED observations over HTTP
//! - `sample`: deterministic synthetic series for offline runs
//! - `cache`: time-boxed caching decorator for any source

pub mod cache;
pub mod fred;
pub mod sample;

pub use cache::CachedSource;
pub use fred::FredClient;
pub use sample::SyntheticSource;

use crate::domain::RawSeries;
use crate::error::AppError;

/// Anything that can hand back raw observations for a series id.
pub trait SeriesSource {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn fetch_series(&self, series_id: &str) -> Result<RawSeries, AppError>;
}

impl<S: SeriesSource + ?Sized> SeriesSource for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_series(&self, series_id: &str) -> Result<RawSeries, AppError> {
        (**self).fetch_series(series_id)
    }
}

impl<S: SeriesSource + ?Sized> SeriesSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_series(&self, series_id: &str) -> Result<RawSeries, AppError> {
        (**self).fetch_series(series_id)
    }
}
