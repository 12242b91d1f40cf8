//! FRED API integration for the macro series behind the dashboard.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::data::SeriesSource;
use crate::domain::{Observation, RawSeries};
use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 100000;

pub struct FredClient {
    client: Client,
    api_key: String,
    observation_start: NaiveDate,
}

impl FredClient {
    pub fn from_env(observation_start: NaiveDate) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| AppError::new(2, "Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self::new(api_key, observation_start))
    }

    pub fn new(api_key: impl Into<String>, observation_start: NaiveDate) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into().trim().to_string(),
            observation_start,
        }
    }
}

impl SeriesSource for FredClient {
    fn name(&self) -> &str {
        "fred"
    }

    fn fetch_series(&self, series_id: &str) -> Result<RawSeries, AppError> {
        let start = self.observation_start.to_string();
        let limit = OBS_LIMIT.to_string();
        debug!(series_id, observation_start = %start, "requesting FRED observations");

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("observation_start", start.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("FRED request for {series_id} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("FRED request for {series_id} failed with status {}.", resp.status()),
            ));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse FRED response for {series_id}: {e}")))?;

        let series = parse_observations(series_id, body.observations)?;
        info!(series_id, observations = series.len(), "fetched FRED series");
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

fn parse_observations(series_id: &str, raw: Vec<FredObservation>) -> Result<RawSeries, AppError> {
    let mut out = Vec::with_capacity(raw.len());
    for obs in raw {
        let Some(value) = parse_value(&obs.value) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| AppError::new(4, format!("Invalid FRED date '{}': {e}", obs.date)))?;
        out.push(Observation::new(date, value));
    }
    Ok(RawSeries::new(series_id, out))
}

/// FRED marks missing readings with `"."`.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}
