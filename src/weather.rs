//! Weather lookup against the OpenWeather 5-day/3-hour forecast API.
//!
//! The provider returns a `list` of 3-hour entries; the first entry stands in
//! for current conditions (imperial units: °F, mph) and the morning/noon/
//! afternoon slots feed the forecast timeline. Everything downstream consumes
//! the parsed [`WeatherSnapshot`], so tests swap the HTTP client for canned
//! or failing lookups via the [`WeatherLookup`] trait.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// The three tracked forecast slots, as `(hour, display label)`.
const TIMELINE_SLOTS: [(u32, &str); 3] = [(9, "9:00 AM"), (12, "12:00 PM"), (15, "3:00 PM")];

#[derive(Debug, Clone, thiserror::Error)]
pub enum WeatherError {
    /// Network failure, HTTP error status, or timeout from the provider.
    #[error("weather provider unavailable: {0}")]
    Unavailable(String),
    /// The provider answered but the payload misses expected fields.
    #[error("weather payload malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastIcon {
    Sun,
    Cloud,
    Rain,
}

impl ForecastIcon {
    /// First matching substring wins; anything unrecognized is a cloud.
    pub fn for_condition(condition: &str) -> Self {
        if condition.contains("Clear") {
            ForecastIcon::Sun
        } else if condition.contains("Rain") {
            ForecastIcon::Rain
        } else {
            ForecastIcon::Cloud
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            ForecastIcon::Sun => "☀️",
            ForecastIcon::Cloud => "☁️",
            ForecastIcon::Rain => "🌧️",
        }
    }
}

/// One labeled timeline slot, e.g. `9:00 AM / Sun / 75`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub label: String,
    pub icon: ForecastIcon,
    pub temp_f: i32,
}

/// Current conditions plus the slot-filtered forecast timeline (0..=3 points).
/// Immutable once parsed from the provider payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub condition: String,
    pub temp_f: f64,
    pub wind_mph: f64,
    pub timeline: Vec<ForecastPoint>,
}

/// Boundary trait so handlers and tests don't care where weather comes from.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current_and_forecast(&self, lat: f64, lon: f64)
        -> Result<WeatherSnapshot, WeatherError>;
}

// ---------------------------------------------------------------------------
// Provider payload shapes (only the fields we read)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    #[serde(default)]
    dt_txt: Option<String>,
    #[serde(default)]
    main: Option<MainBlock>,
    #[serde(default)]
    weather: Vec<WeatherBlock>,
    #[serde(default)]
    wind: Option<WindBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherBlock {
    main: String,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

/// Parse a raw provider body into a snapshot. Fails `Malformed` when the
/// current-conditions entry is unusable; timeline entries are best-effort.
pub fn parse_forecast_payload(body: &str) -> Result<WeatherSnapshot, WeatherError> {
    let resp: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| WeatherError::Malformed(format!("undecodable forecast json: {e}")))?;

    let current = resp
        .list
        .first()
        .ok_or_else(|| WeatherError::Malformed("forecast list is empty".into()))?;

    let condition = current
        .weather
        .first()
        .map(|w| w.main.clone())
        .ok_or_else(|| WeatherError::Malformed("current entry has no weather block".into()))?;
    let temp_f = current
        .main
        .as_ref()
        .map(|m| m.temp)
        .ok_or_else(|| WeatherError::Malformed("current entry has no temperature".into()))?;
    let wind_mph = current
        .wind
        .as_ref()
        .map(|w| w.speed)
        .ok_or_else(|| WeatherError::Malformed("current entry has no wind speed".into()))?;

    Ok(WeatherSnapshot {
        condition,
        temp_f,
        wind_mph,
        timeline: slot_timeline(&resp.list),
    })
}

/// Keep entries landing exactly on the 09:00 / 12:00 / 15:00 slots, in
/// provider order, at most three. Entries with missing or unparseable
/// timestamps are skipped rather than failing the whole payload.
fn slot_timeline(entries: &[ForecastEntry]) -> Vec<ForecastPoint> {
    let mut timeline = Vec::new();
    for entry in entries {
        let Some(label) = entry.dt_txt.as_deref().and_then(slot_label) else {
            continue;
        };
        let (Some(main), Some(weather)) = (entry.main.as_ref(), entry.weather.first()) else {
            continue;
        };
        timeline.push(ForecastPoint {
            label: label.to_string(),
            icon: ForecastIcon::for_condition(&weather.main),
            // Provider temps are fractional; the timeline shows whole degrees.
            temp_f: main.temp as i32,
        });
        if timeline.len() >= TIMELINE_SLOTS.len() {
            break;
        }
    }
    timeline
}

fn slot_label(dt_txt: &str) -> Option<&'static str> {
    let dt = NaiveDateTime::parse_from_str(dt_txt, "%Y-%m-%d %H:%M:%S").ok()?;
    let t = dt.time();
    if t.minute() != 0 || t.second() != 0 {
        return None;
    }
    TIMELINE_SLOTS
        .iter()
        .find(|(hour, _)| *hour == t.hour())
        .map(|(_, label)| *label)
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Production lookup over HTTPS with a bounded request timeout so a dead
/// upstream cannot hang a scan.
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("commute-misery-scanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building weather HTTP client")?;
        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn current_and_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let t0 = Instant::now();
        let result = self
            .http
            .get(FORECAST_URL)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "imperial".to_string()),
            ])
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = ?e, "weather provider request failed");
                counter!("weather_fetch_errors_total").increment(1);
                let msg = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                return Err(WeatherError::Unavailable(msg));
            }
        };

        let resp = resp.error_for_status().map_err(|e| {
            counter!("weather_fetch_errors_total").increment(1);
            WeatherError::Unavailable(e.to_string())
        })?;

        let body = resp.text().await.map_err(|e| {
            counter!("weather_fetch_errors_total").increment(1);
            WeatherError::Unavailable(e.to_string())
        })?;

        histogram!("weather_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        parse_forecast_payload(&body)
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Lookup that always returns the given snapshot. Used by router-level tests.
pub struct CannedWeather(pub WeatherSnapshot);

#[async_trait]
impl WeatherLookup for CannedWeather {
    async fn current_and_forecast(
        &self,
        _lat: f64,
        _lon: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        Ok(self.0.clone())
    }
}

/// Lookup that always fails with the given error.
pub struct FailingWeather(pub WeatherError);

#[async_trait]
impl WeatherLookup for FailingWeather {
    async fn current_and_forecast(
        &self,
        _lat: f64,
        _lon: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        Err(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "list": [
            {
                "dt_txt": "2025-12-02 06:00:00",
                "main": { "temp": 64.2 },
                "weather": [ { "main": "Clouds" } ],
                "wind": { "speed": 12.5 }
            },
            {
                "dt_txt": "2025-12-02 09:00:00",
                "main": { "temp": 75.6 },
                "weather": [ { "main": "Clear" } ],
                "wind": { "speed": 10.0 }
            },
            {
                "dt_txt": "2025-12-02 12:00:00",
                "main": { "temp": 82.1 },
                "weather": [ { "main": "Rain" } ],
                "wind": { "speed": 14.0 }
            },
            {
                "dt_txt": "2025-12-02 15:00:00",
                "main": { "temp": 79.9 },
                "weather": [ { "main": "Clouds" } ],
                "wind": { "speed": 9.0 }
            },
            {
                "dt_txt": "2025-12-02 18:00:00",
                "main": { "temp": 70.0 },
                "weather": [ { "main": "Clear" } ],
                "wind": { "speed": 8.0 }
            }
        ]
    }"#;

    #[test]
    fn parses_current_conditions_from_first_entry() {
        let snap = parse_forecast_payload(FIXTURE).expect("fixture parses");
        assert_eq!(snap.condition, "Clouds");
        assert_eq!(snap.temp_f, 64.2);
        assert_eq!(snap.wind_mph, 12.5);
    }

    #[test]
    fn timeline_keeps_only_tracked_slots_in_order() {
        let snap = parse_forecast_payload(FIXTURE).expect("fixture parses");
        let labels: Vec<&str> = snap.timeline.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["9:00 AM", "12:00 PM", "3:00 PM"]);
        assert_eq!(snap.timeline[0].icon, ForecastIcon::Sun);
        assert_eq!(snap.timeline[1].icon, ForecastIcon::Rain);
        assert_eq!(snap.timeline[2].icon, ForecastIcon::Cloud);
        // Whole degrees on the timeline.
        assert_eq!(snap.timeline[0].temp_f, 75);
    }

    #[test]
    fn unparseable_timestamps_are_skipped_not_fatal() {
        let body = r#"{
            "list": [
                {
                    "dt_txt": "not a timestamp",
                    "main": { "temp": 60.0 },
                    "weather": [ { "main": "Clear" } ],
                    "wind": { "speed": 5.0 }
                },
                {
                    "dt_txt": "2025-12-02 12:00:00",
                    "main": { "temp": 61.0 },
                    "weather": [ { "main": "Clear" } ],
                    "wind": { "speed": 5.0 }
                }
            ]
        }"#;
        let snap = parse_forecast_payload(body).expect("parses despite bad dt_txt");
        assert_eq!(snap.timeline.len(), 1);
        assert_eq!(snap.timeline[0].label, "12:00 PM");
    }

    #[test]
    fn off_slot_minutes_do_not_match() {
        assert_eq!(slot_label("2025-12-02 09:30:00"), None);
        assert_eq!(slot_label("2025-12-02 09:00:00"), Some("9:00 AM"));
        assert_eq!(slot_label("2025-12-02 15:00:00"), Some("3:00 PM"));
        assert_eq!(slot_label("2025-12-02 21:00:00"), None);
    }

    #[test]
    fn empty_list_is_malformed() {
        let err = parse_forecast_payload(r#"{ "list": [] }"#).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let body = r#"{ "list": [ { "dt_txt": "2025-12-02 09:00:00" } ] }"#;
        let err = parse_forecast_payload(body).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[test]
    fn undecodable_json_is_malformed() {
        let err = parse_forecast_payload("{{nope").unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[test]
    fn icon_substring_precedence() {
        assert_eq!(ForecastIcon::for_condition("Clear"), ForecastIcon::Sun);
        assert_eq!(ForecastIcon::for_condition("Light Rain"), ForecastIcon::Rain);
        assert_eq!(ForecastIcon::for_condition("Snow"), ForecastIcon::Cloud);
        assert_eq!(ForecastIcon::for_condition("Thunderstorm"), ForecastIcon::Cloud);
    }
}
