//! Response assembly: verdict derivation, forecast display string, and the
//! `/scan` payload shape.

use serde::{Deserialize, Serialize};

use crate::audio::AudioPick;
use crate::score::MiseryAssessment;
use crate::weather::{ForecastPoint, WeatherSnapshot};

const TIMELINE_SEPARATOR: &str = " | ";

/// Qualitative commute verdict.
///
/// The ladder is strict-greater on both checks, evaluated low to high, last
/// satisfied wins: a score of exactly 20 is still merely Annoying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Smooth,
    Annoying,
    Doomed,
}

impl Verdict {
    pub fn for_score(score: u32) -> Self {
        let mut verdict = Verdict::Smooth;
        if score > 10 {
            verdict = Verdict::Annoying;
        }
        if score > 20 {
            verdict = Verdict::Doomed;
        }
        verdict
    }
}

/// Full `/scan` response body. Built fresh per request; nothing here is
/// shared across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub service: String,
    pub verdict: Verdict,
    pub misery_score: u32,
    pub reasons: Vec<String>,
    pub current_weather: String,
    pub current_temp_f: f64,
    pub wind_mph: f64,
    pub future_forecast: String,
    /// Dollar-prefixed, two decimals, e.g. `"$18.47"`.
    pub gas_cost: String,
    pub audio_title: String,
    pub audio_link: String,
}

/// Join the (already slot-filtered) timeline into one display string:
/// `"9:00 AM: ☀️ 75°F | 12:00 PM: 🌧️ 82°F"`. Empty timeline → empty string.
pub fn format_timeline(timeline: &[ForecastPoint]) -> String {
    timeline
        .iter()
        .map(|p| format!("{}: {} {}°F", p.label, p.icon.glyph(), p.temp_f))
        .collect::<Vec<_>>()
        .join(TIMELINE_SEPARATOR)
}

pub fn assemble(
    weather: &WeatherSnapshot,
    misery: MiseryAssessment,
    gas_cost: f64,
    audio: &AudioPick,
) -> ScanReport {
    ScanReport {
        service: format!("commute-misery-scanner v{}", env!("CARGO_PKG_VERSION")),
        verdict: Verdict::for_score(misery.score),
        misery_score: misery.score,
        reasons: misery.reasons,
        current_weather: weather.condition.clone(),
        current_temp_f: weather.temp_f,
        wind_mph: weather.wind_mph,
        future_forecast: format_timeline(&weather.timeline),
        gas_cost: format!("${gas_cost:.2}"),
        audio_title: audio.title.clone(),
        audio_link: audio.link.clone(),
    }
}
