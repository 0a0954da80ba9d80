//! # Misery Scoring Engine
//! Pure, testable logic that maps `(weather, incident count)` → `MiseryAssessment`.
//! No I/O, suitable for unit tests and offline evaluation.
//!
//! Each rule is evaluated independently; every rule that holds adds its fixed
//! increment and appends one human-readable reason. Evaluation order fixes
//! reason order. Rules are not mutually exclusive and no upper bound is
//! enforced on the accumulated score.

use serde::{Deserialize, Serialize};

use crate::weather::WeatherSnapshot;

/// Outcome of the rule pass: accumulated score plus one reason per fired rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiseryAssessment {
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Shared threshold ladder for score-derived decisions.
///
/// The gas-cost penalty and the audio category use the same `>=` ladder, so
/// both consume this single classification instead of carrying private
/// copies that could drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Chill,
    Medium,
    Rage,
}

impl Tier {
    /// `>= 20` → Rage, `>= 10` → Medium, else Chill. Descending checks,
    /// first match wins.
    pub fn from_score(score: u32) -> Self {
        if score >= 20 {
            Tier::Rage
        } else if score >= 10 {
            Tier::Medium
        } else {
            Tier::Chill
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Chill => "Chill",
            Tier::Medium => "Medium",
            Tier::Rage => "Rage",
        }
    }
}

/// Score a commute from current weather and the number of reported incidents.
///
/// Rule order (fixes reason order):
/// 1. wind above 20 mph        → +10 "High Wind"
/// 2. condition contains "Rain" → +10 "Rain" (case-sensitive, provider vocabulary)
/// 3. temperature above 90 °F   → +10 "Heat"
/// 4. more than 5 incidents     → +20 "Traffic (<n> accidents)"
pub fn assess(weather: &WeatherSnapshot, incident_count: usize) -> MiseryAssessment {
    let mut score = 0u32;
    let mut reasons = Vec::new();

    if weather.wind_mph > 20.0 {
        score += 10;
        reasons.push("High Wind".to_string());
    }
    if weather.condition.contains("Rain") {
        score += 10;
        reasons.push("Rain".to_string());
    }
    if weather.temp_f > 90.0 {
        score += 10;
        reasons.push("Heat".to_string());
    }
    if incident_count > 5 {
        score += 20;
        reasons.push(format!("Traffic ({incident_count} accidents)"));
    }

    MiseryAssessment { score, reasons }
}
