// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod audio;
pub mod config;
pub mod cost;
pub mod map;
pub mod metrics;
pub mod report;
pub mod score;
pub mod weather;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, ApiError, AppState};
pub use crate::audio::{select_audio, AudioCatalog, AudioPick};
pub use crate::config::{AppConfig, CommuteConfig};
pub use crate::report::{ScanReport, Verdict};
pub use crate::score::{assess, MiseryAssessment, Tier};
pub use crate::weather::{WeatherLookup, WeatherSnapshot};
