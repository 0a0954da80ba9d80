use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use tower_http::cors::CorsLayer;

use crate::audio::{select_audio, AudioCatalog};
use crate::config::AppConfig;
use crate::cost::estimate_gas_cost;
use crate::map;
use crate::report::{assemble, ScanReport};
use crate::score::assess;
use crate::weather::{WeatherError, WeatherLookup};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<AudioCatalog>,
    pub weather: Arc<dyn WeatherLookup>,
}

impl AppState {
    /// Build shared state, checking the catalog invariant up front so a
    /// misconfigured crate fails at boot instead of mid-request.
    pub fn new(config: AppConfig, weather: Arc<dyn WeatherLookup>) -> anyhow::Result<Self> {
        let catalog = AudioCatalog::builtin().clone();
        catalog.validate()?;
        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            weather,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/scan", post(scan))
        .route("/draw_map", post(draw_map))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Request-boundary error. Every handler failure serializes as
/// `{"error": "..."}`; invalid input is the caller's fault (400), everything
/// else is a server-side 500. No partial results leave a handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("weather provider unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("weather payload malformed: {0}")]
    UpstreamMalformed(String),
    #[error("invalid request body: {0}")]
    InvalidInput(String),
    #[error("map rendering failed: {0}")]
    RenderFailure(String),
}

impl From<WeatherError> for ApiError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Unavailable(m) => ApiError::UpstreamUnavailable(m),
            WeatherError::Malformed(m) => ApiError::UpstreamMalformed(m),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        counter!("api_errors_total").increment(1);
        tracing::warn!(error = %self, "request failed");
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub incidents: Vec<Incident>,
}

/// One reported incident. Only the count matters for scoring; the cleaned
/// coordinates matter for map rendering. Coordinates arrive as JSON numbers
/// or numeric strings depending on the reporting feed, so they are kept raw
/// and parsed leniently: an unusable pair drops the marker, never the
/// request.
#[derive(Debug, serde::Deserialize)]
pub struct Incident {
    #[serde(default)]
    pub clean_latitude: Option<serde_json::Value>,
    #[serde(default)]
    pub clean_longitude: Option<serde_json::Value>,
}

impl Incident {
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((
            coordinate(self.clean_latitude.as_ref())?,
            coordinate(self.clean_longitude.as_ref())?,
        ))
    }
}

fn coordinate(raw: Option<&serde_json::Value>) -> Option<f64> {
    let raw = raw?;
    if let Some(n) = raw.as_f64() {
        return Some(n);
    }
    raw.as_str()?.trim().parse().ok()
}

async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanReport>, ApiError> {
    counter!("scan_requests_total").increment(1);
    let Json(req) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let incident_count = req.incidents.len();

    let weather = state
        .weather
        .current_and_forecast(state.config.origin_lat, state.config.origin_lon)
        .await?;

    let misery = assess(&weather, incident_count);
    let gas_cost = estimate_gas_cost(misery.score, &state.config.commute);
    let pick = select_audio(&state.catalog, misery.score, &mut rand::rng()).clone();

    let report = assemble(&weather, misery, gas_cost, &pick);
    tracing::info!(
        score = report.misery_score,
        verdict = ?report.verdict,
        incidents = incident_count,
        "scan complete"
    );
    Ok(Json(report))
}

async fn draw_map(
    State(_state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    counter!("map_requests_total").increment(1);
    let Json(req) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;

    let positions: Vec<(f64, f64)> = req.incidents.iter().filter_map(Incident::position).collect();
    let png = map::render_incident_map(&positions)
        .map_err(|e| ApiError::RenderFailure(e.to_string()))?;

    tracing::info!(
        incidents = req.incidents.len(),
        markers = positions.len(),
        "incident map rendered"
    );
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
