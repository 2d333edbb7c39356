use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::fusion::FusionWeights;
use crate::geo::Coordinate;
use crate::inference::{ClassProbabilities, ImageTensor, InferenceError};
use crate::location::{nearest_with_cutoff, BoundingBox, Catalog};
use crate::outcome::{locate, OutcomeRecord};

use super::state::AppState;

const INVALID_COORDS: &str = "Invalid coordinates. Lat: -90..90, Lng: -180..180";

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "campus-locator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/predict": "POST multipart: image, gps_lat, gps_lng, gps_weight, ai_weight",
            "/predict-gps": "POST JSON: {latitude, longitude}",
            "/locations": "GET campus landmarks",
            "/health": "GET service status",
        }
    }))
}

// ─── POST /predict ───────────────────────────────────────────────

#[derive(Debug, Default)]
struct PredictForm {
    image: Option<Bytes>,
    gps_lat: Option<f64>,
    gps_lng: Option<f64>,
    gps_weight: Option<u32>,
    ai_weight: Option<u32>,
}

async fn read_predict_form(multipart: &mut Multipart) -> Result<PredictForm, ApiError> {
    let mut form = PredictForm::default();
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        api_error(StatusCode::BAD_REQUEST, format!("Malformed form data: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let bytes = field.bytes().await.map_err(bad_form)?;
                if !bytes.is_empty() {
                    form.image = Some(bytes);
                }
            }
            "gps_lat" => form.gps_lat = parse_field(&name, &field.text().await.map_err(bad_form)?)?,
            "gps_lng" => form.gps_lng = parse_field(&name, &field.text().await.map_err(bad_form)?)?,
            "gps_weight" => form.gps_weight = parse_field(&name, &field.text().await.map_err(bad_form)?)?,
            "ai_weight" => form.ai_weight = parse_field(&name, &field.text().await.map_err(bad_form)?)?,
            _ => {}
        }
    }
    Ok(form)
}

/// Blank means absent; anything else must parse.
fn parse_field<T: FromStr>(name: &str, raw: &str) -> Result<Option<T>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid value for '{}': '{}'", name, raw),
        )
    })
}

/// A GPS fix needs both halves; one alone is ignored.
fn resolve_point(lat: Option<f64>, lng: Option<f64>) -> Result<Option<Coordinate>, ApiError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Coordinate::checked(lat, lng)
            .map(Some)
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, INVALID_COORDS)),
        _ => Ok(None),
    }
}

async fn classify_upload(state: &AppState, bytes: Bytes) -> Result<Option<ClassProbabilities>, ApiError> {
    let Some(classifier) = state.classifier.clone() else {
        warn!("image supplied but no visual classifier is configured, ignoring it");
        return Ok(None);
    };

    let probs = tokio::task::spawn_blocking(move || {
        let tensor = ImageTensor::decode(&bytes)?;
        Ok::<_, InferenceError>(classifier.classify(&tensor))
    })
    .await
    .map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Classification task failed: {}", e),
        )
    })?
    .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Cannot read image: {}", e)))?;

    Ok(Some(probs))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<OutcomeRecord>, ApiError> {
    let start = Instant::now();

    let form = read_predict_form(&mut multipart).await?;
    let point = resolve_point(form.gps_lat, form.gps_lng)?;

    let defaults = state.settings.fusion.weights();
    let weights = FusionWeights::new(
        form.gps_weight.unwrap_or(defaults.gps),
        form.ai_weight.unwrap_or(defaults.ai),
    );

    let ai = match form.image {
        Some(bytes) => classify_upload(&state, bytes).await?,
        None => None,
    };
    let gps = point.map(|p| nearest_with_cutoff(p, &state.catalog, state.settings.fusion.max_distance_m));

    let outcome = locate(ai.as_ref(), gps.as_ref(), weights)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    info!(
        method = %outcome.method(),
        location = outcome.predicted_class(),
        confidence = outcome.confidence(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "POST /predict"
    );

    Ok(Json(outcome))
}

// ─── POST /predict-gps ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct GpsRequest {
    pub latitude: f64,
    pub longitude: f64,
}

pub async fn predict_gps(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GpsRequest>, JsonRejection>,
) -> Result<Json<OutcomeRecord>, ApiError> {
    let Json(req) = payload.map_err(|_| api_error(StatusCode::BAD_REQUEST, "GPS coordinates required"))?;
    let point = Coordinate::checked(req.latitude, req.longitude)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, INVALID_COORDS))?;

    let gps = nearest_with_cutoff(point, &state.catalog, state.settings.fusion.max_distance_m);
    if gps.is_degenerate() {
        return Err(api_error(StatusCode::NOT_FOUND, "No nearby campus location found"));
    }

    let outcome = locate(None, Some(&gps), state.settings.fusion.weights())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    info!(
        location = outcome.predicted_class(),
        distance_m = gps.distance_m,
        "POST /predict-gps"
    );

    Ok(Json(outcome))
}

// ─── GET /locations ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct LocationsResponse {
    pub status: &'static str,
    pub locations: Catalog,
    pub count: usize,
    pub bounds: Option<BoundingBox>,
}

pub async fn locations(State(state): State<Arc<AppState>>) -> Json<LocationsResponse> {
    Json(LocationsResponse {
        status: "success",
        locations: state.catalog.clone(),
        count: state.catalog.len(),
        bounds: state.catalog.bounds(),
    })
}

// ─── GET /health ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_type: String,
    pub model_id: Option<String>,
    pub locations_count: usize,
    pub started_at: DateTime<Utc>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let classifier = state.classifier.as_deref();
    Json(HealthResponse {
        status: "healthy",
        model_loaded: classifier.is_some(),
        model_type: classifier.map_or("none", |c| c.backend()).to_string(),
        model_id: classifier.and_then(|c| c.model_id()).map(str::to_string),
        locations_count: state.catalog.len(),
        started_at: state.started_at,
    })
}
