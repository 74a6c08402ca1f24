//! HTTP API for the SOS coordination engine.
//!
//! The surface is a single `/sos` resource with verbs, preserved from the
//! dashboard and victim clients' existing contract:
//!
//! - **GET /sos**: full signal collection, newest first; `?type=danger-zones`
//!   selects the zone collection instead.
//! - **POST /sos**: submit an SOS signal, or a danger report when the body
//!   carries `"type": "danger-zone"`.
//! - **PATCH /sos**: status transition / team dispatch / audio attachment.
//! - **DELETE /sos**: remove a signal, or a zone with the discriminator.
//! - **GET /sos/proximity**: danger-zone proximity alert for a location.
//! - **GET /health**: liveness.
//!
//! Every mutation distinguishes three outcomes: success, not-found (404)
//! and bad input (400 from dispatch validation; 400/422 from the JSON
//! extractor for unparseable bodies). Nothing is silently coerced.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::dispatch::{self, DispatchError, Submission};
use crate::model::{DeleteRequest, SubmitRequest, UpdateRequest};
use crate::store::IncidentStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: IncidentStore,
}

/// Dispatch error carried to the wire.
///
/// Serializes as `{ "success": false, "error": "..." }` with 404 for lookup
/// misses and 400 for validation rejections.
#[derive(Debug)]
pub struct ApiError(DispatchError);

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::NOT_FOUND
        };
        let body = Json(json!({ "success": false, "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Build the application router for the given state.
///
/// Shared between `main` and the integration tests so both serve the exact
/// same surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/sos",
            get(list).post(submit).patch(update).delete(remove),
        )
        .route("/sos/proximity", get(proximity))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Query parameters for GET /sos.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `danger-zones` selects the zone collection.
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// GET /sos - list signals (newest first) or danger zones.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    if query.kind.as_deref() == Some("danger-zones") {
        let zones = state.store.list_danger_zones();
        return Json(json!({ "success": true, "data": zones }));
    }

    let signals = state.store.list_sos();
    Json(json!({ "success": true, "count": signals.len(), "data": signals }))
}

/// POST /sos - submit an SOS signal or a community danger report.
///
/// SOS responses carry `autoDangerZone` (whether a red-alert zone was
/// auto-created) and `broadcastCount` (recipients of the simulated alert).
#[instrument(skip(state, request))]
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<Value>, ApiError> {
    match dispatch::submit(&state.store, request) {
        Ok(Submission::Sos(intake)) => {
            info!(
                sos = %intake.sos.id,
                priority = ?intake.sos.priority,
                auto_danger_zone = intake.auto_danger_zone,
                "SOS signal recorded"
            );
            Ok(Json(json!({
                "success": true,
                "data": intake.sos,
                "autoDangerZone": intake.auto_danger_zone,
                "broadcastCount": intake.broadcast_count,
            })))
        }
        Ok(Submission::Zone(zone)) => {
            info!(zone = %zone.id, "danger zone recorded");
            Ok(Json(json!({ "success": true, "data": zone })))
        }
        Err(e) => {
            warn!(error = %e, "submission rejected");
            Err(e.into())
        }
    }
}

/// PATCH /sos - update a signal: status transition, team dispatch, audio.
#[instrument(skip(state, request))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = request.id.clone();
    match dispatch::update_sos(&state.store, request) {
        Ok(updated) => {
            info!(sos = %updated.id, status = ?updated.status, "SOS signal updated");
            Ok(Json(json!({ "success": true, "data": updated })))
        }
        Err(e) => {
            warn!(sos = %id, error = %e, "update rejected");
            Err(e.into())
        }
    }
}

/// DELETE /sos - remove a signal or a danger zone.
#[instrument(skip(state, request))]
pub async fn remove(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = request.id.clone();
    match dispatch::delete(&state.store, request) {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        Err(e) => {
            warn!(id = %id, error = %e, "delete rejected");
            Err(e.into())
        }
    }
}

/// Query parameters for GET /sos/proximity.
#[derive(Debug, Deserialize)]
pub struct ProximityQuery {
    lat: f64,
    lng: f64,
}

/// GET /sos/proximity - danger-zone proximity alert for a location.
///
/// `data` is the first zone whose alert circle covers the location, or
/// `null` when the location is clear. Victim clients poll this.
#[instrument(skip(state))]
pub async fn proximity(
    State(state): State<AppState>,
    Query(query): Query<ProximityQuery>,
) -> Json<Value> {
    let zone = dispatch::proximity_alert(&state.store, query.lat, query.lng);
    Json(json!({ "success": true, "data": zone }))
}

/// GET /health - simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
