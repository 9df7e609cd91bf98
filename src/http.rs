//! HTTP endpoints using axum.
//!
//! Endpoints:
//! - GET  /lights_on        - switch the lights on
//! - GET  /lights_off       - switch the lights off, start the rearm countdown
//! - GET  /ruok             - liveness check
//! - GET  /status           - settings, lights, samples and rearm countdown
//! - POST /settings_update  - update `Lights`, `Armed` and `Light_Sensitivity`
//! - GET  /adjust           - update any setting by name
//! - GET  /                 - landing page
//!
//! Everything else gets a 404. All responses allow cross-origin access.

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::controller::{SettingsUpdate, SharedController, Status};
use crate::error::ApiError;
use crate::settings::Settings;

/// Build the axum router with all endpoints.
pub fn router(controller: SharedController) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/lights_on", get(lights_on))
        .route("/lights_off", get(lights_off))
        .route("/ruok", get(ruok))
        .route("/status", get(status))
        .route("/settings_update", post(settings_update))
        .route("/adjust", get(adjust))
        .fallback(catchall)
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, contenttype"),
        ))
        .with_state(controller)
}

// ── Request / Response types ────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct LightsResponse {
    #[serde(rename = "Lights")]
    pub lights: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdjustParams {
    /// Name of the setting
    pub param: String,
    /// New value, coerced to the setting's type
    pub value: String,
}

// ── Handlers ────────────────────────────────────────────────────────

async fn lights_on(State(controller): State<SharedController>) -> Json<LightsResponse> {
    let lights = controller.lock().await.force_on();
    Json(LightsResponse { lights })
}

async fn lights_off(State(controller): State<SharedController>) -> Json<LightsResponse> {
    let lights = controller.lock().await.force_off();
    Json(LightsResponse { lights })
}

async fn ruok(State(controller): State<SharedController>) -> Json<LightsResponse> {
    let lights = controller.lock().await.lights();
    Json(LightsResponse { lights })
}

async fn status(State(controller): State<SharedController>) -> Json<Status> {
    Json(controller.lock().await.status())
}

async fn settings_update(
    State(controller): State<SharedController>,
    Json(update): Json<SettingsUpdate>,
) -> Json<Settings> {
    Json(controller.lock().await.update(update))
}

async fn adjust(
    State(controller): State<SharedController>,
    Query(params): Query<AdjustParams>,
) -> Result<Json<Settings>, ApiError> {
    let settings = controller
        .lock()
        .await
        .set_parameter(&params.param, &params.value)?;
    Ok(Json(settings))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn catchall() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "You've found the server!")
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<meta charset="utf-8" />
<title>Light relay</title>
<h1>Light relay</h1>
<p>
  <a href="/status">Status</a> &middot;
  <a href="/lights_on">Lights on</a> &middot;
  <a href="/lights_off">Lights off</a>
</p>
</html>
"#;
