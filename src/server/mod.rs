// SPDX-License-Identifier: MIT

//! HTTP service exposing the step-tree conversions
//!
//! Lets front-end route handlers delegate conversions instead of
//! reimplementing them:
//! - `POST /api/steps/nested` tree -> nested wire format
//! - `POST /api/steps/reconstruct` nested or legacy payload -> tree
//! - `POST /api/steps/llm` tree -> model plan

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::SunaError;
use crate::workflow::{
    convert_to_llm_format, convert_to_nested_json, detect_format, load_steps, Step, StepFormat,
};

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/steps/nested", post(to_nested))
        .route("/api/steps/reconstruct", post(reconstruct))
        .route("/api/steps/llm", post(to_llm))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(port: u16) -> Result<(), SunaError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct TreeRequest {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Deserialize)]
struct PayloadRequest {
    #[serde(default)]
    steps: Value,
}

async fn to_nested(Json(payload): Json<TreeRequest>) -> Json<Value> {
    Json(json!({ "steps": convert_to_nested_json(&payload.steps) }))
}

async fn to_llm(Json(payload): Json<TreeRequest>) -> Json<Value> {
    Json(json!({ "plan": convert_to_llm_format(&payload.steps) }))
}

async fn reconstruct(
    Json(payload): Json<PayloadRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let format = match detect_format(&payload.steps) {
        StepFormat::Nested => "nested",
        StepFormat::LegacyFlat => "legacy_flat",
    };

    match load_steps(&payload.steps) {
        Ok(steps) => Ok(Json(json!({ "format": format, "steps": steps }))),
        Err(e) => {
            log::warn!("Rejected steps payload: {}", e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}
