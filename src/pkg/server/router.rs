use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::{Router, routing::get};

use super::handlers::probes::{healthz, livez};
use super::handlers::{applications, business_case, functions};
use super::middlewares::authn;
use super::state::AppState;
use crate::{conf::settings, prelude::Result};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/functions/transcribe", post(functions::transcribe))
        .route("/functions/analyze", post(functions::analyze))
        .route("/applications/{id}/bcq-link", post(applications::issue_link))
        .route("/applications/{id}/responses", get(applications::list_responses))
        .route("/responses/{id}/transcribe", post(applications::backfill))
        .route("/responses/{id}/video", get(applications::video_url))
        .route("/jobs/{job_id}/business-cases", post(applications::create_question))
        .layer(from_fn_with_state(state.clone(), authn::authenticate))
        .route("/business-case/{job_id}/session", get(business_case::session))
        .route("/business-case/{job_id}/responses", post(business_case::submit))
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .layer(DefaultBodyLimit::max(settings.max_upload_bytes))
        .with_state(state)
}

pub async fn build_routes() -> Result<Router> {
    let state = AppState::new().await?;
    Ok(routes(state))
}
