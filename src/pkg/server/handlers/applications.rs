use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    pkg::{
        internal::{
            adaptors::{
                business_cases::spec::{BusinessCaseEntry, CreateBusinessCase},
                responses::spec::ResponseEntry,
            },
            business_case::{FollowupReport, IssuedLink, PLAYBACK_URL_TTL},
        },
        server::state::AppState,
    },
    prelude::{AppError, Result},
};

pub async fn issue_link(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<IssuedLink>> {
    Ok(Json(state.bcq.issue_link(id).await?))
}

pub async fn list_responses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ResponseEntry>>> {
    Ok(Json(state.bcq.responses(id).await?))
}

#[derive(Deserialize)]
pub struct BackfillQuery {
    pub language: Option<String>,
}

pub async fn backfill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<BackfillQuery>,
) -> Result<Json<FollowupReport>> {
    let language = query.language.unwrap_or_else(|| "en".into());
    Ok(Json(state.bcq.backfill_transcript(id, &language).await?))
}

pub async fn video_url(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Value>> {
    let url = state.bcq.playback_url(id).await?;
    Ok(Json(json!({
        "url": url,
        "expiresIn": PLAYBACK_URL_TTL.as_secs(),
    })))
}

pub async fn create_question(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(input): Json<CreateBusinessCase>,
) -> Result<Json<BusinessCaseEntry>> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(state.bcq.create_question(job_id, &input).await?))
}
