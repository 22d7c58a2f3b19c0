use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    pkg::{
        internal::business_case::{FollowupTask, MediaUpload, SessionSnapshot, SubmitReceipt, Submission},
        server::state::AppState,
    },
    prelude::{AppError, Result},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub application_id: Uuid,
    pub token: String,
}

pub async fn session(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SessionSnapshot>> {
    let snapshot = state
        .bcq
        .open_session(job_id, query.application_id, &query.token)
        .await?;
    Ok(Json(snapshot))
}

fn bad_field(name: &str, err: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("{}: {}", name, err))
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| AppError::BadRequest(format!("missing field {}", name)))
}

fn parse_id(name: &str, value: Option<String>) -> Result<Uuid> {
    Uuid::parse_str(&required(value, name)?).map_err(|e| bad_field(name, e))
}

fn log_followup(task: FollowupTask) {
    tokio::spawn(async move {
        let response_id = task.response_id;
        match task.wait().await {
            Ok(report) => tracing::info!(
                "follow-up for {} done: {} transcript chars, analysis {:?}",
                response_id,
                report.transcript_chars,
                report.analysis
            ),
            Err(err) => tracing::warn!("follow-up for {} failed: {}", response_id, &err),
        }
    });
}

/// Multipart answer upload: `applicationId`, `token`, `questionId`, `language`,
/// the `video` blob and an optional `audio` blob.
pub async fn submit(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SubmitReceipt>> {
    let mut application_id = None;
    let mut token = None;
    let mut question_id = None;
    let mut language = None;
    let mut video = None;
    let mut audio = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_field("multipart", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" | "audio" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or(if name == "video" { "video/webm" } else { "audio/webm" })
                    .to_string();
                let data: Bytes = field.bytes().await.map_err(|e| bad_field(&name, e))?;
                let upload = MediaUpload { mime_type, data };
                if name == "video" {
                    video = Some(upload);
                } else {
                    audio = Some(upload);
                }
            }
            "applicationId" | "token" | "questionId" | "language" => {
                let value = field.text().await.map_err(|e| bad_field(&name, e))?;
                match name.as_str() {
                    "applicationId" => application_id = Some(value),
                    "token" => token = Some(value),
                    "questionId" => question_id = Some(value),
                    _ => language = Some(value),
                }
            }
            other => tracing::debug!("ignoring multipart field {}", other),
        }
    }

    let submission = Submission {
        job_id,
        application_id: parse_id("applicationId", application_id)?,
        token: required(token, "token")?,
        question_id: parse_id("questionId", question_id)?,
        video: required(video, "video")?,
        audio,
        language: language.unwrap_or_else(|| "en".into()),
    };
    let outcome = state.bcq.submit_response(submission).await?;
    if let Some(task) = outcome.followup {
        log_followup(task);
    }
    Ok(Json(outcome.receipt))
}
