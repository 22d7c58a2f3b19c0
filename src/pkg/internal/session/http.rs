use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use uuid::Uuid;

use super::controller::{AccessGrant, SessionBackend};
use crate::{
    pkg::internal::{
        business_case::{SessionSnapshot, SubmitReceipt},
        recorder::Take,
    },
    prelude::{AppError, Result},
};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Talks to the public business-case routes of a running server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    server: String,
}

fn rejection(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        StatusCode::FORBIDDEN => AppError::InvalidAccess,
        StatusCode::NOT_FOUND => AppError::NotFound("business case"),
        s if s.is_client_error() => AppError::BadRequest(message),
        _ => AppError::Upload(format!("{}: {}", status, message)),
    }
}

fn file_name(stem: &str, mime_type: &str) -> String {
    let subtype = mime_type.split(';').next().unwrap_or(mime_type);
    let extension = match subtype.rsplit('/').next().unwrap_or("webm") {
        "quicktime" => "mov",
        "x-wav" | "wave" => "wav",
        other => other,
    };
    format!("{}.{}", stem, extension)
}

async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(rejection(status, &body))
}

impl HttpBackend {
    pub fn new(server: &str) -> Self {
        HttpBackend {
            client: Client::new(),
            server: server.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SessionBackend for HttpBackend {
    async fn open(&self, grant: &AccessGrant) -> Result<SessionSnapshot> {
        let response = self
            .client
            .get(format!("{}/business-case/{}/session", self.server, grant.job_id))
            .query(&[
                ("applicationId", grant.application_id.to_string()),
                ("token", grant.token.clone()),
            ])
            .send()
            .await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn submit(&self, grant: &AccessGrant, question_id: Uuid, take: Take) -> Result<SubmitReceipt> {
        let video = Part::bytes(take.video.data.to_vec())
            .file_name(file_name("answer", &take.video.mime_type))
            .mime_str(&take.video.mime_type)?;
        let mut form = Form::new()
            .text("applicationId", grant.application_id.to_string())
            .text("token", grant.token.clone())
            .text("questionId", question_id.to_string())
            .text("language", take.language.clone())
            .part("video", video);
        if let Some(audio) = take.audio {
            let part = Part::bytes(audio.data.to_vec())
                .file_name(file_name("answer-audio", &audio.mime_type))
                .mime_str(&audio.mime_type)?;
            form = form.part("audio", part);
        }
        tracing::debug!("submitting answer to {}", question_id);
        let response = self
            .client
            .post(format!("{}/business-case/{}/responses", self.server, grant.job_id))
            .multipart(form)
            .send()
            .await?;
        Ok(checked(response).await?.json().await?)
    }
}
