use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TranscribeOps;
use crate::{
    pkg::internal::{
        adaptors::responses::spec::{ResponseTake, TranscriptionStatus},
        store::BcqStore,
    },
    prelude::{AppError, Result},
};

/// Largest decoded audio payload the transcription function accepts.
pub const MAX_TRANSCRIPTION_BYTES: usize = 20 * 1024 * 1024;

fn default_mime() -> String {
    "audio/webm".into()
}

fn default_language() -> String {
    "en".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRequest {
    pub audio: String,
    #[serde(default = "default_mime")]
    pub mime_type: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub response_id: Option<Uuid>,
    /// Pins the write-back to one recording. Without it the recording current
    /// when transcription starts is used.
    #[serde(default)]
    pub take_id: Option<Uuid>,
}

impl TranscriptionRequest {
    pub fn new(audio: &[u8], mime_type: &str, language: &str, take: Option<ResponseTake>) -> Self {
        TranscriptionRequest {
            audio: STANDARD.encode(audio),
            mime_type: mime_type.into(),
            language: language.into(),
            response_id: take.map(|t| t.id),
            take_id: take.map(|t| t.take_id),
        }
    }

    /// The base64 body without any `data:<mime>;base64,` prefix.
    fn payload(&self) -> &str {
        match self.audio.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => self.audio.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
    /// Whether the transcript landed on the response row.
    #[serde(default)]
    pub stored: bool,
}

#[derive(Clone)]
pub struct TranscriptionFunction {
    model: Arc<dyn TranscribeOps>,
    store: Arc<dyn BcqStore>,
    max_bytes: usize,
}

impl TranscriptionFunction {
    pub fn new(model: Arc<dyn TranscribeOps>, store: Arc<dyn BcqStore>) -> Self {
        TranscriptionFunction {
            model,
            store,
            max_bytes: MAX_TRANSCRIPTION_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub async fn run(&self, request: &TranscriptionRequest) -> Result<TranscriptionResponse> {
        let take = self.target(request).await;
        let transcription = match self.transcribe(request).await {
            Ok(text) => text,
            Err(err) => {
                if let Some(take) = take {
                    match self
                        .store
                        .set_transcription_status(take, TranscriptionStatus::Failed)
                        .await
                    {
                        Ok(true) => {}
                        Ok(false) => tracing::debug!("response {} was re-recorded, not marking it failed", take.id),
                        Err(e) => tracing::error!("could not record failed transcription for {}: {}", take.id, &e),
                    }
                }
                return Err(err);
            }
        };
        let stored = match take {
            Some(take) => self.write_back(take, &transcription).await,
            None => false,
        };
        Ok(TranscriptionResponse { transcription, stored })
    }

    async fn target(&self, request: &TranscriptionRequest) -> Option<ResponseTake> {
        let id = request.response_id?;
        if let Some(take_id) = request.take_id {
            return Some(ResponseTake { id, take_id });
        }
        match self.store.response(id).await {
            Ok(Some(row)) => Some(row.take()),
            Ok(None) => {
                tracing::warn!("response {} not found, transcript will not be stored", id);
                None
            }
            Err(e) => {
                tracing::error!("could not load response {}: {}", id, &e);
                None
            }
        }
    }

    async fn write_back(&self, take: ResponseTake, transcription: &str) -> bool {
        match self.store.set_transcript(take, transcription).await {
            Ok(true) => {
                tracing::debug!("transcript stored for response {}", take.id);
                true
            }
            Ok(false) => {
                tracing::warn!("response {} was re-recorded, dropping stale transcript", take.id);
                false
            }
            Err(e) => {
                tracing::error!("failed to persist transcript for {}: {}", take.id, &e);
                false
            }
        }
    }

    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<String> {
        let payload = request.payload().trim();
        let decoded = STANDARD.decode(payload)?;
        if decoded.len() > self.max_bytes {
            tracing::warn!(
                "rejecting {} byte audio payload, limit is {}",
                decoded.len(),
                self.max_bytes
            );
            return Err(AppError::PayloadTooLarge {
                size: decoded.len(),
                max: self.max_bytes,
            });
        }
        if decoded.is_empty() {
            return Err(AppError::BadRequest("audio payload is empty".into()));
        }
        tracing::info!(
            "transcribing {} bytes of {} in '{}'",
            decoded.len(),
            &request.mime_type,
            &request.language
        );
        self.model
            .transcribe(payload, &request.mime_type, &request.language)
            .await
    }
}
