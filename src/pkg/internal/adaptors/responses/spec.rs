use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

pub const RESPONSE_COLUMNS: &str = "id, application_id, business_case_id, video_url, take_id, text_response, \
     completed_at, transcription_status, \
     fluency_pronunciation_score, fluency_pace_score, fluency_hesitation_score, \
     fluency_grammar_score, fluency_overall_score, fluency_notes, \
     content_quality_score, content_strengths, content_areas_to_probe, content_summary, \
     content_analysis_status, content_analysis_error, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "analysis_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "transcription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    Pending,
    Completed,
    Failed,
    /// No separate audio track was captured (file upload).
    Skipped,
}

/// One answer per (application, question) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResponseEntry {
    pub id: Uuid,
    pub application_id: Uuid,
    pub business_case_id: Uuid,
    pub video_url: Option<String>,
    /// Changes on every upload, so background writes can tell which recording
    /// they belong to.
    pub take_id: Uuid,
    pub text_response: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub transcription_status: TranscriptionStatus,
    pub fluency_pronunciation_score: Option<i32>,
    pub fluency_pace_score: Option<i32>,
    pub fluency_hesitation_score: Option<i32>,
    pub fluency_grammar_score: Option<i32>,
    pub fluency_overall_score: Option<i32>,
    pub fluency_notes: Option<String>,
    pub content_quality_score: Option<i32>,
    pub content_strengths: Option<Vec<String>>,
    pub content_areas_to_probe: Option<Vec<String>>,
    pub content_summary: Option<String>,
    pub content_analysis_status: AnalysisStatus,
    pub content_analysis_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResponseEntry {
    pub fn is_answered(&self) -> bool {
        self.video_url.is_some()
    }

    pub fn take(&self) -> ResponseTake {
        ResponseTake {
            id: self.id,
            take_id: self.take_id,
        }
    }
}

/// A response row as it was for one particular upload. Writes addressed to a take
/// are dropped once the row has moved on to a newer recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTake {
    pub id: Uuid,
    pub take_id: Uuid,
}

pub struct ResponseUpsert {
    pub application_id: Uuid,
    pub business_case_id: Uuid,
    pub video_url: String,
    pub completed_at: DateTime<Utc>,
    pub transcription_status: TranscriptionStatus,
}
