use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessCaseEntry {
    pub id: Uuid,
    pub job_id: Uuid,
    pub question_number: i32,
    pub question_title: String,
    pub question_description: String,
    pub video_url: Option<String>,
    pub enable_text_response: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessCase {
    #[validate(range(min = 1, message = "question number starts at 1"))]
    pub question_number: i32,
    #[validate(length(min = 1, message = "Field cannot be empty"))]
    pub question_title: String,
    #[validate(length(min = 1, message = "Field cannot be empty"))]
    pub question_description: String,
    #[validate(url)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub enable_text_response: bool,
}
