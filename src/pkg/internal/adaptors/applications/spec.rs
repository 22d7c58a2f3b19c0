use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const APPLICATION_COLUMNS: &str = "id, job_id, candidate_name, candidate_email, bcq_access_token, \
     bcq_link_opened_at, bcq_started_at, bcq_completed_at, business_case_completed, \
     bcq_response_time_minutes, bcq_delayed, created_at, updated_at";

/// One candidate's submission to one job posting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationEntry {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    #[serde(skip_serializing)]
    pub bcq_access_token: Option<String>,
    pub bcq_link_opened_at: Option<DateTime<Utc>>,
    pub bcq_started_at: Option<DateTime<Utc>>,
    pub bcq_completed_at: Option<DateTime<Utc>>,
    pub business_case_completed: bool,
    pub bcq_response_time_minutes: Option<i32>,
    pub bcq_delayed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
