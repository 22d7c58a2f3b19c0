use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobEntry {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
