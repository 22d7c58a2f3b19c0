use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::business_case::timing::Completion;
use crate::prelude::Result;

pub struct ApplicationMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicationMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicationMutator { pool }
    }

    /// Stores the token only when none has been issued yet. Returns `None` if the
    /// application already carries a token (or does not exist).
    pub async fn set_access_token(&mut self, id: Uuid, token: &str) -> Result<Option<String>> {
        let stored = sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE applications
            SET bcq_access_token = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND bcq_access_token IS NULL
            RETURNING bcq_access_token
            "#,
        )
        .bind(id)
        .bind(token)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(stored.flatten())
    }

    pub async fn mark_link_opened(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET bcq_link_opened_at = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND bcq_link_opened_at IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_started(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET bcq_started_at = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND bcq_started_at IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_completed(&mut self, id: Uuid, completion: &Completion) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE applications
            SET business_case_completed = TRUE,
                bcq_completed_at = $2,
                bcq_response_time_minutes = $3,
                bcq_delayed = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(completion.completed_at)
        .bind(completion.response_time_minutes)
        .bind(completion.delayed)
        .execute(&mut *self.pool)
        .await?;
        Ok(())
    }
}
