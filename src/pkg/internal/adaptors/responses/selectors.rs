use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::responses::spec::{RESPONSE_COLUMNS, ResponseEntry};
use crate::prelude::Result;

pub struct ResponseSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ResponseSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ResponseSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<ResponseEntry>> {
        let row = sqlx::query_as::<_, ResponseEntry>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM business_case_responses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_application(&mut self, application_id: Uuid) -> Result<Vec<ResponseEntry>> {
        let rows = sqlx::query_as::<_, ResponseEntry>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM business_case_responses
             WHERE application_id = $1 ORDER BY created_at ASC"
        ))
        .bind(application_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }
}
