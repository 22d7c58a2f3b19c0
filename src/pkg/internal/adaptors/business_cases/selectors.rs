use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::business_cases::spec::BusinessCaseEntry;
use crate::prelude::Result;

pub struct BusinessCaseSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> BusinessCaseSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        BusinessCaseSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<BusinessCaseEntry>> {
        let row = sqlx::query_as::<_, BusinessCaseEntry>(
            "SELECT id, job_id, question_number, question_title, question_description,
                    video_url, enable_text_response, created_at
             FROM business_cases WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_by_job(&mut self, job_id: Uuid) -> Result<Vec<BusinessCaseEntry>> {
        let rows = sqlx::query_as::<_, BusinessCaseEntry>(
            "SELECT id, job_id, question_number, question_title, question_description,
                    video_url, enable_text_response, created_at
             FROM business_cases WHERE job_id = $1 ORDER BY question_number ASC",
        )
        .bind(job_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }
}
