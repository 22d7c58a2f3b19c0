use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::business_cases::spec::{BusinessCaseEntry, CreateBusinessCase};
use crate::prelude::Result;

pub struct BusinessCaseMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> BusinessCaseMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        BusinessCaseMutator { pool }
    }

    pub async fn create(&mut self, job_id: Uuid, input: &CreateBusinessCase) -> Result<BusinessCaseEntry> {
        let row = sqlx::query_as::<_, BusinessCaseEntry>(
            r#"
            INSERT INTO business_cases (id, job_id, question_number, question_title, question_description, video_url, enable_text_response)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, job_id, question_number, question_title, question_description, video_url, enable_text_response, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job_id)
        .bind(input.question_number)
        .bind(&input.question_title)
        .bind(&input.question_description)
        .bind(&input.video_url)
        .bind(input.enable_text_response)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }
}
