use sqlx::PgConnection;
use uuid::Uuid;

use crate::{pkg::internal::adaptors::jobs::spec::JobEntry, prelude::Result};

pub struct JobSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> JobSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        JobSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<JobEntry>> {
        let row = sqlx::query_as::<_, JobEntry>(
            "SELECT id, title, department, description, created_at
             FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;

        Ok(row)
    }
}
