use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::applications::spec::{APPLICATION_COLUMNS, ApplicationEntry};
use crate::prelude::Result;

pub struct ApplicationSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicationSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicationSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<ApplicationEntry>> {
        let row = sqlx::query_as::<_, ApplicationEntry>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }
}
