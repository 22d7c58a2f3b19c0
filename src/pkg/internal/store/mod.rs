use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    pkg::{
        internal::{
            adaptors::{
                applications::{
                    mutators::ApplicationMutator, selectors::ApplicationSelector,
                    spec::ApplicationEntry,
                },
                business_cases::{
                    mutators::BusinessCaseMutator,
                    selectors::BusinessCaseSelector,
                    spec::{BusinessCaseEntry, CreateBusinessCase},
                },
                jobs::{selectors::JobSelector, spec::JobEntry},
                responses::{
                    mutators::ResponseMutator,
                    selectors::ResponseSelector,
                    spec::{AnalysisStatus, ResponseEntry, ResponseTake, ResponseUpsert, TranscriptionStatus},
                },
            },
            ai::spec::Scorecards,
            business_case::timing::Completion,
        },
        server::state::GetTxn,
    },
    prelude::{AppError, Result},
};

#[cfg(test)]
pub mod memory;

/// Row access the BCQ workflow needs. Conditional writes (`mark_*`, token issue and
/// every write addressed to a `ResponseTake`) report whether they changed anything.
#[async_trait::async_trait]
pub trait BcqStore: Send + Sync {
    async fn application(&self, id: Uuid) -> Result<Option<ApplicationEntry>>;
    async fn issue_access_token(&self, id: Uuid, token: &str) -> Result<String>;
    async fn mark_link_opened(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool>;
    async fn mark_started(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool>;
    async fn mark_completed(&self, id: Uuid, completion: &Completion) -> Result<()>;

    async fn job(&self, id: Uuid) -> Result<Option<JobEntry>>;
    async fn questions(&self, job_id: Uuid) -> Result<Vec<BusinessCaseEntry>>;
    async fn question(&self, id: Uuid) -> Result<Option<BusinessCaseEntry>>;
    async fn create_question(&self, job_id: Uuid, input: &CreateBusinessCase) -> Result<BusinessCaseEntry>;

    async fn responses(&self, application_id: Uuid) -> Result<Vec<ResponseEntry>>;
    async fn response(&self, id: Uuid) -> Result<Option<ResponseEntry>>;
    async fn upsert_response(&self, upsert: &ResponseUpsert) -> Result<ResponseEntry>;
    async fn set_transcript(&self, take: ResponseTake, text: &str) -> Result<bool>;
    async fn set_transcription_status(&self, take: ResponseTake, status: TranscriptionStatus) -> Result<bool>;
    async fn set_analysis_status(&self, take: ResponseTake, status: AnalysisStatus, error: Option<&str>) -> Result<bool>;
    async fn save_scorecards(&self, take: ResponseTake, cards: &Scorecards) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgStore { pool }
    }
}

#[async_trait::async_trait]
impl BcqStore for PgStore {
    async fn application(&self, id: Uuid) -> Result<Option<ApplicationEntry>> {
        let mut conn = self.pool.acquire().await?;
        ApplicationSelector::new(&mut conn).get_by_id(id).await
    }

    async fn issue_access_token(&self, id: Uuid, token: &str) -> Result<String> {
        let mut tx = self.pool.begin_txn().await?;
        let issued = ApplicationMutator::new(&mut tx).set_access_token(id, token).await?;
        let token = match issued {
            Some(token) => token,
            None => ApplicationSelector::new(&mut tx)
                .get_by_id(id)
                .await?
                .and_then(|app| app.bcq_access_token)
                .ok_or(AppError::NotFound("application"))?,
        };
        tx.commit().await?;
        Ok(token)
    }

    async fn mark_link_opened(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        ApplicationMutator::new(&mut conn).mark_link_opened(id, at).await
    }

    async fn mark_started(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        ApplicationMutator::new(&mut conn).mark_started(id, at).await
    }

    async fn mark_completed(&self, id: Uuid, completion: &Completion) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ApplicationMutator::new(&mut conn).mark_completed(id, completion).await
    }

    async fn job(&self, id: Uuid) -> Result<Option<JobEntry>> {
        let mut conn = self.pool.acquire().await?;
        JobSelector::new(&mut conn).get_by_id(id).await
    }

    async fn questions(&self, job_id: Uuid) -> Result<Vec<BusinessCaseEntry>> {
        let mut conn = self.pool.acquire().await?;
        BusinessCaseSelector::new(&mut conn).get_by_job(job_id).await
    }

    async fn question(&self, id: Uuid) -> Result<Option<BusinessCaseEntry>> {
        let mut conn = self.pool.acquire().await?;
        BusinessCaseSelector::new(&mut conn).get_by_id(id).await
    }

    async fn create_question(&self, job_id: Uuid, input: &CreateBusinessCase) -> Result<BusinessCaseEntry> {
        let mut tx = self.pool.begin_txn().await?;
        let question = BusinessCaseMutator::new(&mut tx).create(job_id, input).await?;
        tx.commit().await?;
        Ok(question)
    }

    async fn responses(&self, application_id: Uuid) -> Result<Vec<ResponseEntry>> {
        let mut conn = self.pool.acquire().await?;
        ResponseSelector::new(&mut conn).get_by_application(application_id).await
    }

    async fn response(&self, id: Uuid) -> Result<Option<ResponseEntry>> {
        let mut conn = self.pool.acquire().await?;
        ResponseSelector::new(&mut conn).get_by_id(id).await
    }

    async fn upsert_response(&self, upsert: &ResponseUpsert) -> Result<ResponseEntry> {
        let mut conn = self.pool.acquire().await?;
        ResponseMutator::new(&mut conn).upsert_video(upsert).await
    }

    async fn set_transcript(&self, take: ResponseTake, text: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        ResponseMutator::new(&mut conn).set_transcript(take, text).await
    }

    async fn set_transcription_status(&self, take: ResponseTake, status: TranscriptionStatus) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        ResponseMutator::new(&mut conn).set_transcription_status(take, status).await
    }

    async fn set_analysis_status(&self, take: ResponseTake, status: AnalysisStatus, error: Option<&str>) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        ResponseMutator::new(&mut conn).set_analysis_status(take, status, error).await
    }

    async fn save_scorecards(&self, take: ResponseTake, cards: &Scorecards) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        ResponseMutator::new(&mut conn).save_scorecards(take, cards).await
    }
}
