use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    ScoreOps,
    spec::{QuestionPrompt, Scorecards},
};
use crate::{
    pkg::internal::{
        adaptors::responses::spec::{AnalysisStatus, ResponseEntry, ResponseTake},
        store::BcqStore,
    },
    prelude::{AppError, Result},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub response_id: Uuid,
    /// Only score this recording; a newer upload makes the request stale.
    #[serde(default)]
    pub take_id: Option<Uuid>,
}

impl From<ResponseTake> for AnalysisRequest {
    fn from(take: ResponseTake) -> Self {
        AnalysisRequest {
            response_id: take.id,
            take_id: Some(take.take_id),
        }
    }
}

#[derive(Clone)]
pub struct AnalysisFunction {
    model: Arc<dyn ScoreOps>,
    store: Arc<dyn BcqStore>,
}

impl AnalysisFunction {
    pub fn new(model: Arc<dyn ScoreOps>, store: Arc<dyn BcqStore>) -> Self {
        AnalysisFunction { model, store }
    }

    async fn mark_failed(&self, take: ResponseTake, err: &AppError) {
        let message = err.to_string();
        if let Err(e) = self
            .store
            .set_analysis_status(take, AnalysisStatus::Failed, Some(&message))
            .await
        {
            tracing::error!("could not mark analysis of {} as failed: {}", take.id, &e);
        }
    }

    /// Scores the stored transcript of one response. Only the scorecard and status
    /// columns are written; the video and transcript are left alone.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<Scorecards> {
        let response = self
            .store
            .response(request.response_id)
            .await?
            .ok_or(AppError::NotFound("response"))?;
        let take = response.take();
        if request.take_id.is_some_and(|id| id != take.take_id) {
            tracing::warn!("response {} was re-recorded, skipping analysis", take.id);
            return Err(AppError::Superseded);
        }

        match self.score(take, &response).await {
            Ok(cards) => {
                tracing::info!(
                    "response {} scored: content {} fluency {}",
                    take.id,
                    cards.content.quality_score,
                    cards.fluency.overall
                );
                Ok(cards)
            }
            Err(AppError::Superseded) => {
                tracing::warn!("response {} was re-recorded during analysis", take.id);
                Err(AppError::Superseded)
            }
            Err(err) => {
                tracing::error!("analysis of {} failed: {}", take.id, &err);
                self.mark_failed(take, &err).await;
                Err(err)
            }
        }
    }

    async fn score(&self, take: ResponseTake, response: &ResponseEntry) -> Result<Scorecards> {
        let transcript = match response.text_response.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => return Err(AppError::MissingTranscript),
        };
        let question = self
            .store
            .question(response.business_case_id)
            .await?
            .ok_or(AppError::NotFound("business case"))?;
        if !self
            .store
            .set_analysis_status(take, AnalysisStatus::Analyzing, None)
            .await?
        {
            return Err(AppError::Superseded);
        }
        let prompt = QuestionPrompt {
            title: question.question_title,
            description: question.question_description,
        };
        let cards = self.model.score(&prompt, transcript).await?.clamped();
        if !self.store.save_scorecards(take, &cards).await? {
            return Err(AppError::Superseded);
        }
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::internal::{
        adaptors::responses::spec::{ResponseUpsert, TranscriptionStatus},
        ai::fakes::ScriptedScorer,
        store::memory::MemoryStore,
    };

    async fn seeded_for(store: &MemoryStore, question_id: Option<Uuid>, transcript: Option<&str>) -> Result<Uuid> {
        let job = store.add_job("Analyst");
        let app = store.add_application(job.id, Some("t"));
        let q = store.add_questions(job.id, 1).remove(0);
        let row = store
            .upsert_response(&ResponseUpsert {
                application_id: app.id,
                business_case_id: question_id.unwrap_or(q.id),
                video_url: "http://videos/a".into(),
                completed_at: Utc::now(),
                transcription_status: TranscriptionStatus::Pending,
            })
            .await?;
        if let Some(text) = transcript {
            store.set_transcript(row.take(), text).await?;
        }
        Ok(row.id)
    }

    async fn seeded(store: &MemoryStore, transcript: Option<&str>) -> Result<Uuid> {
        seeded_for(store, None, transcript).await
    }

    fn request(id: Uuid) -> AnalysisRequest {
        AnalysisRequest {
            response_id: id,
            take_id: None,
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_scores_are_clamped_and_saved() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let id = seeded(&store, Some("we should enter the market")).await?;
        let f = AnalysisFunction::new(Arc::new(ScriptedScorer::scoring(140)), store.clone());

        let cards = f.run(&request(id)).await?;
        assert_eq!(cards.content.quality_score, 100);
        let row = store.response(id).await?.unwrap();
        assert_eq!(row.content_analysis_status, AnalysisStatus::Completed);
        assert_eq!(row.content_quality_score, Some(100));
        assert_eq!(row.fluency_pronunciation_score, Some(80));
        assert_eq!(row.fluency_pace_score, Some(75));
        assert_eq!(row.text_response.as_deref(), Some("we should enter the market"));
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_missing_transcript_fails_fast() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let id = seeded(&store, None).await?;
        let f = AnalysisFunction::new(Arc::new(ScriptedScorer::scoring(50)), store.clone());

        assert!(matches!(f.run(&request(id)).await, Err(AppError::MissingTranscript)));
        let row = store.response(id).await?.unwrap();
        assert_eq!(row.content_analysis_status, AnalysisStatus::Failed);
        assert!(row.content_quality_score.is_none());
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_model_failure_keeps_video_and_transcript() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let id = seeded(&store, Some("answer")).await?;
        let f = AnalysisFunction::new(
            Arc::new(ScriptedScorer::failing(AppError::QuotaExhausted)),
            store.clone(),
        );

        assert!(matches!(f.run(&request(id)).await, Err(AppError::QuotaExhausted)));
        let row = store.response(id).await?.unwrap();
        assert_eq!(row.content_analysis_status, AnalysisStatus::Failed);
        assert_eq!(
            row.content_analysis_error.as_deref(),
            Some("AI credits exhausted, please contact support")
        );
        assert_eq!(row.video_url.as_deref(), Some("http://videos/a"));
        assert_eq!(row.text_response.as_deref(), Some("answer"));
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_missing_question_marks_failed() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let id = seeded_for(&store, Some(Uuid::new_v4()), Some("an answer")).await?;
        let f = AnalysisFunction::new(Arc::new(ScriptedScorer::scoring(50)), store.clone());

        assert!(matches!(f.run(&request(id)).await, Err(AppError::NotFound("business case"))));
        let row = store.response(id).await?.unwrap();
        assert_eq!(row.content_analysis_status, AnalysisStatus::Failed);
        assert_eq!(row.content_analysis_error.as_deref(), Some("business case not found"));
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_store_failure_is_reported_not_left_pending() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let id = seeded(&store, Some("an answer")).await?;
        store.fail_writes(true);
        let f = AnalysisFunction::new(Arc::new(ScriptedScorer::scoring(50)), store.clone());

        assert!(matches!(f.run(&request(id)).await, Err(AppError::Io(_))));
        assert!(logs_contain("analysis of"));
        assert!(logs_contain("could not mark analysis"));
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_stale_take_is_not_scored() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let id = seeded(&store, Some("old answer")).await?;
        let old = store.response(id).await?.unwrap().take();
        let current = store.response(id).await?.unwrap();
        store
            .upsert_response(&ResponseUpsert {
                application_id: current.application_id,
                business_case_id: current.business_case_id,
                video_url: "http://videos/b".into(),
                completed_at: Utc::now(),
                transcription_status: TranscriptionStatus::Skipped,
            })
            .await?;
        let f = AnalysisFunction::new(Arc::new(ScriptedScorer::scoring(50)), store.clone());

        assert!(matches!(f.run(&AnalysisRequest::from(old)).await, Err(AppError::Superseded)));
        let row = store.response(id).await?.unwrap();
        assert_eq!(row.content_analysis_status, AnalysisStatus::Pending);
        assert!(row.content_quality_score.is_none());
        Ok(())
    }
}
