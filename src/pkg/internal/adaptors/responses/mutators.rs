use sqlx::PgConnection;
use uuid::Uuid;

use crate::pkg::internal::adaptors::responses::spec::{
    AnalysisStatus, RESPONSE_COLUMNS, ResponseEntry, ResponseTake, ResponseUpsert, TranscriptionStatus,
};
use crate::pkg::internal::ai::spec::Scorecards;
use crate::prelude::Result;

pub struct ResponseMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ResponseMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ResponseMutator { pool }
    }

    /// A new video replaces the previous answer wholesale, so the stale transcript
    /// and scorecards are cleared with it and the row gets a fresh `take_id`.
    pub async fn upsert_video(&mut self, upsert: &ResponseUpsert) -> Result<ResponseEntry> {
        let row = sqlx::query_as::<_, ResponseEntry>(&format!(
            r#"
            INSERT INTO business_case_responses
                (id, application_id, business_case_id, video_url, completed_at, transcription_status, take_id, content_analysis_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            ON CONFLICT (application_id, business_case_id) DO UPDATE
            SET video_url = EXCLUDED.video_url,
                take_id = EXCLUDED.take_id,
                completed_at = EXCLUDED.completed_at,
                transcription_status = EXCLUDED.transcription_status,
                text_response = NULL,
                fluency_pronunciation_score = NULL,
                fluency_pace_score = NULL,
                fluency_hesitation_score = NULL,
                fluency_grammar_score = NULL,
                fluency_overall_score = NULL,
                fluency_notes = NULL,
                content_quality_score = NULL,
                content_strengths = NULL,
                content_areas_to_probe = NULL,
                content_summary = NULL,
                content_analysis_status = 'pending',
                content_analysis_error = NULL,
                updated_at = CURRENT_TIMESTAMP
            RETURNING {RESPONSE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(upsert.application_id)
        .bind(upsert.business_case_id)
        .bind(&upsert.video_url)
        .bind(upsert.completed_at)
        .bind(upsert.transcription_status)
        .bind(Uuid::new_v4())
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_transcript(&mut self, take: ResponseTake, text: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE business_case_responses
            SET text_response = $3, transcription_status = $4, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND take_id = $2
            "#,
        )
        .bind(take.id)
        .bind(take.take_id)
        .bind(text)
        .bind(TranscriptionStatus::Completed)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_transcription_status(&mut self, take: ResponseTake, status: TranscriptionStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE business_case_responses
             SET transcription_status = $3, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1 AND take_id = $2",
        )
        .bind(take.id)
        .bind(take.take_id)
        .bind(status)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_analysis_status(
        &mut self,
        take: ResponseTake,
        status: AnalysisStatus,
        error: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE business_case_responses
             SET content_analysis_status = $3, content_analysis_error = $4, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1 AND take_id = $2",
        )
        .bind(take.id)
        .bind(take.take_id)
        .bind(status)
        .bind(error)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn save_scorecards(&mut self, take: ResponseTake, cards: &Scorecards) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE business_case_responses
            SET fluency_pronunciation_score = $3,
                fluency_pace_score = $4,
                fluency_hesitation_score = $5,
                fluency_grammar_score = $6,
                fluency_overall_score = $7,
                fluency_notes = $8,
                content_quality_score = $9,
                content_strengths = $10,
                content_areas_to_probe = $11,
                content_summary = $12,
                content_analysis_status = $13,
                content_analysis_error = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND take_id = $2
            "#,
        )
        .bind(take.id)
        .bind(take.take_id)
        .bind(cards.fluency.vocabulary_clarity)
        .bind(cards.fluency.sentence_flow)
        .bind(cards.fluency.hesitation)
        .bind(cards.fluency.grammar)
        .bind(cards.fluency.overall)
        .bind(&cards.fluency.notes)
        .bind(cards.content.quality_score)
        .bind(&cards.content.strengths)
        .bind(&cards.content.areas_to_probe)
        .bind(&cards.content.summary)
        .bind(AnalysisStatus::Completed)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
