use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::BcqStore;
use crate::{
    pkg::internal::{
        adaptors::{
            applications::spec::ApplicationEntry,
            business_cases::spec::{BusinessCaseEntry, CreateBusinessCase},
            jobs::spec::JobEntry,
            responses::spec::{AnalysisStatus, ResponseEntry, ResponseTake, ResponseUpsert, TranscriptionStatus},
        },
        ai::spec::Scorecards,
        business_case::timing::Completion,
    },
    prelude::{AppError, Result},
};

/// Mirrors the Postgres constraints the workflow leans on: one response per
/// (application, question) pair and write-once token/timestamp columns.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    jobs: HashMap<Uuid, JobEntry>,
    applications: HashMap<Uuid, ApplicationEntry>,
    questions: HashMap<Uuid, BusinessCaseEntry>,
    responses: HashMap<Uuid, ResponseEntry>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job(&self, title: &str) -> JobEntry {
        let job = JobEntry {
            id: Uuid::new_v4(),
            title: title.into(),
            department: "Strategy".into(),
            description: format!("{title} role"),
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().jobs.insert(job.id, job.clone());
        job
    }

    pub fn add_application(&self, job_id: Uuid, token: Option<&str>) -> ApplicationEntry {
        let now = Utc::now();
        let app = ApplicationEntry {
            id: Uuid::new_v4(),
            job_id,
            candidate_name: "Ada Candidate".into(),
            candidate_email: "ada@example.com".into(),
            bcq_access_token: token.map(String::from),
            bcq_link_opened_at: None,
            bcq_started_at: None,
            bcq_completed_at: None,
            business_case_completed: false,
            bcq_response_time_minutes: None,
            bcq_delayed: false,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().applications.insert(app.id, app.clone());
        app
    }

    pub fn add_questions(&self, job_id: Uuid, count: i32) -> Vec<BusinessCaseEntry> {
        let mut tables = self.inner.lock().unwrap();
        (1..=count)
            .map(|n| {
                let q = BusinessCaseEntry {
                    id: Uuid::new_v4(),
                    job_id,
                    question_number: n,
                    question_title: format!("Case {n}"),
                    question_description: format!("Walk us through case {n}"),
                    video_url: None,
                    enable_text_response: false,
                    created_at: Utc::now(),
                };
                tables.questions.insert(q.id, q.clone());
                q
            })
            .collect()
    }

    pub fn set_link_opened(&self, id: Uuid, at: DateTime<Utc>) {
        if let Some(app) = self.inner.lock().unwrap().applications.get_mut(&id) {
            app.bcq_link_opened_at = Some(at);
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    pub fn response_count(&self, application_id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .responses
            .values()
            .filter(|r| r.application_id == application_id)
            .count()
    }

    pub fn application_now(&self, id: Uuid) -> ApplicationEntry {
        self.inner.lock().unwrap().applications[&id].clone()
    }

    fn guard(tables: &Tables) -> Result<()> {
        if tables.fail_writes {
            return Err(AppError::Io(std::io::Error::other("store offline")));
        }
        Ok(())
    }

    /// The row behind `take`, unless a newer upload has replaced it.
    fn current(tables: &mut Tables, take: ResponseTake) -> Option<&mut ResponseEntry> {
        tables
            .responses
            .get_mut(&take.id)
            .filter(|row| row.take_id == take.take_id)
    }
}

#[async_trait::async_trait]
impl BcqStore for MemoryStore {
    async fn application(&self, id: Uuid) -> Result<Option<ApplicationEntry>> {
        Ok(self.inner.lock().unwrap().applications.get(&id).cloned())
    }

    async fn issue_access_token(&self, id: Uuid, token: &str) -> Result<String> {
        let mut tables = self.inner.lock().unwrap();
        let app = tables
            .applications
            .get_mut(&id)
            .ok_or(AppError::NotFound("application"))?;
        Ok(app
            .bcq_access_token
            .get_or_insert_with(|| token.to_string())
            .clone())
    }

    async fn mark_link_opened(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.inner.lock().unwrap();
        match tables.applications.get_mut(&id) {
            Some(app) if app.bcq_link_opened_at.is_none() => {
                app.bcq_link_opened_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_started(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.inner.lock().unwrap();
        Self::guard(&tables)?;
        match tables.applications.get_mut(&id) {
            Some(app) if app.bcq_started_at.is_none() => {
                app.bcq_started_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_completed(&self, id: Uuid, completion: &Completion) -> Result<()> {
        let mut tables = self.inner.lock().unwrap();
        if let Some(app) = tables.applications.get_mut(&id) {
            app.business_case_completed = true;
            app.bcq_completed_at = Some(completion.completed_at);
            app.bcq_response_time_minutes = completion.response_time_minutes;
            app.bcq_delayed = completion.delayed;
        }
        Ok(())
    }

    async fn job(&self, id: Uuid) -> Result<Option<JobEntry>> {
        Ok(self.inner.lock().unwrap().jobs.get(&id).cloned())
    }

    async fn questions(&self, job_id: Uuid) -> Result<Vec<BusinessCaseEntry>> {
        let tables = self.inner.lock().unwrap();
        let mut questions: Vec<_> = tables
            .questions
            .values()
            .filter(|q| q.job_id == job_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.question_number);
        Ok(questions)
    }

    async fn question(&self, id: Uuid) -> Result<Option<BusinessCaseEntry>> {
        Ok(self.inner.lock().unwrap().questions.get(&id).cloned())
    }

    async fn create_question(&self, job_id: Uuid, input: &CreateBusinessCase) -> Result<BusinessCaseEntry> {
        let q = BusinessCaseEntry {
            id: Uuid::new_v4(),
            job_id,
            question_number: input.question_number,
            question_title: input.question_title.clone(),
            question_description: input.question_description.clone(),
            video_url: input.video_url.clone(),
            enable_text_response: input.enable_text_response,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().questions.insert(q.id, q.clone());
        Ok(q)
    }

    async fn responses(&self, application_id: Uuid) -> Result<Vec<ResponseEntry>> {
        let tables = self.inner.lock().unwrap();
        let mut rows: Vec<_> = tables
            .responses
            .values()
            .filter(|r| r.application_id == application_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn response(&self, id: Uuid) -> Result<Option<ResponseEntry>> {
        Ok(self.inner.lock().unwrap().responses.get(&id).cloned())
    }

    async fn upsert_response(&self, upsert: &ResponseUpsert) -> Result<ResponseEntry> {
        let mut tables = self.inner.lock().unwrap();
        Self::guard(&tables)?;
        let now = Utc::now();
        let existing = tables
            .responses
            .values()
            .find(|r| r.application_id == upsert.application_id && r.business_case_id == upsert.business_case_id)
            .map(|r| r.id);
        let row = match existing.and_then(|id| tables.responses.get_mut(&id)) {
            Some(row) => {
                row.video_url = Some(upsert.video_url.clone());
                row.take_id = Uuid::new_v4();
                row.completed_at = Some(upsert.completed_at);
                row.transcription_status = upsert.transcription_status;
                row.text_response = None;
                row.content_quality_score = None;
                row.content_strengths = None;
                row.content_areas_to_probe = None;
                row.content_summary = None;
                row.fluency_pronunciation_score = None;
                row.fluency_pace_score = None;
                row.fluency_hesitation_score = None;
                row.fluency_grammar_score = None;
                row.fluency_overall_score = None;
                row.fluency_notes = None;
                row.content_analysis_status = AnalysisStatus::Pending;
                row.content_analysis_error = None;
                row.updated_at = now;
                row.clone()
            }
            None => {
                let row = ResponseEntry {
                    id: Uuid::new_v4(),
                    application_id: upsert.application_id,
                    business_case_id: upsert.business_case_id,
                    video_url: Some(upsert.video_url.clone()),
                    take_id: Uuid::new_v4(),
                    text_response: None,
                    completed_at: Some(upsert.completed_at),
                    transcription_status: upsert.transcription_status,
                    fluency_pronunciation_score: None,
                    fluency_pace_score: None,
                    fluency_hesitation_score: None,
                    fluency_grammar_score: None,
                    fluency_overall_score: None,
                    fluency_notes: None,
                    content_quality_score: None,
                    content_strengths: None,
                    content_areas_to_probe: None,
                    content_summary: None,
                    content_analysis_status: AnalysisStatus::Pending,
                    content_analysis_error: None,
                    created_at: now,
                    updated_at: now,
                };
                tables.responses.insert(row.id, row.clone());
                row
            }
        };
        Ok(row)
    }

    async fn set_transcript(&self, take: ResponseTake, text: &str) -> Result<bool> {
        let mut tables = self.inner.lock().unwrap();
        Self::guard(&tables)?;
        Ok(match Self::current(&mut tables, take) {
            Some(row) => {
                row.text_response = Some(text.to_string());
                row.transcription_status = TranscriptionStatus::Completed;
                true
            }
            None => false,
        })
    }

    async fn set_transcription_status(&self, take: ResponseTake, status: TranscriptionStatus) -> Result<bool> {
        let mut tables = self.inner.lock().unwrap();
        Self::guard(&tables)?;
        Ok(match Self::current(&mut tables, take) {
            Some(row) => {
                row.transcription_status = status;
                true
            }
            None => false,
        })
    }

    async fn set_analysis_status(&self, take: ResponseTake, status: AnalysisStatus, error: Option<&str>) -> Result<bool> {
        let mut tables = self.inner.lock().unwrap();
        Self::guard(&tables)?;
        Ok(match Self::current(&mut tables, take) {
            Some(row) => {
                row.content_analysis_status = status;
                row.content_analysis_error = error.map(String::from);
                true
            }
            None => false,
        })
    }

    async fn save_scorecards(&self, take: ResponseTake, cards: &Scorecards) -> Result<bool> {
        let mut tables = self.inner.lock().unwrap();
        Self::guard(&tables)?;
        Ok(match Self::current(&mut tables, take) {
            Some(row) => {
                row.fluency_pronunciation_score = Some(cards.fluency.vocabulary_clarity);
                row.fluency_pace_score = Some(cards.fluency.sentence_flow);
                row.fluency_hesitation_score = Some(cards.fluency.hesitation);
                row.fluency_grammar_score = Some(cards.fluency.grammar);
                row.fluency_overall_score = Some(cards.fluency.overall);
                row.fluency_notes = Some(cards.fluency.notes.clone());
                row.content_quality_score = Some(cards.content.quality_score);
                row.content_strengths = Some(cards.content.strengths.clone());
                row.content_areas_to_probe = Some(cards.content.areas_to_probe.clone());
                row.content_summary = Some(cards.content.summary.clone());
                row.content_analysis_status = AnalysisStatus::Completed;
                row.content_analysis_error = None;
                true
            }
            None => false,
        })
    }
}
