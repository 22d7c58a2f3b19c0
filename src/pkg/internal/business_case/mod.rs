use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::{
    pkg::internal::{
        access::{self, generate_token, session_url},
        adaptors::{
            applications::spec::ApplicationEntry,
            business_cases::spec::{BusinessCaseEntry, CreateBusinessCase},
            responses::spec::{AnalysisStatus, ResponseEntry, ResponseTake, ResponseUpsert, TranscriptionStatus},
        },
        ai::{
            analyze::{AnalysisFunction, AnalysisRequest},
            transcribe::{TranscriptionFunction, TranscriptionRequest},
        },
        email::{SendEmail, invite::BcqInvite},
        minio::{S3Ops, key_from_url},
        store::BcqStore,
    },
    prelude::{AppError, Result},
};

pub mod timing;

use timing::{Completion, all_answered, answered_ids, resume_index};

/// Lifetime of a recruiter playback link.
pub const PLAYBACK_URL_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub number: i32,
    pub title: String,
    pub description: String,
    pub explainer_video_url: Option<String>,
    pub text_response_required: bool,
}

impl From<&BusinessCaseEntry> for QuestionView {
    fn from(q: &BusinessCaseEntry) -> Self {
        QuestionView {
            id: q.id,
            number: q.question_number,
            title: q.question_title.clone(),
            description: q.question_description.clone(),
            explainer_video_url: q.video_url.clone(),
            text_response_required: q.enable_text_response,
        }
    }
}

/// What a candidate sees when the link is opened (or reopened).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub candidate_name: String,
    pub questions: Vec<QuestionView>,
    pub answered: Vec<Uuid>,
    pub resume_index: Option<usize>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub response_id: Uuid,
    pub question_id: Uuid,
    pub video_url: String,
    pub answered: usize,
    pub total: usize,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub mime_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub job_id: Uuid,
    pub application_id: Uuid,
    pub token: String,
    pub question_id: Uuid,
    pub video: MediaUpload,
    pub audio: Option<MediaUpload>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupReport {
    pub response_id: Uuid,
    pub transcript_chars: usize,
    pub analysis: AnalysisStatus,
    /// The answer was re-recorded while this ran, so nothing was written.
    pub superseded: bool,
}

/// Handle on the transcription and analysis that run after a video is stored.
#[derive(Debug)]
pub struct FollowupTask {
    pub response_id: Uuid,
    rx: oneshot::Receiver<Result<FollowupReport>>,
}

impl FollowupTask {
    pub async fn wait(self) -> Result<FollowupReport> {
        let response_id = self.response_id;
        self.rx
            .await
            .map_err(|_| AppError::Upstream(format!("follow-up for {} was dropped", response_id)))?
    }
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub receipt: SubmitReceipt,
    pub followup: Option<FollowupTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLink {
    pub application_id: Uuid,
    pub url: String,
}

#[derive(Clone)]
pub struct BcqService {
    store: Arc<dyn BcqStore>,
    storage: Arc<dyn S3Ops>,
    transcriber: TranscriptionFunction,
    analyzer: AnalysisFunction,
    bucket: String,
    base_url: String,
}

async fn run_followup(
    transcriber: TranscriptionFunction,
    analyzer: AnalysisFunction,
    take: ResponseTake,
    audio: MediaUpload,
    language: String,
) -> Result<FollowupReport> {
    let request = TranscriptionRequest::new(&audio.data, &audio.mime_type, &language, Some(take));
    let transcript = transcriber.run(&request).await?;
    let transcript_chars = transcript.transcription.chars().count();
    if !transcript.stored {
        tracing::warn!("transcript for {} was not stored, skipping analysis", take.id);
        return Ok(FollowupReport {
            response_id: take.id,
            transcript_chars,
            analysis: AnalysisStatus::Pending,
            superseded: true,
        });
    }
    // scoring failures are recorded on the row and never undo the transcript
    let (analysis, superseded) = match analyzer.run(&AnalysisRequest::from(take)).await {
        Ok(_) => (AnalysisStatus::Completed, false),
        Err(AppError::Superseded) => (AnalysisStatus::Pending, true),
        Err(err) => {
            tracing::warn!("analysis for {} did not complete: {}", take.id, &err);
            (AnalysisStatus::Failed, false)
        }
    };
    Ok(FollowupReport {
        response_id: take.id,
        transcript_chars,
        analysis,
        superseded,
    })
}

impl BcqService {
    pub fn new(
        store: Arc<dyn BcqStore>,
        storage: Arc<dyn S3Ops>,
        transcriber: TranscriptionFunction,
        analyzer: AnalysisFunction,
        bucket: &str,
        base_url: &str,
    ) -> Self {
        BcqService {
            store,
            storage,
            transcriber,
            analyzer,
            bucket: bucket.to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub fn transcriber(&self) -> &TranscriptionFunction {
        &self.transcriber
    }

    pub fn analyzer(&self) -> &AnalysisFunction {
        &self.analyzer
    }

    async fn authorize(&self, job_id: Uuid, application_id: Uuid, token: &str) -> Result<ApplicationEntry> {
        let application = access::validate(self.store.as_ref(), application_id, token).await?;
        if application.job_id != job_id {
            tracing::warn!("application {} does not belong to job {}", application_id, job_id);
            return Err(AppError::InvalidAccess);
        }
        Ok(application)
    }

    pub async fn open_session(&self, job_id: Uuid, application_id: Uuid, token: &str) -> Result<SessionSnapshot> {
        let application = self.authorize(job_id, application_id, token).await?;
        let questions = self.store.questions(job_id).await?;
        let responses = self.store.responses(application_id).await?;
        let answered = answered_ids(&responses);
        let resume = resume_index(&questions, &answered);
        tracing::info!(
            "session opened for {}: {}/{} answered",
            application_id,
            answered.len(),
            questions.len()
        );
        Ok(SessionSnapshot {
            application_id,
            job_id,
            candidate_name: application.candidate_name,
            answered: questions
                .iter()
                .filter(|q| answered.contains(&q.id))
                .map(|q| q.id)
                .collect(),
            questions: questions.iter().map(QuestionView::from).collect(),
            resume_index: resume,
            completed: application.business_case_completed || (resume.is_none() && !questions.is_empty()),
        })
    }

    /// Stores one answer. The video upload comes first so a storage failure leaves
    /// the application and response rows untouched.
    pub async fn submit_response(&self, submission: Submission) -> Result<SubmitOutcome> {
        let Submission {
            job_id,
            application_id,
            token,
            question_id,
            video,
            audio,
            language,
        } = submission;
        let application = self.authorize(job_id, application_id, &token).await?;
        let question = self
            .store
            .question(question_id)
            .await?
            .filter(|q| q.job_id == job_id)
            .ok_or(AppError::NotFound("business case"))?;
        if video.data.is_empty() {
            return Err(AppError::BadRequest("video recording is empty".into()));
        }

        let key = format!("{}/{}", application_id, question.id);
        let video_url = self
            .storage
            .upload_object(&self.bucket, &key, video.data.to_vec(), &video.mime_type)
            .await
            .inspect_err(|e| tracing::error!("upload for {} failed: {}", &key, e))?;

        let now = Utc::now();
        if application.bcq_started_at.is_none() && self.store.mark_started(application_id, now).await? {
            tracing::info!("bcq started for application {}", application_id);
        }
        let audio = audio.filter(|a| !a.data.is_empty());
        let row = self
            .store
            .upsert_response(&ResponseUpsert {
                application_id,
                business_case_id: question.id,
                video_url: video_url.clone(),
                completed_at: now,
                transcription_status: match audio {
                    Some(_) => TranscriptionStatus::Pending,
                    None => TranscriptionStatus::Skipped,
                },
            })
            .await?;

        let followup = audio.map(|audio| self.spawn_followup(row.take(), audio, language));

        let questions = self.store.questions(job_id).await?;
        let answered = answered_ids(&self.store.responses(application_id).await?);
        let completed = all_answered(&questions, &answered);
        if completed && !application.business_case_completed {
            let completion = Completion::at(application.bcq_link_opened_at, now);
            self.store.mark_completed(application_id, &completion).await?;
            tracing::info!(
                "bcq completed for {} in {:?} minutes, delayed: {}",
                application_id,
                completion.response_time_minutes,
                completion.delayed
            );
        }
        Ok(SubmitOutcome {
            receipt: SubmitReceipt {
                response_id: row.id,
                question_id: question.id,
                video_url,
                answered: questions.iter().filter(|q| answered.contains(&q.id)).count(),
                total: questions.len(),
                completed,
            },
            followup,
        })
    }

    fn spawn_followup(&self, take: ResponseTake, audio: MediaUpload, language: String) -> FollowupTask {
        let (tx, rx) = oneshot::channel();
        let transcriber = self.transcriber.clone();
        let analyzer = self.analyzer.clone();
        tokio::spawn(async move {
            let result = run_followup(transcriber, analyzer, take, audio, language).await;
            let _ = tx.send(result);
        });
        FollowupTask {
            response_id: take.id,
            rx,
        }
    }

    /// Issues (or re-sends) the candidate link. A token, once stored, never changes.
    pub async fn issue_link(&self, application_id: Uuid) -> Result<IssuedLink> {
        let application = self
            .store
            .application(application_id)
            .await?
            .ok_or(AppError::NotFound("application"))?;
        let token = self
            .store
            .issue_access_token(application_id, &generate_token())
            .await?;
        let job = self
            .store
            .job(application.job_id)
            .await?
            .ok_or(AppError::NotFound("job"))?;
        let url = session_url(&self.base_url, job.id, application_id, &token);
        BcqInvite {
            candidate_name: application.candidate_name.clone(),
            job_title: job.title,
            link: url.clone(),
        }
        .send(&application.candidate_email)?;
        tracing::info!("bcq link issued for application {}", application_id);
        Ok(IssuedLink { application_id, url })
    }

    pub async fn responses(&self, application_id: Uuid) -> Result<Vec<ResponseEntry>> {
        self.store
            .application(application_id)
            .await?
            .ok_or(AppError::NotFound("application"))?;
        self.store.responses(application_id).await
    }

    async fn stored_video(&self, response_id: Uuid) -> Result<(ResponseEntry, String)> {
        let response = self
            .store
            .response(response_id)
            .await?
            .ok_or(AppError::NotFound("response"))?;
        let url = response.video_url.as_deref().ok_or(AppError::NotFound("video"))?;
        let key = key_from_url(&self.bucket, url).ok_or(AppError::NotFound("video"))?;
        Ok((response, key))
    }

    /// Re-runs transcription from the stored video for answers whose live
    /// transcription failed or was skipped. Container formats the chat audio input
    /// does not take are sent to the gateway's upload endpoint.
    pub async fn backfill_transcript(&self, response_id: Uuid, language: &str) -> Result<FollowupReport> {
        let (response, key) = self.stored_video(response_id).await?;
        let take = response.take();
        let (data, mime_type) = self.storage.retrieve_object(&self.bucket, &key).await?;
        if !self
            .store
            .set_transcription_status(take, TranscriptionStatus::Pending)
            .await?
        {
            return Err(AppError::Superseded);
        }
        tracing::info!("backfilling transcript for {} from {}", response_id, &key);
        run_followup(
            self.transcriber.clone(),
            self.analyzer.clone(),
            take,
            MediaUpload {
                mime_type,
                data: Bytes::from(data),
            },
            language.to_string(),
        )
        .await
    }

    pub async fn playback_url(&self, response_id: Uuid) -> Result<String> {
        let (_, key) = self.stored_video(response_id).await?;
        self.storage.signed_url(&self.bucket, &key, PLAYBACK_URL_TTL).await
    }

    pub async fn create_question(&self, job_id: Uuid, input: &CreateBusinessCase) -> Result<BusinessCaseEntry> {
        self.store.job(job_id).await?.ok_or(AppError::NotFound("job"))?;
        let question = self.store.create_question(job_id, input).await?;
        tracing::info!("question {} added to job {}", question.question_number, job_id);
        Ok(question)
    }
}
