use async_trait::async_trait;
use uuid::Uuid;

use super::state::{SessionEvent, SessionState, transition};
use crate::{
    pkg::internal::{
        business_case::{QuestionView, SessionSnapshot, SubmitReceipt},
        recorder::Take,
    },
    prelude::{AppError, Result},
};

/// The capability a candidate link carries. Held for the whole session and sent
/// with every request; the server checks it each time.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub job_id: Uuid,
    pub application_id: Uuid,
    pub token: String,
}

#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn open(&self, grant: &AccessGrant) -> Result<SessionSnapshot>;
    async fn submit(&self, grant: &AccessGrant, question_id: Uuid, take: Take) -> Result<SubmitReceipt>;
}

pub struct SessionController<B: SessionBackend> {
    backend: B,
    grant: AccessGrant,
    state: SessionState,
}

impl<B: SessionBackend> SessionController<B> {
    pub fn new(backend: B, grant: AccessGrant) -> Self {
        SessionController {
            backend,
            grant,
            state: SessionState::Loading,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn apply(&mut self, event: SessionEvent) -> &SessionState {
        let state = std::mem::replace(&mut self.state, SessionState::Loading);
        self.state = transition(state, event);
        &self.state
    }

    pub async fn open(&mut self) -> &SessionState {
        let event = match self.backend.open(&self.grant).await {
            Ok(snapshot) => SessionEvent::Validated(snapshot),
            Err(AppError::InvalidAccess) => SessionEvent::Rejected,
            Err(err) => SessionEvent::Failed(err.to_string()),
        };
        self.apply(event)
    }

    pub fn current_question(&self) -> Option<&QuestionView> {
        match &self.state {
            SessionState::Ready(progress) | SessionState::Submitting(progress) => progress.current_question(),
            _ => None,
        }
    }

    /// Submits the take for the current question. Only one submission runs at a
    /// time; calling this outside `Ready` is a no-op.
    pub async fn submit(&mut self, take: Take) -> &SessionState {
        let Some(question_id) = self.current_question().map(|q| q.id) else {
            return &self.state;
        };
        if !matches!(self.state, SessionState::Ready(_)) {
            return &self.state;
        }
        self.apply(SessionEvent::SubmitStarted);
        let event = match self.backend.submit(&self.grant, question_id, take).await {
            Ok(receipt) => SessionEvent::Submitted {
                question_id: receipt.question_id,
                completed: receipt.completed,
            },
            Err(AppError::InvalidAccess) => SessionEvent::Rejected,
            Err(err) => {
                tracing::warn!("submission of {} failed: {}", question_id, &err);
                SessionEvent::SubmitFailed(err.to_string())
            }
        };
        self.apply(event)
    }

    pub fn next(&mut self) -> &SessionState {
        self.apply(SessionEvent::Next)
    }

    pub fn previous(&mut self) -> &SessionState {
        self.apply(SessionEvent::Previous)
    }

    pub fn retry(&mut self) -> &SessionState {
        self.apply(SessionEvent::Retry)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use bytes::Bytes;
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::internal::business_case::tests::{Fixture, fixture};
    use crate::pkg::internal::business_case::{MediaUpload, Submission};

    /// Calls the service directly, standing in for the HTTP hop.
    struct InProcess {
        fx: Fixture,
        fail_next: Mutex<bool>,
        submitted: Mutex<HashSet<Uuid>>,
    }

    #[async_trait]
    impl SessionBackend for InProcess {
        async fn open(&self, grant: &AccessGrant) -> Result<SessionSnapshot> {
            self.fx
                .service
                .open_session(grant.job_id, grant.application_id, &grant.token)
                .await
        }

        async fn submit(&self, grant: &AccessGrant, question_id: Uuid, take: Take) -> Result<SubmitReceipt> {
            let fail = std::mem::take(&mut *self.fail_next.lock().unwrap());
            self.fx.storage.fail_uploads(fail);
            self.submitted.lock().unwrap().insert(question_id);
            let outcome = self
                .fx
                .service
                .submit_response(Submission {
                    job_id: grant.job_id,
                    application_id: grant.application_id,
                    token: grant.token.clone(),
                    question_id,
                    video: MediaUpload {
                        mime_type: take.video.mime_type,
                        data: take.video.data,
                    },
                    audio: None,
                    language: take.language,
                })
                .await?;
            Ok(outcome.receipt)
        }
    }

    fn controller(questions: i32, token: &str) -> SessionController<InProcess> {
        let fx = fixture(questions);
        let grant = AccessGrant {
            job_id: fx.job.id,
            application_id: fx.application.id,
            token: token.into(),
        };
        SessionController::new(
            InProcess {
                fx,
                fail_next: Mutex::new(false),
                submitted: Mutex::new(HashSet::new()),
            },
            grant,
        )
    }

    fn take() -> Take {
        Take::from_file(Bytes::from_static(b"clip"), "video/mp4", "en")
    }

    #[tokio::test]
    #[traced_test]
    async fn test_full_session_to_completion() {
        let mut c = controller(2, "tok-123");
        assert!(matches!(c.open().await, SessionState::Ready(_)));
        assert!(matches!(c.submit(take()).await, SessionState::Ready(p) if p.current == 1));
        assert_eq!(c.submit(take()).await, &SessionState::Completed);
        assert!(c.backend.fx.store.application_now(c.grant.application_id).business_case_completed);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_bad_token_lands_in_invalid() {
        let mut c = controller(2, "nope");
        assert_eq!(c.open().await, &SessionState::Invalid);
        assert_eq!(c.submit(take()).await, &SessionState::Invalid);
        assert!(c.backend.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_upload_failure_then_retry() {
        let mut c = controller(2, "tok-123");
        c.open().await;
        *c.backend.fail_next.lock().unwrap() = true;
        assert!(matches!(c.submit(take()).await, SessionState::Error { progress: Some(p), .. } if p.current == 0));
        assert!(matches!(c.retry(), SessionState::Ready(p) if p.current == 0));
        assert!(matches!(c.submit(take()).await, SessionState::Ready(p) if p.current == 1));
        assert_eq!(c.backend.fx.store.response_count(c.grant.application_id), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_reopen_resumes_where_left() {
        let mut c = controller(3, "tok-123");
        c.open().await;
        c.submit(take()).await;
        let fx = c.backend;
        let mut again = SessionController::new(fx, c.grant.clone());
        assert!(matches!(again.open().await, SessionState::Ready(p) if p.current == 1));
        assert_eq!(again.current_question().map(|q| q.number), Some(2));
    }
}
