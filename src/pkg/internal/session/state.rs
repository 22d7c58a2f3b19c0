use std::collections::BTreeSet;

use uuid::Uuid;

use crate::pkg::internal::business_case::{QuestionView, SessionSnapshot};

/// Where the candidate is in the ordered question list.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub questions: Vec<QuestionView>,
    pub answered: BTreeSet<Uuid>,
    pub current: usize,
}

impl Progress {
    pub fn current_question(&self) -> Option<&QuestionView> {
        self.questions.get(self.current)
    }

    pub fn is_current_answered(&self) -> bool {
        self.current_question()
            .is_some_and(|q| self.answered.contains(&q.id))
    }

    pub fn all_answered(&self) -> bool {
        !self.questions.is_empty() && self.questions.iter().all(|q| self.answered.contains(&q.id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    /// The link was rejected; nothing else can happen in this session.
    Invalid,
    Ready(Progress),
    Submitting(Progress),
    Completed,
    Error {
        reason: String,
        progress: Option<Progress>,
    },
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Validated(SessionSnapshot),
    Rejected,
    Failed(String),
    SubmitStarted,
    Submitted { question_id: Uuid, completed: bool },
    SubmitFailed(String),
    Retry,
    Next,
    Previous,
}

fn from_snapshot(snapshot: SessionSnapshot) -> SessionState {
    if snapshot.completed || snapshot.questions.is_empty() {
        return SessionState::Completed;
    }
    let current = snapshot.resume_index.unwrap_or(0);
    SessionState::Ready(Progress {
        questions: snapshot.questions,
        answered: snapshot.answered.into_iter().collect(),
        current,
    })
}

/// Pure transition function. Events that make no sense in the current state leave
/// it unchanged.
pub fn transition(state: SessionState, event: SessionEvent) -> SessionState {
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        (S::Loading, E::Validated(snapshot)) => from_snapshot(snapshot),
        (S::Loading, E::Rejected) => S::Invalid,
        (S::Loading, E::Failed(reason)) => S::Error {
            reason,
            progress: None,
        },

        (S::Ready(progress), E::SubmitStarted) => S::Submitting(progress),
        (S::Ready(mut progress), E::Next) => {
            if progress.is_current_answered() && progress.current + 1 < progress.questions.len() {
                progress.current += 1;
            }
            S::Ready(progress)
        }
        (S::Ready(mut progress), E::Previous) => {
            progress.current = progress.current.saturating_sub(1);
            S::Ready(progress)
        }

        (S::Submitting(mut progress), E::Submitted { question_id, completed }) => {
            progress.answered.insert(question_id);
            if completed || progress.all_answered() {
                return S::Completed;
            }
            if progress.current + 1 < progress.questions.len() {
                progress.current += 1;
            }
            S::Ready(progress)
        }
        (S::Submitting(progress), E::SubmitFailed(reason)) => S::Error {
            reason,
            progress: Some(progress),
        },
        (S::Submitting(_), E::Rejected) => S::Invalid,

        (S::Error {
            progress: Some(progress),
            ..
        }, E::Retry) => S::Ready(progress),

        (state, _) => state,
    }
}
