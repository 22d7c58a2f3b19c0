use async_trait::async_trait;

use crate::prelude::Result;

pub mod analyze;
pub mod gateway;
pub mod spec;
pub mod transcribe;

use spec::{QuestionPrompt, Scorecards};

/// Speech to text over an already base64 encoded audio payload.
#[async_trait]
pub trait TranscribeOps: Send + Sync {
    async fn transcribe(&self, audio_b64: &str, mime_type: &str, language: &str) -> Result<String>;
}

/// Scores one transcript against the question it answers.
#[async_trait]
pub trait ScoreOps: Send + Sync {
    async fn score(&self, question: &QuestionPrompt, transcript: &str) -> Result<Scorecards>;
}

#[cfg(test)]
pub mod fakes {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::pkg::internal::ai::spec::{ContentScorecard, FluencyScorecard};
    use crate::prelude::AppError;

    /// Echoes a fixed transcript, or fails with whatever error it was primed with.
    #[derive(Default)]
    pub struct ScriptedTranscriber {
        pub transcript: String,
        pub fail_with: Mutex<Option<AppError>>,
        pub calls: AtomicUsize,
        pub delay: Option<Duration>,
    }

    impl ScriptedTranscriber {
        pub fn saying(transcript: &str) -> Self {
            ScriptedTranscriber {
                transcript: transcript.into(),
                ..Default::default()
            }
        }

        pub fn failing(err: AppError) -> Self {
            ScriptedTranscriber {
                fail_with: Mutex::new(Some(err)),
                ..Default::default()
            }
        }

        pub fn slowed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranscribeOps for ScriptedTranscriber {
        async fn transcribe(&self, _audio_b64: &str, _mime: &str, _language: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            Ok(self.transcript.clone())
        }
    }

    pub struct ScriptedScorer {
        pub quality: i32,
        pub fail_with: Mutex<Option<AppError>>,
    }

    impl ScriptedScorer {
        pub fn scoring(quality: i32) -> Self {
            ScriptedScorer {
                quality,
                fail_with: Mutex::new(None),
            }
        }

        pub fn failing(err: AppError) -> Self {
            ScriptedScorer {
                quality: 0,
                fail_with: Mutex::new(Some(err)),
            }
        }
    }

    #[async_trait]
    impl ScoreOps for ScriptedScorer {
        async fn score(&self, question: &QuestionPrompt, _transcript: &str) -> Result<Scorecards> {
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            Ok(Scorecards {
                content: ContentScorecard {
                    quality_score: self.quality,
                    strengths: vec![format!("structured answer to {}", question.title)],
                    areas_to_probe: vec!["market sizing assumptions".into()],
                    summary: "solid".into(),
                },
                fluency: FluencyScorecard {
                    vocabulary_clarity: 80,
                    sentence_flow: 75,
                    hesitation: 70,
                    grammar: 90,
                    overall: 79,
                    notes: "clear".into(),
                },
            })
        }
    }
}
