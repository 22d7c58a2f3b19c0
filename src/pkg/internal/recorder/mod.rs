use std::time::Duration;

use bytes::Bytes;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};

use crate::prelude::{AppError, Result};

pub mod capture;
pub mod file;
pub mod sink;

use capture::{CaptureDevice, FrameSource};
use sink::{Recording, SinkMsg, spawn_sink};

#[derive(Debug, Clone, PartialEq)]
pub enum RecorderState {
    /// No device held. `error` explains a failed acquisition.
    Idle { error: Option<String> },
    Ready,
    Recording,
    Recorded,
}

/// An accepted answer: the combined recording for upload, the audio track for
/// transcription and the language the candidate spoke.
#[derive(Debug, Clone)]
pub struct Take {
    pub video: Recording,
    pub audio: Option<Recording>,
    pub language: String,
}

impl Take {
    /// A pre-recorded file stands in for the combined blob; there is no separate
    /// audio track, so transcription is skipped.
    pub fn from_file(data: Bytes, mime_type: &str, language: &str) -> Self {
        Take {
            video: Recording {
                mime_type: mime_type.to_string(),
                data,
                duration: Duration::ZERO,
            },
            audio: None,
            language: language.to_string(),
        }
    }
}

struct ActiveCapture {
    stop: oneshot::Sender<()>,
    producer: JoinHandle<Box<dyn FrameSource>>,
    video: JoinHandle<Recording>,
    audio: JoinHandle<Recording>,
}

async fn produce(
    mut source: Box<dyn FrameSource>,
    mut stop: oneshot::Receiver<()>,
    video: mpsc::Sender<SinkMsg>,
    audio: mpsc::Sender<SinkMsg>,
) -> Box<dyn FrameSource> {
    let started = Instant::now();
    loop {
        tokio::select! {
            _ = &mut stop => break,
            frame = source.next_frame() => match frame {
                Some(frame) => {
                    if video.send(SinkMsg::Chunk(frame.video)).await.is_err()
                        || audio.send(SinkMsg::Chunk(frame.audio)).await.is_err()
                    {
                        tracing::warn!("recording sink closed early");
                        break;
                    }
                }
                None => {
                    tracing::warn!("capture device stopped producing frames");
                    break;
                }
            }
        }
    }
    let elapsed = started.elapsed();
    let _ = video.send(SinkMsg::Stop(elapsed)).await;
    let _ = audio.send(SinkMsg::Stop(elapsed)).await;
    source
}

/// Drives one capture device into two encoders. Both blobs always cover the same
/// start and stop instants.
pub struct Recorder<D: CaptureDevice> {
    device: D,
    source: Option<Box<dyn FrameSource>>,
    active: Option<ActiveCapture>,
    video: Option<Recording>,
    audio: Option<Recording>,
    language: String,
    state: RecorderState,
}

impl<D: CaptureDevice> Recorder<D> {
    pub fn new(device: D) -> Self {
        Recorder {
            device,
            source: None,
            active: None,
            video: None,
            audio: None,
            language: "en".into(),
            state: RecorderState::Idle { error: None },
        }
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            RecorderState::Idle { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
    }

    /// Requests camera and microphone. Failure is reported through the state, the
    /// rest of the session keeps working (a file upload is still possible).
    pub async fn acquire(&mut self) -> bool {
        match self.device.acquire().await {
            Ok(source) => {
                self.source = Some(source);
                self.state = RecorderState::Ready;
                true
            }
            Err(err) => {
                tracing::warn!("capture device unavailable: {}", &err);
                self.source = None;
                self.state = RecorderState::Idle {
                    error: Some(err.to_string()),
                };
                false
            }
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state != RecorderState::Ready {
            return Err(AppError::Capture(format!("cannot record while {:?}", self.state)));
        }
        let source = self
            .source
            .take()
            .ok_or_else(|| AppError::Capture("no device acquired".into()))?;
        let (video_mime, audio_mime) = source.mime_types();
        let (video_tx, video) = spawn_sink(video_mime);
        let (audio_tx, audio) = spawn_sink(audio_mime);
        let (stop, stop_rx) = oneshot::channel();
        let producer = tokio::spawn(produce(source, stop_rx, video_tx, audio_tx));
        self.active = Some(ActiveCapture {
            stop,
            producer,
            video,
            audio,
        });
        self.video = None;
        self.audio = None;
        self.state = RecorderState::Recording;
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        let ActiveCapture {
            stop,
            producer,
            video,
            audio,
        } = self
            .active
            .take()
            .ok_or_else(|| AppError::Capture("not recording".into()))?;
        // the producer may already have ended on its own
        let _ = stop.send(());
        let joined = async move {
            let source = producer.await?;
            let video = video.await?;
            let audio = audio.await?;
            Ok::<_, tokio::task::JoinError>((source, video, audio))
        }
        .await;
        let (source, video, audio) = joined.map_err(|e| {
            self.state = RecorderState::Idle {
                error: Some(e.to_string()),
            };
            AppError::Capture(e.to_string())
        })?;
        tracing::info!(
            "recorded {:?}: {} video bytes, {} audio bytes",
            video.duration,
            video.data.len(),
            audio.data.len()
        );
        self.source = Some(source);
        self.video = Some(video);
        self.audio = Some(audio);
        self.state = RecorderState::Recorded;
        Ok(())
    }

    /// Throws the take away and starts over with a fresh device handle.
    pub async fn discard(&mut self) -> bool {
        if let Some(active) = self.active.take() {
            let _ = active.stop.send(());
            active.producer.abort();
            active.video.abort();
            active.audio.abort();
        }
        self.source = None;
        self.video = None;
        self.audio = None;
        self.acquire().await
    }

    pub fn replace_with_file(&mut self, data: Bytes, mime_type: &str) {
        if let Some(active) = self.active.take() {
            active.producer.abort();
            active.video.abort();
            active.audio.abort();
        }
        let take = Take::from_file(data, mime_type, &self.language);
        self.video = Some(take.video);
        self.audio = None;
        self.state = RecorderState::Recorded;
    }

    /// Hands the finished take over for submission and readies the recorder for
    /// the next question.
    pub fn accept(&mut self) -> Option<Take> {
        if self.state != RecorderState::Recorded {
            return None;
        }
        let video = self.video.take()?;
        let audio = self.audio.take();
        self.state = match self.source {
            Some(_) => RecorderState::Ready,
            None => RecorderState::Idle { error: None },
        };
        Some(Take {
            video,
            audio,
            language: self.language.clone(),
        })
    }
}
