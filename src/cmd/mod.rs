use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use crate::{
    pkg::{
        internal::{
            recorder::{
                Recorder, Take,
                file::{FileDevice, video_mime_for},
            },
            session::{
                controller::{AccessGrant, SessionController},
                http::HttpBackend,
                state::SessionState,
            },
        },
        server::listen,
    },
    prelude::{AppError, Result},
};

mod migrate;

const SUBMIT_ATTEMPTS: usize = 3;

#[derive(Parser)]
#[command(about = "business case video responses for job applications")]
struct Cmd {
    #[command(subcommand)]
    command: Option<SubCommandType>,
}

#[derive(Subcommand)]
enum SubCommandType {
    /// Serve the candidate and recruiter HTTP API
    Listen,
    /// Apply database migrations
    Migrate,
    /// Answer a business case session from pre-recorded video files
    Answer(AnswerArgs),
}

#[derive(Args)]
struct AnswerArgs {
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,
    #[arg(long)]
    job_id: Uuid,
    #[arg(long)]
    application_id: Uuid,
    #[arg(long)]
    token: String,
    #[arg(long, default_value = "en")]
    language: String,
    /// One file per remaining question, in order
    #[arg(long = "video", required = true)]
    videos: Vec<PathBuf>,
    /// WAV microphone track per video. With it the answer is recorded through the
    /// capture pipeline and transcribed; without it the video is uploaded as is.
    #[arg(long = "audio")]
    audios: Vec<PathBuf>,
    /// Play the files back this many times faster than real time
    #[arg(long, default_value_t = 1)]
    speedup: u32,
}

/// Records one answer from a camera file and its microphone track.
async fn record(video: &Path, audio: &Path, language: &str, speedup: u32) -> Result<Take> {
    let device = FileDevice::open(video, audio, speedup).await?;
    let length = device.duration();
    let mut recorder = Recorder::new(device);
    recorder.set_language(language);
    if !recorder.acquire().await {
        let reason = recorder.error().unwrap_or("device unavailable").to_string();
        return Err(AppError::Capture(reason));
    }
    recorder.start()?;
    tokio::time::sleep(length + Duration::from_millis(100)).await;
    recorder.stop().await?;
    recorder
        .accept()
        .ok_or_else(|| AppError::Capture("nothing was recorded".into()))
}

async fn answer(args: AnswerArgs) -> Result<()> {
    if !args.audios.is_empty() && args.audios.len() != args.videos.len() {
        return Err(AppError::BadRequest(format!(
            "{} videos but {} audio tracks",
            args.videos.len(),
            args.audios.len()
        )));
    }
    let grant = AccessGrant {
        job_id: args.job_id,
        application_id: args.application_id,
        token: args.token,
    };
    let mut controller = SessionController::new(HttpBackend::new(&args.server), grant);
    match controller.open().await.clone() {
        SessionState::Invalid => return Err(AppError::InvalidAccess),
        SessionState::Error { reason, .. } => return Err(AppError::Upstream(reason)),
        SessionState::Completed => {
            tracing::info!("all questions already answered");
            return Ok(());
        }
        _ => {}
    }

    let mut audios = args.audios.into_iter();
    let mut files = args.videos.into_iter();
    while let Some(question) = controller.current_question().cloned() {
        let Some(path) = files.next() else {
            tracing::warn!("no file left for question {}: {}", question.number, question.title);
            break;
        };
        let take = match audios.next() {
            Some(audio) => record(&path, &audio, &args.language, args.speedup).await?,
            None => {
                let data = tokio::fs::read(&path).await?;
                Take::from_file(Bytes::from(data), video_mime_for(&path), &args.language)
            }
        };
        tracing::info!("answering question {} with {}", question.number, path.display());

        let mut attempt = 1;
        loop {
            match controller.submit(take.clone()).await.clone() {
                SessionState::Error { reason, .. } if attempt < SUBMIT_ATTEMPTS => {
                    tracing::warn!("attempt {} failed: {}, retrying", attempt, reason);
                    attempt += 1;
                    controller.retry();
                }
                SessionState::Error { reason, .. } => return Err(AppError::Upload(reason)),
                SessionState::Invalid => return Err(AppError::InvalidAccess),
                _ => break,
            }
        }
        if controller.state() == &SessionState::Completed {
            tracing::info!("business case completed");
            break;
        }
    }
    Ok(())
}

pub async fn run() -> Result<()> {
    let args = Cmd::parse();
    match args.command {
        Some(SubCommandType::Listen) => {
            listen().await?;
        }
        Some(SubCommandType::Migrate) => {
            migrate::apply().await?;
        }
        Some(SubCommandType::Answer(args)) => {
            answer(args).await?;
        }
        None => {
            tracing::error!("no subcommand passed");
        }
    }
    Ok(())
}
