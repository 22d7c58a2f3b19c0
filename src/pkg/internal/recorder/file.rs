use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::{Interval, MissedTickBehavior};

use super::capture::{CaptureDevice, FrameSource, MediaFrame};
use crate::prelude::{AppError, Result};

/// Microphone audio carried by one frame at normal speed.
pub const FRAME_AUDIO: Duration = Duration::from_millis(100);

pub fn video_mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        _ => "video/webm",
    }
}

/// Plays back a camera recording and a WAV microphone track as if they were live
/// devices. Both files are cut into the same number of frames, so the two streams
/// start and stop together.
#[derive(Debug, Clone)]
pub struct FileDevice {
    video: Bytes,
    video_mime: &'static str,
    audio: Bytes,
    frames: usize,
    interval: Duration,
}

impl FileDevice {
    pub async fn open(video: &Path, audio: &Path, speedup: u32) -> Result<Self> {
        let video_data = tokio::fs::read(video)
            .await
            .map_err(|e| AppError::Capture(format!("{}: {}", video.display(), e)))?;
        let audio_data = tokio::fs::read(audio)
            .await
            .map_err(|e| AppError::Capture(format!("{}: {}", audio.display(), e)))?;
        Self::from_bytes(
            Bytes::from(video_data),
            video_mime_for(video),
            Bytes::from(audio_data),
            speedup,
        )
    }

    pub fn from_bytes(video: Bytes, video_mime: &'static str, audio: Bytes, speedup: u32) -> Result<Self> {
        let reader = hound::WavReader::new(Cursor::new(audio.as_ref()))
            .map_err(|e| AppError::Capture(format!("microphone track is not a WAV file: {}", e)))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(AppError::Capture("microphone track has no sample rate".into()));
        }
        let length = Duration::from_secs_f64(f64::from(reader.duration()) / f64::from(spec.sample_rate));
        let frames = (length.as_secs_f64() / FRAME_AUDIO.as_secs_f64()).ceil().max(1.0) as usize;
        tracing::debug!(
            "file device: {:?} of {} Hz audio in {} frames",
            length,
            spec.sample_rate,
            frames
        );
        Ok(FileDevice {
            video,
            video_mime,
            audio,
            frames,
            interval: (FRAME_AUDIO / speedup.max(1)).max(Duration::from_millis(1)),
        })
    }

    /// How long playback takes from `start` to the last frame.
    pub fn duration(&self) -> Duration {
        self.interval * self.frames as u32
    }
}

struct FileSource {
    video: Bytes,
    video_mime: &'static str,
    audio: Bytes,
    frames: usize,
    emitted: usize,
    ticker: Interval,
}

/// Byte range of frame `index` when `len` bytes are cut into `frames` pieces.
fn slice_bounds(len: usize, frames: usize, index: usize) -> (usize, usize) {
    (len * index / frames, len * (index + 1) / frames)
}

#[async_trait]
impl FrameSource for FileSource {
    async fn next_frame(&mut self) -> Option<MediaFrame> {
        if self.emitted == self.frames {
            return None;
        }
        self.ticker.tick().await;
        let (vs, ve) = slice_bounds(self.video.len(), self.frames, self.emitted);
        let (as_, ae) = slice_bounds(self.audio.len(), self.frames, self.emitted);
        self.emitted += 1;
        Some(MediaFrame {
            video: self.video.slice(vs..ve),
            audio: self.audio.slice(as_..ae),
        })
    }

    fn mime_types(&self) -> (&'static str, &'static str) {
        (self.video_mime, "audio/wav")
    }
}

#[async_trait]
impl CaptureDevice for FileDevice {
    async fn acquire(&self) -> Result<Box<dyn FrameSource>> {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Box::new(FileSource {
            video: self.video.clone(),
            video_mime: self.video_mime,
            audio: self.audio.clone(),
            frames: self.frames,
            emitted: 0,
            ticker,
        }))
    }
}
