use async_trait::async_trait;
use bytes::Bytes;

use super::sink::{AUDIO_MIME, VIDEO_MIME};
use crate::prelude::Result;

/// One tick of the capture device: a slice of the muxed camera stream (picture and
/// sound) and the microphone track captured over the same interval.
#[derive(Debug, Clone)]
pub struct MediaFrame {
    pub video: Bytes,
    pub audio: Bytes,
}

#[async_trait]
pub trait FrameSource: Send {
    /// `None` once the device stops producing (unplugged, stream closed).
    async fn next_frame(&mut self) -> Option<MediaFrame>;

    /// Container types of the combined and audio-only streams.
    fn mime_types(&self) -> (&'static str, &'static str) {
        (VIDEO_MIME, AUDIO_MIME)
    }
}

/// Camera and microphone access. Dropping the returned source releases the device.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn FrameSource>>;
}

#[cfg(test)]
pub mod testing {
    use std::time::Duration;

    use super::*;
    use crate::prelude::AppError;

    /// Emits numbered frames at a fixed interval, optionally stopping after `limit`.
    pub struct SyntheticDevice {
        pub interval: Duration,
        pub limit: Option<usize>,
    }

    struct SyntheticSource {
        interval: Duration,
        remaining: Option<usize>,
        seq: u32,
    }

    #[async_trait]
    impl FrameSource for SyntheticSource {
        async fn next_frame(&mut self) -> Option<MediaFrame> {
            if let Some(remaining) = self.remaining.as_mut() {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
            }
            tokio::time::sleep(self.interval).await;
            self.seq += 1;
            Some(MediaFrame {
                video: Bytes::from(format!("V{:04}", self.seq)),
                audio: Bytes::from(format!("a{:04}", self.seq)),
            })
        }
    }

    #[async_trait]
    impl CaptureDevice for SyntheticDevice {
        async fn acquire(&self) -> Result<Box<dyn FrameSource>> {
            Ok(Box::new(SyntheticSource {
                interval: self.interval,
                remaining: self.limit,
                seq: 0,
            }))
        }
    }

    pub struct DeniedDevice;

    #[async_trait]
    impl CaptureDevice for DeniedDevice {
        async fn acquire(&self) -> Result<Box<dyn FrameSource>> {
            Err(AppError::Capture("camera permission denied".into()))
        }
    }
}
