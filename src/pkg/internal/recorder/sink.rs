use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::{sync::mpsc, task::JoinHandle};

pub const VIDEO_MIME: &str = "video/webm";
pub const AUDIO_MIME: &str = "audio/webm";

#[derive(Debug)]
pub enum SinkMsg {
    Chunk(Bytes),
    /// Closes the blob; carries the recorded interval shared by every sink.
    Stop(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub mime_type: String,
    pub data: Bytes,
    pub duration: Duration,
}

pub fn spawn_sink(mime_type: &'static str) -> (mpsc::Sender<SinkMsg>, JoinHandle<Recording>) {
    let (tx, mut rx) = mpsc::channel::<SinkMsg>(64);
    let handle = tokio::spawn(async move {
        let mut buf = BytesMut::new();
        let mut duration = Duration::ZERO;
        while let Some(msg) = rx.recv().await {
            match msg {
                SinkMsg::Chunk(chunk) => buf.extend_from_slice(&chunk),
                SinkMsg::Stop(elapsed) => {
                    duration = elapsed;
                    break;
                }
            }
        }
        tracing::debug!("{} sink closed with {} bytes", mime_type, buf.len());
        Recording {
            mime_type: mime_type.to_string(),
            data: buf.freeze(),
            duration,
        }
    });
    (tx, handle)
}
