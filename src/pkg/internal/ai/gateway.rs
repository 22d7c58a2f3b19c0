use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::{
    ScoreOps, TranscribeOps,
    spec::{QuestionPrompt, Scorecards, ToolSpec, TranscriptionToolResult},
};
use crate::{
    conf::settings,
    prelude::{AppError, Result},
};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionText {
    text: String,
}

/// Where a speech-to-text endpoint lives. It may be a different provider from the
/// chat model.
#[derive(Debug, Clone)]
pub struct TranscriptionEndpoint {
    pub endpoint: String,
    pub key: String,
    pub model: String,
}

/// OpenAI compatible chat completions client. Every call forces a single function
/// tool so the model answers with structured arguments.
#[derive(Debug, Clone)]
pub struct AiGateway {
    client: Client,
    endpoint: String,
    key: String,
    model: String,
    transcription: TranscriptionEndpoint,
}

/// How an audio payload reaches the provider. Chat `input_audio` only takes wav and
/// mp3; browser webm and mp4 containers go to `/audio/transcriptions` as a file.
#[derive(Debug, PartialEq)]
enum AudioRoute {
    ChatInput(&'static str),
    Upload(&'static str),
}

pub fn map_status(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => AppError::QuotaExhausted,
        other => AppError::Upstream(format!("{}: {}", other, body.trim())),
    }
}

fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn tool_arguments(response: ChatResponse, tool: &str) -> Result<String> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| AppError::Upstream("empty completion".into()))?;
    if let Some(call) = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .find(|c| c.function.name == tool) {
        return Ok(call.function.arguments);
    }
    // some providers ignore tool_choice and answer in plain content
    match message.content.as_deref().map(strip_fences) {
        Some(content) if !content.is_empty() => Ok(content.to_string()),
        _ => Err(AppError::Upstream(format!("model did not call {}", tool))),
    }
}

fn audio_format(mime_type: &str) -> &str {
    let subtype = mime_type.split(';').next().unwrap_or(mime_type);
    subtype.rsplit('/').next().unwrap_or("webm").trim()
}

fn audio_route(mime_type: &str) -> AudioRoute {
    match audio_format(mime_type) {
        "wav" | "wave" | "x-wav" => AudioRoute::ChatInput("wav"),
        "mpeg" | "mp3" => AudioRoute::ChatInput("mp3"),
        "mp4" | "quicktime" => AudioRoute::Upload("mp4"),
        "m4a" | "x-m4a" => AudioRoute::Upload("m4a"),
        "ogg" => AudioRoute::Upload("ogg"),
        "flac" | "x-flac" => AudioRoute::Upload("flac"),
        _ => AudioRoute::Upload("webm"),
    }
}

impl AiGateway {
    pub fn new(endpoint: &str, key: &str, model: &str) -> Self {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        AiGateway {
            client: Client::new(),
            transcription: TranscriptionEndpoint {
                endpoint: endpoint.clone(),
                key: key.to_string(),
                model: "whisper-1".into(),
            },
            endpoint,
            key: key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn with_transcription(mut self, transcription: TranscriptionEndpoint) -> Self {
        self.transcription = TranscriptionEndpoint {
            endpoint: transcription.endpoint.trim_end_matches('/').to_string(),
            ..transcription
        };
        self
    }

    pub fn from_settings() -> Self {
        Self::new(&settings.ai_endpoint, &settings.ai_key, &settings.ai_model).with_transcription(
            TranscriptionEndpoint {
                endpoint: settings.ai_transcription_endpoint.clone(),
                key: settings.ai_transcription_key.clone(),
                model: settings.ai_transcription_model.clone(),
            },
        )
    }

    async fn upload_for_transcription(
        &self,
        audio_b64: &str,
        mime_type: &str,
        extension: &str,
        language: &str,
    ) -> Result<String> {
        let file = Part::bytes(STANDARD.decode(audio_b64)?)
            .file_name(format!("answer.{}", extension))
            .mime_str(mime_type)?;
        let form = Form::new()
            .text("model", self.transcription.model.clone())
            .text("language", language.to_string())
            .text("response_format", "json")
            .part("file", file);
        tracing::debug!("uploading {} audio to {}", extension, &self.transcription.model);
        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.transcription.endpoint))
            .bearer_auth(&self.transcription.key)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("transcription endpoint returned {}: {}", status, &text);
            return Err(map_status(status, &text));
        }
        let parsed: TranscriptionText = response.json().await?;
        Ok(parsed.text.trim().to_string())
    }

    async fn call_tool<T: DeserializeOwned>(&self, messages: Value, tool: ToolSpec) -> Result<T> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "tools": [tool.as_tool()],
            "tool_choice": tool.as_choice(),
        });
        tracing::debug!("calling {} with tool {}", &self.model, tool.name);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("ai gateway returned {}: {}", status, &text);
            return Err(map_status(status, &text));
        }
        let parsed: ChatResponse = response.json().await?;
        let arguments = tool_arguments(parsed, tool.name)?;
        Ok(serde_json::from_str(&arguments)?)
    }
}

#[async_trait]
impl TranscribeOps for AiGateway {
    async fn transcribe(&self, audio_b64: &str, mime_type: &str, language: &str) -> Result<String> {
        let format = match audio_route(mime_type) {
            AudioRoute::ChatInput(format) => format,
            AudioRoute::Upload(extension) => {
                return self
                    .upload_for_transcription(audio_b64, mime_type, extension, language)
                    .await;
            }
        };
        let messages = json!([
            {
                "role": "system",
                "content": format!(
                    "You transcribe recorded interview answers. Return the exact words spoken in language '{}'. \
                     Do not summarise, translate or correct the speaker.",
                    language
                )
            },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": "Transcribe this answer." },
                    {
                        "type": "input_audio",
                        "input_audio": { "data": audio_b64, "format": format }
                    }
                ]
            }
        ]);
        let result: TranscriptionToolResult = self.call_tool(messages, ToolSpec::transcription()).await?;
        Ok(result.transcription.trim().to_string())
    }
}

#[async_trait]
impl ScoreOps for AiGateway {
    async fn score(&self, question: &QuestionPrompt, transcript: &str) -> Result<Scorecards> {
        let messages = json!([
            {
                "role": "system",
                "content": "You assess spoken answers to business case questions for a hiring team. \
                            Score content quality and English fluency from 0 to 100. \
                            Strengths and areas to probe are short phrases a recruiter can act on."
            },
            {
                "role": "user",
                "content": format!(
                    "Question: {}\n\n{}\n\nCandidate transcript:\n{}",
                    question.title, question.description, transcript
                )
            }
        ]);
        let cards: Scorecards = self.call_tool(messages, ToolSpec::scorecards()).await?;
        Ok(cards.clamped())
    }
}
