//! # AI Module
//!
//! Ports for the hosted language services and their OpenAI-compatible HTTP
//! adapter. The documents assistant uses [`CompletionService`], voice
//! messages use [`TranscriptionService`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::ai_config::AiConfig;
use crate::ai_errors::AiError;

/// Instructions sent with every question to the documents assistant
pub const LEGAL_SYSTEM_PROMPT: &str = "Ты - опытный юрист, специализирующийся на похоронном законодательстве и оформлении документов РФ.\n\
Отвечай кратко, четко и по существу. Давай практические советы.\n\
Если вопрос не связан с юридическими аспектами похорон, вежливо перенаправь к соответствующему специалисту.";

/// Answers a free-text question
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String, AiError>;
}

/// Turns a recorded audio file into text
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, AiError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Adapter over the OpenAI HTTP API
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    config: AiConfig,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, config: AiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            config,
        })
    }

    /// Turns a non-success response into [`AiError::Api`]
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(AiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn request_completion(&self, request: &ChatRequest<'_>) -> Result<String, AiError> {
        let response = self
            .http
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let body: ChatResponse = Self::check_status(response).await?.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyResponse)
    }

    async fn request_transcription(&self, audio_path: &Path) -> Result<String, AiError> {
        let bytes = tokio::fs::read(audio_path).await?;
        debug!(bytes = bytes.len(), "Sending transcription request");

        let file = Part::bytes(bytes).file_name("voice.ogg").mime_str("audio/ogg")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.config.transcription_model.clone());

        let response = self
            .http
            .post(self.config.endpoint("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let body: TranscriptionResponse = Self::check_status(response).await?.json().await?;

        Ok(body.text.trim().to_string())
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn answer(&self, question: &str) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.config.completion_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: LEGAL_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %self.config.completion_model, chars = question.chars().count(), "Sending completion request");

        let result = self.request_completion(&request).await;
        match &result {
            Ok(answer) => info!(chars = answer.chars().count(), "Completion received"),
            Err(e) => error!(error = %e, "Completion request failed"),
        }
        result
    }
}

#[async_trait]
impl TranscriptionService for OpenAiClient {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, AiError> {
        let result = self.request_transcription(audio_path).await;
        match &result {
            Ok(text) => info!(chars = text.chars().count(), "Transcription received"),
            Err(e) => error!(error = %e, "Transcription request failed"),
        }
        result
    }
}
