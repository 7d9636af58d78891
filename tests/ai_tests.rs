use std::io::Write;

use anyhow::Result;
use euroservice::ai::{CompletionService, OpenAiClient, TranscriptionService};
use euroservice::ai_config::AiConfig;
use euroservice::ai_errors::AiError;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Result<OpenAiClient> {
    let config = AiConfig {
        api_base: format!("{}/v1", server.uri()),
        request_timeout_secs: 5,
        ..AiConfig::default()
    };
    Ok(OpenAiClient::new("test-key", config)?)
}

#[tokio::test]
async fn test_completion_returns_trimmed_answer() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  Обратитесь в ЗАГС.  " } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let answer = client.answer("Как получить свидетельство о смерти?").await?;
    assert_eq!(answer, "Обратитесь в ЗАГС.");
    Ok(())
}

#[tokio::test]
async fn test_completion_without_content_is_empty_response() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let result = client.answer("Вопрос").await;
    assert!(matches!(result, Err(AiError::EmptyResponse)));
    Ok(())
}

#[tokio::test]
async fn test_completion_api_error_keeps_status() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    match client.answer("Вопрос").await {
        Err(AiError::Api { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("unexpected result {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_transcription_posts_audio_file() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": " кремация \n" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut audio = tempfile::Builder::new().suffix(".ogg").tempfile()?;
    audio.write_all(b"OggS fake audio")?;

    let client = client_for(&server)?;
    let text = client.transcribe(audio.path()).await?;
    assert_eq!(text, "кремация");
    Ok(())
}

#[tokio::test]
async fn test_transcription_of_missing_file_is_io_error() -> Result<()> {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir()?;

    let client = client_for(&server)?;
    let result = client.transcribe(&dir.path().join("missing.ogg")).await;
    assert!(matches!(result, Err(AiError::Io(_))));
    Ok(())
}
