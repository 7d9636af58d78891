//! # AI Configuration Module
//!
//! Settings of the hosted completion and transcription APIs used by the
//! documents assistant and voice messages.

// Constants for AI configuration
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const MAX_QUESTION_CHARS: usize = 500;
/// Transcripts shorter than this (ignoring whitespace) count as unrecognized
pub const MIN_TRANSCRIPT_CHARS: usize = 2;

/// Configuration of the AI adapter
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Base URL of the OpenAI-compatible API, without trailing slash
    pub api_base: String,
    /// Chat completion model
    pub completion_model: String,
    /// Speech-to-text model
    pub transcription_model: String,
    /// Upper bound of answer tokens
    pub max_tokens: u32,
    pub temperature: f32,
    /// Longest accepted question in characters
    pub max_question_chars: usize,
    /// Timeout of one API request in seconds
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            max_tokens: 500,
            temperature: 0.9,
            max_question_chars: MAX_QUESTION_CHARS,
            request_timeout_secs: 30,
        }
    }
}

impl AiConfig {
    /// Endpoint URL under the configured base
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        let config = AiConfig {
            api_base: "http://localhost:8080/v1/".to_string(),
            ..AiConfig::default()
        };
        assert_eq!(config.endpoint("/chat/completions"), "http://localhost:8080/v1/chat/completions");
    }
}
