//! # AI Error Types Module
//!
//! Errors of the completion and transcription adapter.

use thiserror::Error;

/// Custom error types for AI API calls
#[derive(Debug, Error)]
pub enum AiError {
    /// Transport failure or timeout
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    /// The API answered without any usable text
    #[error("Empty response from API")]
    EmptyResponse,
    /// Reading the audio file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
