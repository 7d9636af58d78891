//! Voice Handler module turning voice messages into confirmable text

use std::io::Write;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{debug, error, info, warn};

use crate::ai_config::MIN_TRANSCRIPT_CHARS;
use crate::conversation::pending_voice;
use crate::db;
use crate::dialogue::ConversationState;

use super::dialogue_manager::{send_prompt, store_state};
use super::ChatContext;

/// Downloads a Telegram file into memory
pub async fn download_file(bot: &Bot, http: &reqwest::Client, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!("https://api.telegram.org/file/bot{}/{}", bot.token(), file.path);

    let response = http
        .get(&url)
        .send()
        .await
        .context("Failed to request Telegram file")?
        .error_for_status()
        .context("Telegram file download failed")?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

/// Whether a transcript carries enough text to act on
pub fn is_meaningful_transcript(transcript: &str) -> bool {
    transcript.chars().filter(|c| !c.is_whitespace()).count() >= MIN_TRANSCRIPT_CHARS
}

async fn transcribe_voice(ctx: &ChatContext<'_>, file_id: FileId) -> Result<String> {
    let bytes = download_file(ctx.bot, &ctx.app.http, file_id).await?;

    let mut temp_file = tempfile::Builder::new().suffix(".ogg").tempfile()?;
    temp_file.as_file_mut().write_all(&bytes)?;
    let temp_path = temp_file.path().to_path_buf();
    debug!(user_id = ctx.user_id, temp_path = %temp_path.display(), "Voice message downloaded");

    let result = ctx.app.transcriber.transcribe(&temp_path).await;

    // Always clean up the temporary file
    if let Err(cleanup_err) = temp_file.close() {
        error!(temp_path = %temp_path.display(), error = %cleanup_err, "Failed to clean up temporary file");
    } else {
        debug!(temp_path = %temp_path.display(), "Temporary file cleaned up successfully");
    }

    Ok(result?.trim().to_string())
}

/// Transcribes a voice message and asks the user to confirm the text
pub async fn handle_voice(ctx: &ChatContext<'_>, msg: &Message, state: ConversationState) -> Result<()> {
    let Some(voice) = msg.voice() else {
        return Ok(());
    };

    debug!(user_id = ctx.user_id, "Received voice message from user");
    ctx.send(ctx.t("voice-processing"), None).await?;

    let transcript = match transcribe_voice(ctx, voice.file.id.clone()).await {
        Ok(transcript) => transcript,
        Err(e) => {
            error!(user_id = ctx.user_id, error = %e, "Voice transcription failed");
            ctx.send(ctx.t("voice-error"), None).await?;
            return Ok(());
        }
    };

    if !is_meaningful_transcript(&transcript) {
        warn!(user_id = ctx.user_id, "Voice transcript too short");
        ctx.send(ctx.t("voice-not-recognized"), None).await?;
        return Ok(());
    }

    info!(user_id = ctx.user_id, chars = transcript.chars().count(), "Voice message transcribed");
    if let Err(e) =
        db::log_chat_message(&ctx.app.pool, ctx.user_id, "voice", Some(&transcript), "voice_handler", true).await
    {
        warn!(user_id = ctx.user_id, error = %e, "Failed to log voice message");
    }

    let next = pending_voice(state, transcript);
    store_state(ctx, next.clone()).await?;
    send_prompt(ctx, &next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meaningful_transcript() {
        assert!(is_meaningful_transcript("да"));
        assert!(!is_meaningful_transcript(" а "));
        assert!(!is_meaningful_transcript("   "));
    }
}
