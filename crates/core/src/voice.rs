//! Bounded answer capture for spoken (or terminal) interviews.
//!
//! The capture loop sits outside the session: it only produces answer text.
//! Re-prompting after an unrecognised utterance or a request to repeat the
//! question therefore never advances the session's question count.

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Spoken when an utterance could not be understood.
pub const RETRY_PROMPT: &str =
    "I'm sorry, I couldn't quite make that out. Could you please try rephrasing?";

/// What a single listening attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heard {
    Speech(String),
    /// Something was captured but could not be turned into text.
    Unrecognized,
}

/// Speech input/output, e.g. a TTS/STT pair or a terminal.
#[async_trait]
pub trait SpeechIo: Send {
    async fn speak(&mut self, text: &str) -> Result<()>;
    async fn listen(&mut self) -> Result<Heard>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Answer(String),
    /// Every attempt was used up without a usable answer.
    GaveUp,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct CapturePolicy {
    /// Listening attempts allowed per question, including repeats.
    pub max_attempts: u32,
    /// Whole-utterance phrases that ask for the question again.
    pub repeat_keywords: Vec<String>,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            repeat_keywords: ["repeat", "say that again", "pardon", "come again"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl CapturePolicy {
    /// True when `utterance` is nothing but a request to hear the question again.
    pub fn is_repeat_request(&self, utterance: &str) -> bool {
        let normalized: String = utterance
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        self.repeat_keywords.iter().any(|keyword| {
            let keyword = keyword.to_lowercase();
            normalized == keyword
                || normalized == format!("please {keyword}")
                || normalized == format!("can you {keyword}")
                || normalized == format!("could you {keyword}")
                || normalized == format!("{keyword} please")
                || normalized == format!("{keyword} the question")
        })
    }
}

/// Listens for an answer to `question`, re-prompting within `policy`'s bounds.
///
/// Returns as soon as `cancel` fires, including mid-listen.
pub async fn capture_answer(
    io: &mut dyn SpeechIo,
    question: &str,
    policy: &CapturePolicy,
    cancel: &CancellationToken,
) -> Result<CaptureOutcome> {
    for attempt in 1..=policy.max_attempts {
        let heard = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Answer capture cancelled");
                return Ok(CaptureOutcome::Cancelled);
            }
            heard = io.listen() => heard?,
        };

        match heard {
            Heard::Speech(text) if policy.is_repeat_request(&text) => {
                debug!(attempt, "Candidate asked for the question again");
                io.speak(question).await?;
            }
            Heard::Speech(text) => return Ok(CaptureOutcome::Answer(text)),
            Heard::Unrecognized => {
                debug!(attempt, "Utterance not recognised");
                if attempt < policy.max_attempts {
                    io.speak(RETRY_PROMPT).await?;
                }
            }
        }
    }

    info!(max_attempts = policy.max_attempts, "No usable answer captured");
    Ok(CaptureOutcome::GaveUp)
}
