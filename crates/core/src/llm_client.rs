use crate::error::InterviewError;
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use tracing::{debug, warn};

/// Text substituted whenever a completion cannot be produced.
pub const GENERATION_FALLBACK: &str = "Sorry, I encountered an error.";

/// Persona sent as the system message on every completion.
const INTERVIEWER_PERSONA: &str = "You are Alex, a Senior Technical Interviewer. \
Your tone is professional but friendly.";

/// Defines the supported backends for text generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    /// The OpenAI-compatible base URL for this provider.
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    /// Chat model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o",
            Provider::Gemini => "gemini-1.5-pro",
        }
    }

    /// Name of the environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Parses a provider name, defaulting to OpenAI for anything unrecognised.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            _ => Provider::OpenAI,
        }
    }
}

/// A text-generation backend: one prompt in, one free-text completion out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Requests a single, non-streaming completion for `prompt`.
    async fn complete(&self, prompt: String) -> Result<String>;
}

/// Runs a completion and substitutes [`GENERATION_FALLBACK`] on failure.
///
/// Generation errors never cross the session boundary; they are logged here
/// and the interview keeps moving.
pub async fn complete_or_fallback(client: &dyn LLMClient, prompt: String) -> String {
    match client.complete(prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = ?e, "Text generation failed; using fallback text");
            GENERATION_FALLBACK.to_string()
        }
    }
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    /// Builds a client for `provider` using its OpenAI-compatible endpoint.
    pub fn for_provider(provider: &Provider, api_key: &str, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(provider.api_base());
        Self::new(config, model)
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn complete(&self, prompt: String) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(INTERVIEWER_PERSONA)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response: CreateChatCompletionResponse = self.client.chat().create(request).await?;

        let text = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .as_ref()
            .context("No content in LLM response")?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(InterviewError::Generation("empty completion".to_string()).into());
        }
        debug!(model = %self.model, chars = text.len(), "Completion received");
        Ok(text)
    }
}

/// Wraps another client and bounds every completion by a fixed timeout.
pub struct TimeoutClient {
    inner: Arc<dyn LLMClient>,
    timeout: Duration,
}

impl TimeoutClient {
    pub fn new(inner: Arc<dyn LLMClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl LLMClient for TimeoutClient {
    async fn complete(&self, prompt: String) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.inner.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(InterviewError::Generation(format!(
                "completion timed out after {}s",
                self.timeout.as_secs_f32()
            ))
            .into()),
        }
    }
}

/// A deterministic `LLMClient` for development and offline runs.
///
/// Evaluation requests (prompts that spell out the `SCORE:` contract) get a
/// well-formed three-line reply; everything else gets the fixed reply text.
pub struct CannedLLMClient {
    reply: String,
    evaluation: String,
    calls: AtomicUsize,
}

impl CannedLLMClient {
    pub fn new() -> Self {
        Self::with_replies(
            "Could you walk me through how you would approach that in practice?",
            "SCORE: 7\nSTRENGTHS: Clear and well structured.\nIMPROVEMENTS: Go deeper into trade-offs.",
        )
    }

    pub fn with_replies(reply: impl Into<String>, evaluation: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            evaluation: evaluation.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many completions have been requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for CannedLLMClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClient for CannedLLMClient {
    async fn complete(&self, prompt: String) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("SCORE:") {
            Ok(self.evaluation.clone())
        } else {
            Ok(self.reply.clone())
        }
    }
}
