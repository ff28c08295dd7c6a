#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

use super::ChatMessage;

/// Number of transcript entries sent with each chat request.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Gemini,
}

impl BackendName {
    pub fn parse(text: String) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

pub struct BackendPrompt {
    pub system: String,
    pub history: Vec<ChatMessage>,
}

impl BackendPrompt {
    /// Keeps only the trailing `HISTORY_LIMIT` messages of the transcript.
    pub fn new(system: &str, messages: &[ChatMessage]) -> BackendPrompt {
        let start = messages.len().saturating_sub(HISTORY_LIMIT);
        return BackendPrompt {
            system: system.to_string(),
            history: messages[start..].to_vec(),
        };
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct BackendResponse {
    pub text: String,
    pub done: bool,
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
pub type BackendRef<'a> = &'a (dyn Backend + Send + Sync);

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Whether an API key is available. Every model call fails with
    /// `BackendError::MissingCredential` when this is false.
    fn has_credential(&self) -> bool;

    /// Used at startup to verify the backend is reachable with the configured
    /// key.
    async fn health_check(&self) -> Result<()>;

    /// Requests a chat completion. Chunks are streamed through `tx` as they
    /// arrive, followed by a final `done` response. The full text is returned
    /// once the stream ends.
    async fn get_completion<'a>(
        &self,
        model: &str,
        prompt: BackendPrompt,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<String>;

    /// Single shot, non streamed text generation.
    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String>;

    /// Returns the raw bytes of the first inline image in the response, if
    /// there is one.
    async fn generate_image(&self, model: &str, prompt: &str) -> Result<Option<Vec<u8>>>;
}
