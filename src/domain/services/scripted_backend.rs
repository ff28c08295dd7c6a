use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;

/// In memory backend that replays queued results and records what it was
/// asked.
#[derive(Default)]
pub struct ScriptedBackend {
    credential: bool,
    texts: Mutex<VecDeque<Result<String>>>,
    images: Mutex<VecDeque<Result<Option<Vec<u8>>>>>,
    text_prompts: Mutex<Vec<String>>,
    image_prompts: Mutex<Vec<String>>,
    completion_prompts: Mutex<Vec<BackendPrompt>>,
}

impl ScriptedBackend {
    pub fn new() -> ScriptedBackend {
        return ScriptedBackend {
            credential: true,
            ..ScriptedBackend::default()
        };
    }

    pub fn without_credential() -> ScriptedBackend {
        return ScriptedBackend::default();
    }

    pub fn with_text(self, res: Result<String>) -> ScriptedBackend {
        self.texts.lock().unwrap().push_back(res);
        return self;
    }

    pub fn with_rate_limits(self, count: usize) -> ScriptedBackend {
        let mut backend = self;
        for _ in 0..count {
            backend = backend.with_text(Err(BackendError::RateLimited("quota".to_string()).into()));
        }
        return backend;
    }

    pub fn with_image(self, res: Result<Option<Vec<u8>>>) -> ScriptedBackend {
        self.images.lock().unwrap().push_back(res);
        return self;
    }

    pub fn text_calls(&self) -> usize {
        return self.text_prompts.lock().unwrap().len();
    }

    pub fn text_prompts(&self) -> Vec<String> {
        return self.text_prompts.lock().unwrap().clone();
    }

    pub fn image_prompts(&self) -> Vec<String> {
        return self.image_prompts.lock().unwrap().clone();
    }

    pub fn completion_prompt_sizes(&self) -> Vec<usize> {
        return self
            .completion_prompts
            .lock()
            .unwrap()
            .iter()
            .map(|prompt| return prompt.history.len())
            .collect();
    }

    pub fn last_completion_prompt(&self) -> Option<(String, Vec<String>)> {
        return self.completion_prompts.lock().unwrap().last().map(|prompt| {
            return (
                prompt.system.to_string(),
                prompt
                    .history
                    .iter()
                    .map(|msg| return msg.content.to_string())
                    .collect(),
            );
        });
    }

    fn next_text(&self) -> Result<String> {
        if !self.credential {
            return Err(BackendError::MissingCredential.into());
        }

        return self
            .texts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return Err(anyhow!("No scripted text left")));
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    fn has_credential(&self) -> bool {
        return self.credential;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if !self.credential {
            return Err(BackendError::MissingCredential.into());
        }
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion<'a>(
        &self,
        _model: &str,
        prompt: BackendPrompt,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<String> {
        self.completion_prompts.lock().unwrap().push(prompt);
        let text = self.next_text()?;

        tx.send(BackendResponse {
            text: text.to_string(),
            done: false,
        })?;
        tx.send(BackendResponse {
            text: "".to_string(),
            done: true,
        })?;

        return Ok(text);
    }

    #[allow(clippy::implicit_return)]
    async fn generate_text(&self, _model: &str, prompt: &str) -> Result<String> {
        self.text_prompts.lock().unwrap().push(prompt.to_string());
        return self.next_text();
    }

    #[allow(clippy::implicit_return)]
    async fn generate_image(&self, _model: &str, prompt: &str) -> Result<Option<Vec<u8>>> {
        self.image_prompts.lock().unwrap().push(prompt.to_string());
        if !self.credential {
            return Err(BackendError::MissingCredential.into());
        }

        return self
            .images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None));
    }
}
