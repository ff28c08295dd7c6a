#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::stream::TryStreamExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPartsBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ContentParts {
    Text(String),
    InlineData(ContentPartsBlob),
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<ContentParts>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SystemInstruction {
    parts: Vec<ContentParts>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
}

impl CompletionRequest {
    fn from_text(text: &str) -> CompletionRequest {
        return CompletionRequest {
            system_instruction: None,
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![ContentParts::Text(text.to_string())],
            }],
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentStreamChunk {
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<ContentPartsBlob>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

/// Imagen style `:predict` payload.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bytes_base64_encoded: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    predictions: Vec<Prediction>,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let text = self
            .candidates
            .first()?
            .content
            .parts
            .iter()
            .filter_map(|part| return part.text.clone())
            .collect::<Vec<String>>()
            .join("");

        if text.is_empty() {
            return None;
        }

        return Some(text);
    }

    /// First inline image, checking candidate parts before Imagen predictions.
    fn image_data(&self) -> Option<String> {
        let inline = self
            .candidates
            .iter()
            .flat_map(|candidate| return candidate.content.parts.iter())
            .find_map(|part| return part.inline_data.as_ref().map(|e| return e.data.clone()));

        if inline.is_some() {
            return inline;
        }

        return self
            .predictions
            .iter()
            .find_map(|prediction| return prediction.bytes_base64_encoded.clone());
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Turns a failed response into a typed `BackendError`. Quota exhaustion is
/// reported either as a 429 or through the `RESOURCE_EXHAUSTED` status.
async fn error_from_response(res: reqwest::Response) -> BackendError {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| return e.error)
        .unwrap_or_default();

    let message = if detail.message.is_empty() {
        body
    } else {
        detail.message
    };

    if status == 429 || detail.status == "RESOURCE_EXHAUSTED" {
        return BackendError::RateLimited(message);
    }

    return BackendError::Api { status, message };
}

pub struct Gemini {
    url: String,
    token: String,
    timeout: String,
}

impl Default for Gemini {
    fn default() -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::ApiURL),
            token: Config::get(ConfigKey::ApiKey),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

impl Gemini {
    fn ensure_credential(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(BackendError::MissingCredential.into());
        }
        return Ok(());
    }

    async fn generate_content(&self, model: &str, prompt: &str) -> Result<GenerateContentResponse> {
        self.ensure_credential()?;

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/{model}:generateContent?key={key}",
                url = self.url,
                key = self.token,
            ))
            .json(&CompletionRequest::from_text(prompt))
            .send()
            .await?;

        if !res.status().is_success() {
            let err = error_from_response(res).await;
            tracing::error!(error = ?err, model = model, "Failed to generate content with Gemini");
            return Err(err.into());
        }

        let body = res.json::<GenerateContentResponse>().await?;
        return Ok(body);
    }
}

#[async_trait]
impl Backend for Gemini {
    fn name(&self) -> BackendName {
        return BackendName::Gemini;
    }

    fn has_credential(&self) -> bool {
        return !self.token.is_empty();
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            anyhow::bail!("Gemini URL is not defined");
        }
        self.ensure_credential()?;

        let url = format!(
            "{url}/v1beta/models?key={key}",
            url = self.url,
            key = self.token
        );

        let res = reqwest::Client::new()
            .get(&url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let status = match res {
            Ok(res) => res.status().as_u16(),
            Err(err) => {
                tracing::error!(error = ?err, "Gemini is not reachable");
                anyhow::bail!("Gemini is not reachable");
            }
        };
        if status >= 400 {
            tracing::error!(status = status, "Gemini health check failed");
            anyhow::bail!("Gemini health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion<'a>(
        &self,
        model: &str,
        prompt: BackendPrompt,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<String> {
        self.ensure_credential()?;

        let contents = prompt
            .history
            .iter()
            .map(|msg| {
                return Content {
                    role: msg.role.as_backend_role().to_string(),
                    parts: vec![ContentParts::Text(msg.content.to_string())],
                };
            })
            .collect::<Vec<Content>>();

        let mut system_instruction = None;
        if !prompt.system.is_empty() {
            system_instruction = Some(SystemInstruction {
                parts: vec![ContentParts::Text(prompt.system.to_string())],
            });
        }

        let req = CompletionRequest {
            system_instruction,
            contents,
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/{model}:streamGenerateContent?key={key}",
                url = self.url,
                key = self.token,
            ))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            let err = error_from_response(res).await;
            tracing::error!(error = ?err, "Failed to make completion request to Gemini");
            return Err(err.into());
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        let mut last_message = "".to_string();
        while let Ok(line) = lines_reader.next_line().await {
            if line.is_none() {
                break;
            }

            let cleaned_line = line.unwrap_or_default().trim().to_string();
            if !cleaned_line.starts_with("\"text\":") {
                continue;
            }

            let chunk: GenerateContentStreamChunk =
                serde_json::from_str(&format!("{{ {text} }}", text = cleaned_line))
                    .map_err(|err| return BackendError::InvalidResponse(err.to_string()))?;

            if chunk.text.is_empty() {
                break;
            }

            last_message += &chunk.text;
            tx.send(BackendResponse {
                text: chunk.text,
                done: false,
            })?;
        }

        tx.send(BackendResponse {
            text: "".to_string(),
            done: true,
        })?;

        return Ok(last_message);
    }

    #[allow(clippy::implicit_return)]
    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String> {
        let res = self.generate_content(model, prompt).await?;
        if let Some(text) = res.text() {
            return Ok(text);
        }

        return Err(BackendError::InvalidResponse("response contained no text".to_string()).into());
    }

    #[allow(clippy::implicit_return)]
    async fn generate_image(&self, model: &str, prompt: &str) -> Result<Option<Vec<u8>>> {
        let res = self.generate_content(model, prompt).await?;
        if let Some(data) = res.image_data() {
            let bytes = STANDARD
                .decode(data)
                .map_err(|err| return BackendError::InvalidResponse(err.to_string()))?;
            return Ok(Some(bytes));
        }

        tracing::warn!(model = model, "Gemini response contained no image data");
        return Ok(None);
    }
}
