#[cfg(test)]
#[path = "planner_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use serde_derive::Deserialize;

use crate::domain::models::BackendError;
use crate::domain::models::BackendRef;
use crate::domain::models::VisualItem;

/// Only the head of the plan is sent for analysis.
pub const ANALYSIS_CHAR_LIMIT: usize = 10_000;
pub const MAX_RETRIES: u32 = 3;
pub const VISUAL_COUNT: usize = 10;

#[derive(Deserialize)]
struct RawVisual {
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Deserialize)]
struct VisualPlanPayload {
    #[serde(default)]
    visuals: Vec<RawVisual>,
}

/// Asks a language model which sections of a plan deserve an illustration,
/// and what each illustration should show.
pub struct VisualPlanner<'a> {
    backend: BackendRef<'a>,
    model: String,
    backoff_unit: Duration,
}

impl<'a> VisualPlanner<'a> {
    pub fn new(backend: BackendRef<'a>, model: &str) -> VisualPlanner<'a> {
        return VisualPlanner {
            backend,
            model: model.to_string(),
            backoff_unit: Duration::from_secs(1),
        };
    }

    /// Rate limit retries wait 2, 4, then 8 of these units.
    pub fn with_backoff_unit(mut self, backoff_unit: Duration) -> VisualPlanner<'a> {
        self.backoff_unit = backoff_unit;
        return self;
    }

    pub fn build_prompt(plan_text: &str, style: &str) -> String {
        let excerpt = plan_text
            .chars()
            .take(ANALYSIS_CHAR_LIMIT)
            .collect::<String>();

        return format!(
            r#"Analyze the following Business Plan text and identify {VISUAL_COUNT} key sections that would benefit from visual illustrations (e.g. 'The Cover Page', 'Product Demo', 'Team Section', 'Office Location').

For each section, write a specific, detailed image generation prompt in the visual style '{style}'.

Return the result strictly as a JSON object with the following structure:
{{
    "visuals": [
        {{
            "section": "Section Name",
            "prompt": "Detailed image prompt..."
        }}
    ]
}}

Business Plan Text (Excerpt):
{excerpt}"#
        );
    }

    pub fn fallback(style: &str) -> Vec<VisualItem> {
        return vec![
            VisualItem::new(
                "The Cover Page",
                &format!("Professional business cover page, {style}"),
            ),
            VisualItem::new(
                "Financial Highlights",
                &format!("Financial growth chart, {style}"),
            ),
        ];
    }

    /// Pulls the JSON out of a reply that may be wrapped in a markdown fence.
    pub fn extract_payload(text: &str) -> &str {
        if let Some((_, rest)) = text.split_once("```json") {
            return rest.split("```").next().unwrap_or(rest);
        }

        if text.contains("```") {
            return text.split("```").nth(1).unwrap_or(text);
        }

        return text;
    }

    pub fn parse(text: &str) -> Result<Vec<VisualItem>> {
        let payload: VisualPlanPayload =
            serde_json::from_str(VisualPlanner::extract_payload(text).trim())?;

        let items = payload
            .visuals
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                return VisualItem {
                    section: raw
                        .section
                        .unwrap_or_else(|| return format!("Section {}", idx + 1)),
                    prompt: raw.prompt.unwrap_or_default(),
                };
            })
            .collect();

        return Ok(items);
    }

    /// Calls the model, retrying on rate limits only. `Ok(None)` means the
    /// retries ran out.
    async fn request(&self, prompt: &str) -> Result<Option<String>> {
        let mut attempt = 0;
        loop {
            let err = match self.backend.generate_text(&self.model, prompt).await {
                Ok(text) => return Ok(Some(text)),
                Err(err) => err,
            };

            if !BackendError::is_rate_limit_err(&err) {
                return Err(err);
            }

            if attempt >= MAX_RETRIES {
                tracing::error!(attempts = attempt + 1, "Quota exceeded for visual analysis");
                return Ok(None);
            }

            attempt += 1;
            let wait = self.backoff_unit * 2u32.pow(attempt);
            tracing::warn!(
                attempt = attempt,
                wait_ms = wait.as_millis() as u64,
                "Visual analysis rate limited, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Never fails. Exhausted retries give an empty list, any other failure
    /// gives the two item fallback.
    pub async fn plan(&self, plan_text: &str, style: &str) -> Vec<VisualItem> {
        let prompt = VisualPlanner::build_prompt(plan_text, style);

        let text = match self.request(&prompt).await {
            Ok(Some(text)) => text,
            Ok(None) => return vec![],
            Err(err) => {
                tracing::error!(error = ?err, "Error analyzing plan for visuals");
                return VisualPlanner::fallback(style);
            }
        };

        match VisualPlanner::parse(&text) {
            Ok(items) => {
                tracing::debug!(count = items.len(), "Planned visuals");
                return items;
            }
            Err(err) => {
                tracing::error!(error = ?err, "Visual plan was not valid JSON");
                return VisualPlanner::fallback(style);
            }
        }
    }
}
