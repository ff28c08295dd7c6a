#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use indexmap::IndexMap;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ChatMessage;
use super::ConversationState;
use super::GeneratedImage;

/// On disk shape of a session. Every field is optional so older or hand
/// edited files only restore what they contain.
#[derive(Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_generated: Option<bool>,
    #[serde(
        default,
        rename = "generated_plan_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub plan_text: Option<String>,
    #[serde(
        default,
        rename = "generated_images",
        skip_serializing_if = "Option::is_none"
    )]
    pub images: Option<IndexMap<String, GeneratedImage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,
}

impl From<&ConversationState> for SessionRecord {
    fn from(state: &ConversationState) -> SessionRecord {
        return SessionRecord {
            messages: Some(state.messages.clone()),
            plan_generated: Some(state.plan_generated),
            plan_text: Some(state.plan_text.to_string()),
            images: Some(state.images.clone()),
            selected_model: Some(state.selected_model.to_string()),
        };
    }
}

impl SessionRecord {
    /// Copies the fields present in the record onto `state`, leaving the rest
    /// untouched.
    pub fn apply(self, state: &mut ConversationState) {
        if let Some(messages) = self.messages {
            state.messages = messages;
        }
        if let Some(plan_generated) = self.plan_generated {
            state.plan_generated = plan_generated;
        }
        if let Some(plan_text) = self.plan_text {
            state.plan_text = plan_text;
        }
        if let Some(images) = self.images {
            state.images = images;
        }
        if let Some(selected_model) = self.selected_model {
            state.selected_model = selected_model;
        }
    }
}
