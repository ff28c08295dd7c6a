#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name expected by the Generative Language API, which calls the
    /// assistant side of a conversation `model`.
    pub fn as_backend_role(&self) -> &'static str {
        match self {
            Role::User => return "user",
            Role::Assistant => return "model",
        }
    }
}

/// A single entry in the consultation transcript. Messages are never edited
/// once appended to a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> ChatMessage {
        return ChatMessage {
            role,
            content: content.to_string(),
        };
    }

    pub fn user(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::Assistant, content);
    }
}
