#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use indexmap::IndexMap;

use super::ChatMessage;
use super::GeneratedImage;

pub const DEFAULT_CHAT_MODEL: &str = "models/gemini-1.5-flash-latest";

/// The model is told to emit this once the full plan has been written out.
pub const PLAN_READY_MARKER: &str = "BUSINESS PLAN GENERATED";

pub const GREETING: &str = "Hello. I am your Professional Consultant, and I will hold us to the 60-page minimum for your plan. Let's begin Meeting 1. What is the proposed Business Name, and what exactly does the business do?";

const SAMPLE_PLAN: &str = r#"
# Executive Summary
This is the executive summary of the business plan.

## Mission Statement
To revolutionize the grant writing process.

# The Cover Page
(This section implies a cover page image)

# Financial Highlights
Our financial projections are robust.

# Operational Plan
We plan to operate globally.
"#;

/// Everything a consultation accumulates. One instance per session, mutated
/// by the front end and persisted wholesale by `SessionStore`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub plan_generated: bool,
    pub plan_text: String,
    /// Section name to illustration, in generation order.
    pub images: IndexMap<String, GeneratedImage>,
    pub selected_model: String,
}

impl Default for ConversationState {
    fn default() -> ConversationState {
        return ConversationState::new(DEFAULT_CHAT_MODEL);
    }
}

impl ConversationState {
    pub fn new(selected_model: &str) -> ConversationState {
        return ConversationState {
            messages: vec![ChatMessage::assistant(GREETING)],
            plan_generated: false,
            plan_text: "".to_string(),
            images: IndexMap::new(),
            selected_model: selected_model.to_string(),
        };
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Appends the assistant reply, and captures it as the plan when the
    /// model signals the plan is complete.
    pub fn record_reply(&mut self, reply: &str) {
        self.add_message(ChatMessage::assistant(reply));

        if reply.contains(PLAN_READY_MARKER) {
            self.plan_generated = true;
            self.plan_text = reply.to_string();
        }
    }

    /// Back to a fresh consultation. The selected model is kept.
    pub fn reset(&mut self) {
        let selected_model = self.selected_model.to_string();
        *self = ConversationState::new(&selected_model);
    }

    /// Loads a small canned plan so the later phases can be exercised without
    /// a full consultation.
    pub fn simulate_plan(&mut self) {
        self.plan_generated = true;
        self.plan_text = SAMPLE_PLAN.to_string();
    }
}
