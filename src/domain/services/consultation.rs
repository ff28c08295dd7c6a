#[cfg(test)]
#[path = "consultation_test.rs"]
mod tests;

use tokio::sync::mpsc;

use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendRef;
use crate::domain::models::BackendResponse;
use crate::domain::models::ChatMessage;
use crate::domain::models::ConversationState;
use crate::domain::models::PLAN_READY_MARKER;

pub const MISSING_KEY_REPLY: &str = "Please provide an API Key to chat.";

pub fn consultant_persona() -> String {
    return format!(
        r#"You are a senior business plan and grant proposal consultant. You once chaired a grant awarding board, so you know what funders look for, and your clients have raised hundreds of millions in funding.

Your job is to interview the user and then write a complete business plan of at least 60 pages. Longer is fine when the user gives you more material. Elaborate with market analysis and concrete figures wherever you can.

The plan must cover, in this order:
1. Cover Page: business name, contact details, slogan.
2. Executive Summary: the core idea, goals, the funding ask, expected returns.
3. Introduction: overview, stage of the business, progress so far.
4. Company Description: history, legal structure, location, vision, mission, SMART objectives.
5. The Product & Service: product line, research plans, production, value proposition, IP.
6. Market Research: industry trends, market size, segmentation, competitors (SWOT and PESTLE), regulation.
7. Organization and Management: structure, team, hiring and training.
8. Marketing and Sales Strategy: channels, tactics, pricing, promotion, customer service, unit economics.
9. Operational Plan: key processes, technology, supply chain, quality, risk, scalability.
10. Funding Request: requirements, future needs, equity, use of funds, outcomes, exit strategy.
11. Financial Projections: 3 to 5 year revenue and expenses, P&L, cash flow, balance sheet, break-even.
12. Implementation Plan: 3, 6 and 12 month actions, monitoring, milestones.
13. Appendix: resumes, permits, legal documents, references.

Run the consultation as three meetings and ask exactly one question at a time:
- Meeting 1: name, legal structure, vision, mission, and the grant or funding being pursued.
- Meeting 2: market research, operations, marketing.
- Meeting 3: budget, revenue projections, implementation timeline.

Be professional, warm, and thorough.

When the meetings are done, write the full plan as markdown. Start every numbered section with a `# ` heading and use `## ` for subsections. Finish the message with the line:
{PLAN_READY_MARKER}"#
    );
}

/// Sends the user's message to the chat model and records the reply. Model
/// failures become an assistant message instead of an error.
pub struct Consultation<'a> {
    backend: BackendRef<'a>,
}

impl<'a> Consultation<'a> {
    pub fn new(backend: BackendRef<'a>) -> Consultation<'a> {
        return Consultation { backend };
    }

    /// Returns the assistant reply that was appended to `state`.
    pub async fn respond(
        &self,
        state: &mut ConversationState,
        user_text: &str,
        tx: &mpsc::UnboundedSender<BackendResponse>,
    ) -> String {
        state.add_message(ChatMessage::user(user_text));

        if !self.backend.has_credential() {
            state.add_message(ChatMessage::assistant(MISSING_KEY_REPLY));
            return MISSING_KEY_REPLY.to_string();
        }

        let prompt = BackendPrompt::new(&consultant_persona(), &state.messages);
        let res = self
            .backend
            .get_completion(&state.selected_model, prompt, tx)
            .await;

        match res {
            Ok(reply) => {
                state.record_reply(&reply);
                if state.plan_generated {
                    tracing::info!(chars = reply.len(), "Business plan captured");
                }
                return reply;
            }
            Err(err) => {
                tracing::error!(error = ?err, "Chat completion failed");
                let reply = format!("I encountered an error: {err}");
                state.add_message(ChatMessage::assistant(&reply));
                return reply;
            }
        }
    }
}
