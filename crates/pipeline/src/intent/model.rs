//! Stage 2 model classification: one few-shot call, label extracted from the reply.

use std::sync::Arc;
use std::time::Duration;
use strata_core::{ChatMessage, IntentCategory, ProviderAdapter, Turn};
use tokio::time::Instant;

use super::ClassificationError;

const INSTRUCTIONS: &str = "You classify questions sent to a professional advisory assistant.
Answer with exactly one label and nothing else.

Labels:
- EXTERNAL_KNOWLEDGE: general laws, regulations, industry standards, public facts
- INTERNAL_DATA: the client's own rules, records, contracts or organisation
- PROFESSIONAL_JUDGMENT: a request for advice, an opinion or a recommendation
- CONTEXT_FOLLOWUP: refers back to something said earlier in the conversation

Examples:
Q: What is the statutory overtime limit? -> EXTERNAL_KNOWLEDGE
Q: How many paid leave days does our handbook give new hires? -> INTERNAL_DATA
Q: Is it a good idea to switch to a flex-time system? -> PROFESSIONAL_JUDGMENT
Q: And what happens if we miss that? -> CONTEXT_FOLLOWUP";

/// How many trailing turns are shown to the model for follow-up detection.
const CONTEXT_TURNS: usize = 2;

/// Longest reply echoed back in an error.
const REPLY_PREVIEW_CHARS: usize = 80;

/// Asks a provider for the category when no keyword matched.
#[derive(Clone)]
pub(crate) struct ModelClassifier {
    adapter: Arc<dyn ProviderAdapter>,
    timeout: Duration,
}

impl ModelClassifier {
    pub(crate) fn new(adapter: Arc<dyn ProviderAdapter>, timeout: Duration) -> Self {
        Self { adapter, timeout }
    }

    pub(crate) fn provider_id(&self) -> &str {
        self.adapter.id()
    }

    pub(crate) async fn classify(
        &self,
        query_text: &str,
        recent_turns: &[Turn],
        deadline: Option<Instant>,
    ) -> Result<IntentCategory, ClassificationError> {
        let budget = match deadline {
            Some(deadline) => self
                .timeout
                .min(deadline.saturating_duration_since(Instant::now())),
            None => self.timeout,
        };
        if budget.is_zero() {
            return Err(ClassificationError::Timeout);
        }

        let messages = few_shot_messages(query_text, recent_turns);
        let reply = tokio::time::timeout(budget, self.adapter.call(&messages, budget))
            .await
            .map_err(|_| ClassificationError::Timeout)??;

        parse_label(&reply).ok_or_else(|| {
            ClassificationError::UnrecognisedLabel(reply.chars().take(REPLY_PREVIEW_CHARS).collect())
        })
    }
}

impl std::fmt::Debug for ModelClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClassifier")
            .field("provider", &self.adapter.id())
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub(crate) fn few_shot_messages(query_text: &str, recent_turns: &[Turn]) -> Vec<ChatMessage> {
    let start = recent_turns.len().saturating_sub(CONTEXT_TURNS);
    let mut user = String::new();
    if start < recent_turns.len() {
        user.push_str("Recent conversation:\n");
        for turn in &recent_turns[start..] {
            user.push_str(&format!("{}: {}\n", turn.role.as_str(), turn.content));
        }
        user.push('\n');
    }
    user.push_str(&format!("Q: {} ->", query_text.trim()));

    vec![ChatMessage::system(INSTRUCTIONS), ChatMessage::user(user)]
}

/// The earliest category label appearing in the upper-cased reply.
pub(crate) fn parse_label(reply: &str) -> Option<IntentCategory> {
    let upper = reply.to_uppercase();
    IntentCategory::ALL
        .into_iter()
        .filter(|c| *c != IntentCategory::Unknown)
        .filter_map(|c| upper.find(c.label()).map(|pos| (pos, c)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_label_in_reply() {
        assert_eq!(parse_label("internal_data"), Some(IntentCategory::InternalData));
        assert_eq!(
            parse_label("Label: PROFESSIONAL_JUDGMENT (not EXTERNAL_KNOWLEDGE)"),
            Some(IntentCategory::ProfessionalJudgment)
        );
        assert_eq!(parse_label("I am not sure"), None);
        assert_eq!(parse_label("UNKNOWN"), None);
    }

    #[test]
    fn prompt_lists_every_label_and_recent_turns() {
        let turns = vec![Turn::user("first"), Turn::assistant("second"), Turn::user("third")];
        let messages = few_shot_messages("  and then? ", &turns);
        assert_eq!(messages.len(), 2);
        for category in IntentCategory::ALL.iter().filter(|c| **c != IntentCategory::Unknown) {
            assert!(messages[0].content.contains(category.label()));
        }
        assert!(!messages[1].content.contains("first"));
        assert!(messages[1].content.contains("assistant: second"));
        assert!(messages[1].content.ends_with("Q: and then? ->"));
    }
}
