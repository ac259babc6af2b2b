//! Intent categories and the category → layer-priority table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::knowledge::LayerId;

/// What kind of question the user is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentCategory {
    /// General industry/regulatory knowledge.
    ExternalKnowledge,
    /// The client's own rules and data.
    InternalData,
    /// A request for expert judgment or advice.
    ProfessionalJudgment,
    /// A follow-up that refers back to the conversation.
    ContextFollowup,
    /// Classification failed or was inconclusive.
    Unknown,
}

impl IntentCategory {
    /// Every category, in label order.
    pub const ALL: [IntentCategory; 5] = [
        Self::ExternalKnowledge,
        Self::InternalData,
        Self::ProfessionalJudgment,
        Self::ContextFollowup,
        Self::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ExternalKnowledge => "EXTERNAL_KNOWLEDGE",
            Self::InternalData => "INTERNAL_DATA",
            Self::ProfessionalJudgment => "PROFESSIONAL_JUDGMENT",
            Self::ContextFollowup => "CONTEXT_FOLLOWUP",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IntentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.label() == normalized)
            .ok_or_else(|| format!("unknown intent category '{s}'"))
    }
}

/// How the category was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationMethod {
    Keyword,
    Model,
}

/// Output of the intent classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub category: IntentCategory,
    /// Layers, highest priority first.
    pub layer_priority: Vec<LayerId>,
    /// 0.0–1.0
    pub confidence: f32,
    pub method: ClassificationMethod,
    /// Source of the pattern that fired (keyword method only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
}

impl IntentResult {
    /// The result used whenever classification cannot decide.
    pub fn unknown(table: &PriorityTable) -> Self {
        Self {
            category: IntentCategory::Unknown,
            layer_priority: table.priority_for(IntentCategory::Unknown).to_vec(),
            confidence: 0.0,
            method: ClassificationMethod::Keyword,
            matched_pattern: None,
        }
    }
}

/// Static category → ordered layer list mapping.
///
/// This is the per-deployment customization surface; the pipeline never
/// branches on categories itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityTable {
    entries: HashMap<IntentCategory, Vec<LayerId>>,
}

impl PriorityTable {
    /// Build a table; categories without an entry fall back to declaration order.
    pub fn new(entries: HashMap<IntentCategory, Vec<LayerId>>) -> Self {
        Self { entries }
    }

    pub fn priority_for(&self, category: IntentCategory) -> &[LayerId] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&LayerId::ALL)
    }
}

impl Default for PriorityTable {
    fn default() -> Self {
        use LayerId::*;
        let entries = HashMap::from([
            (IntentCategory::ExternalKnowledge, vec![Industry, Shared, Client, History]),
            (IntentCategory::InternalData, vec![Client, Shared, History, Industry]),
            (IntentCategory::ProfessionalJudgment, vec![Industry, Client, Shared, History]),
            (IntentCategory::ContextFollowup, vec![History, Client, Shared, Industry]),
            (IntentCategory::Unknown, LayerId::ALL.to_vec()),
        ]);
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_roundtrip_through_from_str() {
        for category in IntentCategory::ALL {
            assert_eq!(category.label().parse::<IntentCategory>().unwrap(), category);
        }
        assert!("LEGAL".parse::<IntentCategory>().is_err());
    }

    #[test]
    fn default_table_puts_history_first_for_followups() {
        let table = PriorityTable::default();
        assert_eq!(
            table.priority_for(IntentCategory::ContextFollowup)[0],
            LayerId::History
        );
        assert_eq!(table.priority_for(IntentCategory::Unknown), &LayerId::ALL);
    }

    #[test]
    fn missing_entry_falls_back_to_declaration_order() {
        let table = PriorityTable::new(HashMap::new());
        assert_eq!(
            table.priority_for(IntentCategory::InternalData),
            &LayerId::ALL
        );
    }

    #[test]
    fn unknown_result_has_zero_confidence() {
        let result = IntentResult::unknown(&PriorityTable::default());
        assert_eq!(result.category, IntentCategory::Unknown);
        assert_eq!(result.method, ClassificationMethod::Keyword);
        assert_eq!(result.confidence, 0.0);
    }
}
