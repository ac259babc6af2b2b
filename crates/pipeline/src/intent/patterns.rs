//! Stage 1 keyword matching.
//!
//! Pattern groups are evaluated in a fixed order and the first group with a
//! match decides the category. Anaphora markers only count when the
//! conversation already has history to refer back to.

use regex_lite::{Regex, RegexBuilder};
use strata_config::ClassifierConfig;
use strata_core::IntentCategory;
use tracing::debug;

use super::ClassificationError;

/// Compiled patterns for one category.
#[derive(Debug, Clone)]
struct PatternGroup {
    category: IntentCategory,
    patterns: Vec<Regex>,
}

/// Which pattern fired for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub category: IntentCategory,
    pub pattern: String,
}

/// Ordered keyword groups plus the follow-up markers.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    groups: Vec<PatternGroup>,
    anaphora: Vec<Regex>,
}

impl KeywordMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. Groups are tried in the order they were added.
    pub fn with_group<S: AsRef<str>>(
        mut self,
        category: IntentCategory,
        sources: &[S],
    ) -> Result<Self, ClassificationError> {
        let patterns = sources
            .iter()
            .map(|s| compile(category.label(), s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.groups.push(PatternGroup { category, patterns });
        Ok(self)
    }

    pub fn with_anaphora<S: AsRef<str>>(mut self, sources: &[S]) -> Result<Self, ClassificationError> {
        for source in sources {
            self.anaphora.push(compile("anaphora", source.as_ref())?);
        }
        Ok(self)
    }

    /// Compile the `[classifier]` section, groups in `order`.
    pub fn from_config(
        config: &ClassifierConfig,
        order: &[IntentCategory],
    ) -> Result<Self, ClassificationError> {
        let mut matcher = Self::new();
        for category in order {
            let sources = config
                .patterns
                .get(category.label())
                .map(Vec::as_slice)
                .unwrap_or_default();
            if sources.is_empty() {
                debug!(category = %category, "No keyword patterns configured");
            }
            matcher = matcher.with_group(*category, sources)?;
        }
        matcher.with_anaphora(&config.anaphora)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// First matching group, else CONTEXT_FOLLOWUP if the query is anaphoric
    /// and there is history.
    pub fn find(&self, query_text: &str, has_history: bool) -> Option<KeywordMatch> {
        let query = query_text.trim();

        for group in &self.groups {
            if let Some(pattern) = group.patterns.iter().find(|p| p.is_match(query)) {
                return Some(KeywordMatch {
                    category: group.category,
                    pattern: pattern.as_str().to_string(),
                });
            }
        }

        if !has_history {
            return None;
        }
        self.anaphora
            .iter()
            .find(|p| p.is_match(query))
            .map(|pattern| KeywordMatch {
                category: IntentCategory::ContextFollowup,
                pattern: pattern.as_str().to_string(),
            })
    }
}

fn compile(category: &str, source: &str) -> Result<Regex, ClassificationError> {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .map_err(|e| ClassificationError::InvalidPattern {
            category: category.to_string(),
            pattern: source.to_string(),
            reason: e.to_string(),
        })
}
