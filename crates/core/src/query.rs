//! The per-request unit of work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Turn;
use crate::tenant::TenantScope;

/// Opaque per-request identifier, generated once at request entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the pipeline knows about one request. Read-only once built.
#[derive(Debug, Clone)]
pub struct QueryContext {
    query_text: String,
    tenant_scope: TenantScope,
    recent_turns: Vec<Turn>,
    trace_id: TraceId,
}

impl QueryContext {
    /// Build a context, keeping only the last `max_turns` turns.
    pub fn new(
        query_text: impl Into<String>,
        tenant_scope: TenantScope,
        recent_turns: &[Turn],
        max_turns: usize,
    ) -> Self {
        let start = recent_turns.len().saturating_sub(max_turns);
        Self {
            query_text: query_text.into(),
            tenant_scope,
            recent_turns: recent_turns[start..].to_vec(),
            trace_id: TraceId::new(),
        }
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn tenant_scope(&self) -> &TenantScope {
        &self.tenant_scope
    }

    pub fn recent_turns(&self) -> &[Turn] {
        &self.recent_turns
    }

    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }
}
