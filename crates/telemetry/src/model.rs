//! Data model for per-request traces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strata_core::LayerId;

// ── Stage names ───────────────────────────────────────────────────────────

/// Well-known pipeline stage names recorded in `route_trace`.
///
/// Layer fetches record `layer:<id>` (see [`LayerId::stage`]).
pub mod stage {
    pub const PIPELINE: &str = "pipeline";
    pub const CLASSIFY: &str = "classify";
    pub const RETRIEVE: &str = "retrieve";
    pub const ASSEMBLE: &str = "assemble";
    pub const GENERATE: &str = "generate";
}

// ── TraceRecord ───────────────────────────────────────────────────────────

/// The finalized, immutable trace of one request.
///
/// Serializes to the boundary shape consumed by downstream observability:
/// `trace_id`, `route_trace`, `layers_accessed`, `provider`, `fallback_used`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub trace_id: String,
    /// Stage names in the order they were entered. Each appears once.
    pub route_trace: Vec<String>,
    /// Layers that contributed at least one chunk.
    pub layers_accessed: BTreeSet<LayerId>,
    /// Which provider answered; `None` when dispatch failed.
    #[serde(rename = "provider")]
    pub provider_id: Option<String>,
    pub fallback_used: bool,
}

impl TraceRecord {
    /// Whether `stage` was entered.
    pub fn visited(&self, stage: &str) -> bool {
        self.route_trace.iter().any(|s| s == stage)
    }

    /// Number of `layer:*` stages recorded.
    pub fn layer_stage_count(&self) -> usize {
        self.route_trace
            .iter()
            .filter(|s| s.starts_with("layer:"))
            .count()
    }

    /// JSON rendering of the boundary shape.
    pub fn to_json(&self) -> Result<String, crate::TelemetryError> {
        Ok(serde_json::to_string(self)?)
    }
}
