//! In-process trace log: keeps the most recent finalized traces and
//! serves summary statistics over them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use strata_core::LayerId;

use crate::model::TraceRecord;

/// Upper bound on retained traces; the oldest tenth is pruned when reached.
pub const MAX_TRACES: usize = 5_000;

/// A finalized trace plus the time it was logged.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedTrace {
    pub record: TraceRecord,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregates over the retained traces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceStats {
    pub total: usize,
    /// Answered by a provider other than the first in priority.
    pub fallback_count: usize,
    /// No provider answered.
    pub failed_count: usize,
    /// How many traces each layer contributed context to.
    pub layer_hits: BTreeMap<LayerId, usize>,
    /// Answers per provider id.
    pub by_provider: BTreeMap<String, usize>,
}

/// Thread-safe, bounded sink for finalized traces.
#[derive(Debug)]
pub struct TraceLog {
    traces: RwLock<Vec<LoggedTrace>>,
    capacity: usize,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TRACES)
    }

    /// Log bounded at `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            traces: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<LoggedTrace>> {
        self.traces.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<LoggedTrace>> {
        self.traces.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Append a finalized trace.
    pub fn push(&self, record: TraceRecord) {
        let mut traces = self.write();
        if traces.len() >= self.capacity {
            let drain = (self.capacity / 10).max(1);
            traces.drain(..drain);
            tracing::debug!(pruned = drain, "Trace log pruned");
        }
        traces.push(LoggedTrace {
            record,
            recorded_at: Utc::now(),
        });
    }

    /// Look up a trace by id.
    pub fn get(&self, trace_id: &str) -> Option<LoggedTrace> {
        self.read()
            .iter()
            .find(|t| t.record.trace_id == trace_id)
            .cloned()
    }

    /// The `limit` most recent traces, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LoggedTrace> {
        self.read().iter().rev().take(limit).cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn stats(&self) -> TraceStats {
        let traces = self.read();
        let mut stats = TraceStats {
            total: traces.len(),
            ..Default::default()
        };
        for t in traces.iter() {
            if t.record.fallback_used {
                stats.fallback_count += 1;
            }
            match &t.record.provider_id {
                Some(id) => *stats.by_provider.entry(id.clone()).or_default() += 1,
                None => stats.failed_count += 1,
            }
            for layer in &t.record.layers_accessed {
                *stats.layer_hits.entry(*layer).or_default() += 1;
            }
        }
        stats
    }
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::new()
    }
}
