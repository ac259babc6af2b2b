//! Per-request trace recorder.
//!
//! The recorder is shared by reference between the concurrently running
//! layer fetches of one request, so every mutation goes through a `Mutex`.
//! `record` de-duplicates: a stage appears in the route trace exactly once
//! no matter how many times, or from how many futures, it is recorded.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use strata_core::{LayerId, TraceId};
use tracing::{debug, info};

use crate::model::TraceRecord;

#[derive(Debug, Default)]
struct RecorderState {
    route_trace: Vec<String>,
    layers_accessed: BTreeSet<LayerId>,
    provider_id: Option<String>,
    fallback_used: bool,
}

/// Accumulates the trace of a single request.
#[derive(Debug)]
pub struct TraceRecorder {
    trace_id: TraceId,
    started: Instant,
    state: Mutex<RecorderState>,
}

impl TraceRecorder {
    /// Start recording a new trace.
    pub fn start(trace_id: TraceId) -> Self {
        debug!(trace_id = %trace_id, "Trace started");
        Self {
            trace_id,
            started: Instant::now(),
            state: Mutex::new(RecorderState::default()),
        }
    }

    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append `stage` unless it is already present. Returns whether it was added.
    pub fn record(&self, stage: impl Into<String>) -> bool {
        let stage = stage.into();
        let mut state = self.state();
        if state.route_trace.iter().any(|s| *s == stage) {
            return false;
        }
        state.route_trace.push(stage);
        true
    }

    /// Mark layers as having contributed context.
    pub fn record_layers_accessed(&self, layers: impl IntoIterator<Item = LayerId>) {
        self.state().layers_accessed.extend(layers);
    }

    /// Record which provider answered.
    pub fn set_provider(&self, provider_id: impl Into<String>, fallback_used: bool) {
        let mut state = self.state();
        state.provider_id = Some(provider_id.into());
        state.fallback_used = fallback_used;
    }

    /// Snapshot of the stages recorded so far.
    pub fn stages(&self) -> Vec<String> {
        self.state().route_trace.clone()
    }

    /// Milliseconds since the trace started.
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Seal the trace. Consumes the recorder so the record cannot change
    /// after it has been emitted.
    pub fn finalize(self) -> TraceRecord {
        let elapsed_ms = self.elapsed_ms();
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let record = TraceRecord {
            trace_id: self.trace_id.0,
            route_trace: state.route_trace,
            layers_accessed: state.layers_accessed,
            provider_id: state.provider_id,
            fallback_used: state.fallback_used,
        };

        info!(
            target: "strata::trace",
            trace_id = %record.trace_id,
            route_trace = ?record.route_trace,
            layers_accessed = ?record.layers_accessed,
            provider = record.provider_id.as_deref().unwrap_or("none"),
            fallback_used = record.fallback_used,
            elapsed_ms,
            "Trace finalized"
        );

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn record_is_idempotent_per_stage() {
        let recorder = TraceRecorder::start(TraceId::new());
        assert!(recorder.record("classify"));
        assert!(!recorder.record("classify"));
        assert!(recorder.record("retrieve"));
        assert_eq!(recorder.stages(), vec!["classify", "retrieve"]);
    }

    #[test]
    fn finalize_carries_provider_and_layers() {
        let trace_id = TraceId("fixed".into());
        let recorder = TraceRecorder::start(trace_id);
        recorder.record("generate");
        recorder.record_layers_accessed([LayerId::Client, LayerId::Industry]);
        recorder.set_provider("openai", true);

        let record = recorder.finalize();
        assert_eq!(record.trace_id, "fixed");
        assert_eq!(record.provider_id.as_deref(), Some("openai"));
        assert!(record.fallback_used);
        assert_eq!(
            record.layers_accessed.into_iter().collect::<Vec<_>>(),
            vec![LayerId::Industry, LayerId::Client]
        );
    }

    #[test]
    fn concurrent_threads_do_not_lose_updates() {
        let recorder = Arc::new(TraceRecorder::start(TraceId::new()));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    // Every stage is recorded twice, from two threads.
                    recorder.record(format!("layer:{}", i % 8));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stages = recorder.stages();
        assert_eq!(stages.len(), 8);
        for i in 0..8 {
            assert_eq!(stages.iter().filter(|s| **s == format!("layer:{i}")).count(), 1);
        }
    }

    #[tokio::test]
    async fn concurrent_futures_share_one_recorder() {
        let recorder = TraceRecorder::start(TraceId::new());
        let tasks = LayerId::ALL.map(|layer| {
            let recorder = &recorder;
            async move {
                tokio::task::yield_now().await;
                recorder.record(layer.stage());
            }
        });
        futures::future::join_all(tasks).await;
        assert_eq!(recorder.finalize().layer_stage_count(), 4);
    }
}
