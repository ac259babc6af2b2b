//! Retrieval orchestration: concurrent fan-out over the enabled layers,
//! fan-in in priority order, then the context budget.
//!
//! Every enabled layer gets a key in the resulting bundle, whether it
//! answered, failed, timed out, was cut off by the request deadline, or has
//! no adapter registered. Tenant filtering is the adapter's job; the scope is
//! passed through untouched.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use strata_config::AppConfig;
use strata_core::{
    ContextBundle, FetchBudget, IntentResult, LayerErrorKind, LayerId, LayerResult, TenantScope,
};
use strata_knowledge::LayerRegistry;
use strata_telemetry::TraceRecorder;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Per-layer limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSettings {
    pub timeout: Duration,
    pub max_chunks: usize,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3_000),
            max_chunks: 8,
        }
    }
}

const DEFAULT_CHAR_BUDGET: usize = 12_000;

/// Runs the enabled layers for one request and merges their output.
#[derive(Debug, Clone)]
pub struct RetrievalOrchestrator {
    registry: LayerRegistry,
    settings: HashMap<LayerId, LayerSettings>,
    char_budget: usize,
}

impl RetrievalOrchestrator {
    pub fn new(registry: LayerRegistry) -> Self {
        Self {
            registry,
            settings: HashMap::new(),
            char_budget: DEFAULT_CHAR_BUDGET,
        }
    }

    pub fn with_layer_settings(mut self, id: LayerId, settings: LayerSettings) -> Self {
        self.settings.insert(id, settings);
        self
    }

    pub fn with_char_budget(mut self, chars: usize) -> Self {
        self.char_budget = chars;
        self
    }

    /// Per-layer timeouts and chunk limits from `[layers]`, budget from `[retrieval]`.
    pub fn from_config(config: &AppConfig, registry: LayerRegistry) -> Self {
        LayerId::ALL.into_iter().fold(
            Self::new(registry).with_char_budget(config.retrieval.context_char_budget),
            |orchestrator, id| {
                let layer = config.layers.get(id);
                orchestrator.with_layer_settings(
                    id,
                    LayerSettings {
                        timeout: layer.timeout(),
                        max_chunks: layer.max_chunks,
                    },
                )
            },
        )
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn settings_for(&self, id: LayerId) -> LayerSettings {
        self.settings.get(&id).copied().unwrap_or_default()
    }

    /// Fetch from every layer in `enabled_layers` concurrently and merge the
    /// results in the order given by `intent.layer_priority`.
    ///
    /// Each fetch records `layer:<id>` in `trace`. Fetches still running at
    /// `deadline` are dropped and reported as `deadline_exceeded`.
    pub async fn retrieve(
        &self,
        query_text: &str,
        scope: &TenantScope,
        intent: &IntentResult,
        enabled_layers: &[LayerId],
        deadline: Option<Instant>,
        trace: &TraceRecorder,
    ) -> ContextBundle {
        let started = Instant::now();
        let enabled = dedup(enabled_layers);
        let mut results: HashMap<LayerId, LayerResult> = HashMap::with_capacity(enabled.len());
        let mut pending = FuturesUnordered::new();

        for &id in &enabled {
            let Some(layer) = self.registry.get(id).cloned() else {
                warn!(layer = %id, "Enabled layer has no registered adapter");
                results.insert(id, LayerResult::failure(id, LayerErrorKind::NotRegistered, 0));
                continue;
            };
            let settings = self.settings_for(id);
            let budget = FetchBudget {
                timeout: settings.timeout,
                deadline,
                max_chunks: settings.max_chunks,
            };

            pending.push(async move {
                trace.record(id.stage());
                let fetch_started = Instant::now();
                let outcome =
                    tokio::time::timeout(settings.timeout, layer.fetch(query_text, scope, budget))
                        .await;
                let elapsed_ms = fetch_started.elapsed().as_millis() as u64;

                match outcome {
                    Ok(Ok(mut chunks)) => {
                        chunks.truncate(settings.max_chunks);
                        debug!(layer = %id, chunks = chunks.len(), elapsed_ms, "Layer fetched");
                        LayerResult::success(id, chunks, elapsed_ms)
                    }
                    Ok(Err(e)) => {
                        warn!(layer = %id, error = %e, elapsed_ms, "Layer fetch failed");
                        LayerResult::failure(id, LayerErrorKind::Backend, elapsed_ms)
                    }
                    Err(_) => {
                        warn!(layer = %id, elapsed_ms, "Layer fetch timed out");
                        LayerResult::failure(id, LayerErrorKind::Timeout, elapsed_ms)
                    }
                }
            });
        }

        let collect = async {
            while let Some(result) = pending.next().await {
                results.insert(result.layer_id, result);
            }
        };
        match deadline {
            Some(deadline) => {
                if tokio::time::timeout_at(deadline, collect).await.is_err() {
                    warn!("Request deadline reached during retrieval");
                }
            }
            None => collect.await,
        }
        // Anything still in flight is cancelled here.
        drop(pending);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        for &id in &enabled {
            results.entry(id).or_insert_with(|| {
                warn!(layer = %id, "Layer abandoned at request deadline");
                LayerResult::failure(id, LayerErrorKind::DeadlineExceeded, elapsed_ms)
            });
        }

        let mut ordered: Vec<LayerResult> = merge_order(&intent.layer_priority, &enabled)
            .into_iter()
            .filter_map(|id| results.remove(&id))
            .collect();
        let truncated = enforce_budget(&mut ordered, self.char_budget);
        if truncated > 0 {
            debug!(truncated, budget = self.char_budget, "Context budget applied");
        }

        ContextBundle::new(ordered, truncated)
    }
}

fn dedup(layers: &[LayerId]) -> Vec<LayerId> {
    let mut seen = Vec::with_capacity(layers.len());
    for id in layers {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

/// Priority-listed enabled layers first, then the rest in declaration order.
fn merge_order(priority: &[LayerId], enabled: &[LayerId]) -> Vec<LayerId> {
    let mut order: Vec<LayerId> = priority
        .iter()
        .copied()
        .filter(|id| enabled.contains(id))
        .collect();
    for id in LayerId::ALL {
        if enabled.contains(&id) && !order.contains(&id) {
            order.push(id);
        }
    }
    order
}

/// Drop whole chunks from the tail of the lowest-priority non-empty layer
/// until the total fits. Returns the number of chunks dropped.
fn enforce_budget(layers: &mut [LayerResult], budget: usize) -> usize {
    let mut total: usize = layers.iter().map(LayerResult::chars).sum();
    let mut dropped = 0;
    for layer in layers.iter_mut().rev() {
        while total > budget {
            let Some(chunk) = layer.chunks.pop() else {
                break;
            };
            total -= chunk.text.chars().count();
            dropped += 1;
        }
        if total <= budget {
            break;
        }
    }
    dropped
}
