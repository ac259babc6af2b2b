//! The request pipeline: classify → retrieve → assemble → generate.
//!
//! One [`Pipeline`] is built at startup and shared across requests. It holds
//! no per-request state; each call to [`Pipeline::handle`] starts its own
//! trace and finalizes it before returning, on success and on failure.

use serde::Serialize;
use std::sync::Arc;
use strata_config::AppConfig;
use strata_core::message::estimated_tokens;
use strata_core::{Error, IntentResult, LayerId, PersonaConfig, QueryContext, TenantScope, Turn};
use strata_knowledge::LayerRegistry;
use strata_providers::{FallbackDispatcher, ProviderRegistry, QualityGate};
use strata_telemetry::{TraceLog, TraceRecord, TraceRecorder, stage};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::intent::IntentClassifier;
use crate::prompt::{PromptAssembler, PromptInput};
use crate::retrieval::RetrievalOrchestrator;

/// Default number of prior turns carried into the prompt.
const DEFAULT_RECENT_TURNS: usize = 5;

/// The answer to one request plus how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResponse {
    pub answer: String,
    pub trace: TraceRecord,
    pub intent: IntentResult,
    /// The answer came from a later provider because an earlier one was
    /// rejected by the quality gate.
    pub quality_fallback: bool,
    /// Latency of the provider call that produced the answer.
    pub latency_ms: u64,
    /// Chunks dropped by the context budget.
    pub truncated_chunks: usize,
}

/// Wires the four stages together.
#[derive(Debug, Clone)]
pub struct Pipeline {
    classifier: IntentClassifier,
    retrieval: RetrievalOrchestrator,
    dispatcher: FallbackDispatcher,
    persona: PersonaConfig,
    recent_turns_limit: usize,
    trace_log: Option<Arc<TraceLog>>,
}

impl Pipeline {
    /// Fails when the persona is incomplete.
    pub fn new(
        classifier: IntentClassifier,
        retrieval: RetrievalOrchestrator,
        dispatcher: FallbackDispatcher,
        persona: PersonaConfig,
    ) -> Result<Self, Error> {
        persona.validate()?;
        Ok(Self {
            classifier,
            retrieval,
            dispatcher,
            persona,
            recent_turns_limit: DEFAULT_RECENT_TURNS,
            trace_log: None,
        })
    }

    /// Build every stage from configuration around the given registries.
    pub fn from_config(
        config: &AppConfig,
        providers: ProviderRegistry,
        layers: LayerRegistry,
    ) -> Result<Self, Error> {
        let classifier = IntentClassifier::from_config(config, &providers)?;
        let retrieval = RetrievalOrchestrator::from_config(config, layers);
        let dispatcher = FallbackDispatcher::new(providers)
            .with_quality_gate(QualityGate::from_config(&config.quality_gate));

        Ok(Self::new(classifier, retrieval, dispatcher, config.persona.clone())?
            .with_recent_turns_limit(config.recent_turns_limit))
    }

    pub fn with_recent_turns_limit(mut self, limit: usize) -> Self {
        self.recent_turns_limit = limit;
        self
    }

    /// Retain finalized traces in `log`.
    pub fn with_trace_log(mut self, log: Arc<TraceLog>) -> Self {
        self.trace_log = Some(log);
        self
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn retrieval(&self) -> &RetrievalOrchestrator {
        &self.retrieval
    }

    pub fn dispatcher(&self) -> &FallbackDispatcher {
        &self.dispatcher
    }

    /// Answer one query.
    ///
    /// Only `enabled_layers` are fetched and only `provider_priority` is
    /// walked. Fails with [`Error::AllProvidersFailed`] when no provider
    /// answers before `deadline`.
    pub async fn handle(
        &self,
        query_text: &str,
        tenant_scope: &TenantScope,
        recent_turns: &[Turn],
        enabled_layers: &[LayerId],
        provider_priority: &[String],
        deadline: Instant,
    ) -> Result<PipelineResponse, Error> {
        if query_text.trim().is_empty() {
            return Err(Error::InvalidRequest("message is required".into()));
        }

        let ctx = QueryContext::new(
            query_text,
            tenant_scope.clone(),
            recent_turns,
            self.recent_turns_limit,
        );
        let trace = TraceRecorder::start(ctx.trace_id().clone());
        trace.record(stage::PIPELINE);
        info!(
            trace_id = %ctx.trace_id(),
            tenant_id = ctx.tenant_scope().tenant_id(),
            client_id = ctx.tenant_scope().client_id().unwrap_or("-"),
            layers = enabled_layers.len(),
            "Handling query"
        );

        trace.record(stage::CLASSIFY);
        let intent = self
            .classifier
            .classify(ctx.query_text(), ctx.recent_turns(), Some(deadline))
            .await;

        trace.record(stage::RETRIEVE);
        let bundle = self
            .retrieval
            .retrieve(
                ctx.query_text(),
                ctx.tenant_scope(),
                &intent,
                enabled_layers,
                Some(deadline),
                &trace,
            )
            .await;
        trace.record_layers_accessed(bundle.layers_accessed.iter().copied());

        trace.record(stage::ASSEMBLE);
        let messages = match PromptAssembler::assemble(&PromptInput {
            persona: &self.persona,
            bundle: &bundle,
            query_text: ctx.query_text(),
            recent_turns: ctx.recent_turns(),
            scope: ctx.tenant_scope(),
        }) {
            Ok(messages) => messages,
            Err(e) => {
                error!(trace_id = %ctx.trace_id(), error = %e, "Prompt assembly failed");
                self.finish(trace);
                return Err(e);
            }
        };

        debug!(
            trace_id = %ctx.trace_id(),
            messages = messages.len(),
            estimated_tokens = estimated_tokens(&messages),
            truncated = bundle.truncated_chunks,
            "Prompt assembled"
        );

        trace.record(stage::GENERATE);
        let generated = self
            .dispatcher
            .generate(
                &messages,
                provider_priority,
                deadline,
                bundle.has_context(LayerId::Client),
            )
            .await;

        match generated {
            Ok(response) => {
                trace.set_provider(&response.provider_id, response.fallback_used);
                let record = self.finish(trace);
                Ok(PipelineResponse {
                    answer: response.content,
                    trace: record,
                    intent,
                    quality_fallback: response.quality_fallback,
                    latency_ms: response.latency_ms,
                    truncated_chunks: bundle.truncated_chunks,
                })
            }
            Err(failed) => {
                error!(trace_id = %ctx.trace_id(), error = %failed, "No provider produced an answer");
                self.finish(trace);
                Err(failed.into())
            }
        }
    }

    fn finish(&self, trace: TraceRecorder) -> TraceRecord {
        let record = trace.finalize();
        if let Some(log) = &self.trace_log {
            log.push(record.clone());
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, StubLayer};
    use std::time::Duration;
    use strata_core::{ProviderError, ProviderFailureKind, Role};

    struct Fixture {
        industry: Arc<StubLayer>,
        client: Arc<StubLayer>,
        primary: Arc<ScriptedProvider>,
        secondary: Arc<ScriptedProvider>,
        log: Arc<TraceLog>,
        pipeline: Pipeline,
    }

    fn fixture(primary: ScriptedProvider, secondary: ScriptedProvider) -> Fixture {
        let industry = Arc::new(StubLayer::answering(LayerId::Industry, &["Overtime is capped at 45 hours."]));
        let client = Arc::new(StubLayer::answering(LayerId::Client, &["Acme pays overtime monthly."]));
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let log = Arc::new(TraceLog::new());

        let layers = LayerRegistry::new().with(industry.clone()).with(client.clone());
        let providers = ProviderRegistry::new()
            .with(primary.clone(), Duration::from_secs(5))
            .with(secondary.clone(), Duration::from_secs(5));
        let pipeline = Pipeline::from_config(&AppConfig::default(), providers, layers)
            .unwrap()
            .with_trace_log(log.clone());

        Fixture {
            industry,
            client,
            primary,
            secondary,
            log,
            pipeline,
        }
    }

    fn priority() -> Vec<String> {
        vec!["primary".into(), "secondary".into()]
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn happy_path_records_every_stage_in_order() {
        let f = fixture(
            ScriptedProvider::single_text("primary", "It is capped at 45 hours."),
            ScriptedProvider::new("secondary", vec![]),
        );
        let scope = TenantScope::client("t1", "c1");

        let response = f
            .pipeline
            .handle(
                "What does Article 36 say about overtime?",
                &scope,
                &[],
                &[LayerId::Industry, LayerId::Client],
                &priority(),
                deadline(),
            )
            .await
            .unwrap();

        assert_eq!(response.answer, "It is capped at 45 hours.");
        let trace = &response.trace;
        assert_eq!(trace.route_trace[..3], ["pipeline", "classify", "retrieve"]);
        assert_eq!(trace.layer_stage_count(), 2);
        assert_eq!(trace.route_trace[5..], ["assemble", "generate"]);
        assert_eq!(trace.provider_id.as_deref(), Some("primary"));
        assert!(!trace.fallback_used);
        assert_eq!(trace.layers_accessed.len(), 2);
        assert_eq!(f.secondary.call_count(), 0);
        assert_eq!(f.log.count(), 1);
    }

    #[tokio::test]
    async fn prompt_reaches_provider_with_context_and_turns() {
        let f = fixture(
            ScriptedProvider::single_text("primary", "Monthly."),
            ScriptedProvider::new("secondary", vec![]),
        );
        let scope = TenantScope::client("t1", "c1").with_client_name("Acme");
        let turns = vec![Turn::user("Hi"), Turn::assistant("Hello!")];

        f.pipeline
            .handle("When is overtime paid?", &scope, &turns, &[LayerId::Client], &priority(), deadline())
            .await
            .unwrap();

        let sent = &f.primary.received()[0];
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[0].content.contains("Acme pays overtime monthly."));
        assert!(!sent[0].content.contains("45 hours"));
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[3].content, "When is overtime paid?");
        assert_eq!(f.industry.call_count(), 0);
        assert_eq!(f.client.seen_scopes(), vec![scope]);
    }

    #[tokio::test]
    async fn blank_query_is_rejected_before_any_work() {
        let f = fixture(
            ScriptedProvider::single_text("primary", "unused"),
            ScriptedProvider::new("secondary", vec![]),
        );

        for query in ["", "   \n\t"] {
            let err = f
                .pipeline
                .handle(query, &TenantScope::tenant("t1"), &[], &[LayerId::Industry], &priority(), deadline())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }
        assert_eq!(f.industry.call_count(), 0);
        assert_eq!(f.primary.call_count(), 0);
        assert_eq!(f.log.count(), 0);
    }

    #[tokio::test]
    async fn failing_primary_falls_back() {
        let f = fixture(
            ScriptedProvider::failing("primary", ProviderError::RateLimited { retry_after_secs: 5 }),
            ScriptedProvider::single_text("secondary", "Fallback answer."),
        );

        let response = f
            .pipeline
            .handle("hello", &TenantScope::tenant("t1"), &[], &[LayerId::Industry], &priority(), deadline())
            .await
            .unwrap();

        assert_eq!(response.answer, "Fallback answer.");
        assert_eq!(response.trace.provider_id.as_deref(), Some("secondary"));
        assert!(response.trace.fallback_used);
    }

    #[tokio::test]
    async fn all_providers_failing_is_an_error_but_still_traced() {
        let f = fixture(
            ScriptedProvider::failing("primary", ProviderError::Timeout("slow".into())),
            ScriptedProvider::failing("secondary", ProviderError::Malformed("junk".into())),
        );
        let mut providers = priority();
        providers.push("missing".into());

        let err = f
            .pipeline
            .handle("hello", &TenantScope::tenant("t1"), &[], &[], &providers, deadline())
            .await
            .unwrap_err();

        let Error::AllProvidersFailed(failed) = err else {
            panic!("expected AllProvidersFailed");
        };
        let kinds: Vec<_> = failed.failures.iter().map(|failure| failure.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ProviderFailureKind::Timeout,
                ProviderFailureKind::Malformed,
                ProviderFailureKind::NotRegistered
            ]
        );

        let logged = f.log.recent(1);
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].record.provider_id, None);
        assert!(logged[0].record.visited(stage::GENERATE));
    }

    #[tokio::test]
    async fn no_enabled_layers_still_answers() {
        let f = fixture(
            ScriptedProvider::single_text("primary", "General answer."),
            ScriptedProvider::new("secondary", vec![]),
        );

        let response = f
            .pipeline
            .handle("hello", &TenantScope::tenant("t1"), &[], &[], &priority(), deadline())
            .await
            .unwrap();

        assert_eq!(response.answer, "General answer.");
        assert_eq!(response.trace.layer_stage_count(), 0);
        assert!(response.trace.layers_accessed.is_empty());
        assert_eq!(f.industry.call_count() + f.client.call_count(), 0);
    }

    #[tokio::test]
    async fn response_serializes_with_nested_trace() {
        let f = fixture(
            ScriptedProvider::single_text("primary", "Yes."),
            ScriptedProvider::new("secondary", vec![]),
        );
        let response = f
            .pipeline
            .handle("hello", &TenantScope::tenant("t1"), &[], &[], &priority(), deadline())
            .await
            .unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["answer"], "Yes.");
        assert_eq!(json["trace"]["provider"], "primary");
        assert_eq!(json["intent"]["category"], "UNKNOWN");
    }

    #[test]
    fn incomplete_persona_is_rejected_at_construction() {
        let mut config = AppConfig::default();
        config.persona.persona_name.clear();
        let err = Pipeline::from_config(&config, ProviderRegistry::new(), LayerRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
