//! `strata ask`: Answer one query through the full pipeline.

use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_config::AppConfig;
use strata_core::{Error, LayerId, RequestIdentity, TenantResolver, TenantScope, Turn};
use strata_knowledge::ConversationStore;
use strata_pipeline::{DirectoryResolver, Pipeline};
use tokio::time::Instant;
use tracing::{info, warn};

/// Tenant used when no tenant directory is configured.
const LOCAL_TENANT: &str = "local";

#[derive(Args, Debug, Clone, Default)]
pub struct AskArgs {
    /// The question to answer
    #[arg(short, long)]
    pub message: String,

    /// Resolve the tenant from a host name (`{tenant}.{base_domain}`)
    #[arg(long, conflicts_with = "tenant")]
    pub host: Option<String>,

    /// Tenant slug
    #[arg(long)]
    pub tenant: Option<String>,

    /// Client slug within the tenant
    #[arg(long)]
    pub client: Option<String>,

    /// Comma-separated subset of the configured layers to query (e.g. L1,L4)
    #[arg(long)]
    pub layers: Option<String>,

    /// Comma-separated provider priority, overriding configuration
    #[arg(long)]
    pub providers: Option<String>,

    /// JSON file of prior turns; the new exchange is appended to it
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Print the route trace after the answer
    #[arg(long)]
    pub trace: bool,
}

pub async fn run(config: &AppConfig, args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let scope = resolve_scope(config, &args).await?;
    let enabled = select_layers(config, args.layers.as_deref())?;
    let priority = match &args.providers {
        Some(raw) => parse_list(raw),
        None => config.provider_priority.clone(),
    };
    let mut turns = match &args.history {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };

    let store = Arc::new(ConversationStore::new());
    store.extend(&scope, turns.iter().cloned()).await;

    let layers = strata_knowledge::build_from_config(config, store)?;
    let providers = strata_providers::build_from_config(config);
    if providers.is_empty() {
        return Err("No provider is configured. Set ANTHROPIC_API_KEY, OPENAI_API_KEY or GOOGLE_API_KEY, \
            or add [providers.<id>] with an api_url."
            .into());
    }
    let pipeline = Pipeline::from_config(config, providers, layers)?;

    info!(scope = %scope, layers = ?enabled, providers = ?priority, "Asking");
    let deadline = Instant::now() + config.request_deadline();
    let response = pipeline
        .handle(&args.message, &scope, &turns, &enabled, &priority, deadline)
        .await?;

    println!("{}", response.answer);
    if args.trace {
        println!();
        println!("{}", serde_json::to_string_pretty(&response.trace)?);
    }

    if let Some(path) = &args.history {
        turns.push(Turn::user(args.message.trim()));
        turns.push(Turn::assistant(response.answer));
        std::fs::write(path, serde_json::to_string_pretty(&turns)?)?;
    }

    Ok(())
}

/// Directory lookup when tenants are configured, else a local scope built
/// from the raw slugs.
async fn resolve_scope(config: &AppConfig, args: &AskArgs) -> Result<TenantScope, Error> {
    let resolver = DirectoryResolver::new(&config.tenants);
    if resolver.is_empty() {
        let tenant = args.tenant.as_deref().unwrap_or(LOCAL_TENANT);
        return Ok(match &args.client {
            Some(client) => TenantScope::client(tenant, client),
            None => TenantScope::tenant(tenant),
        });
    }

    resolver
        .resolve(&RequestIdentity {
            host: args.host.clone(),
            tenant_slug: args.tenant.clone(),
            client_slug: args.client.clone(),
        })
        .await
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_layers(raw: &str) -> Result<Vec<LayerId>, String> {
    parse_list(raw).iter().map(|s| s.parse()).collect()
}

/// `--layers` narrows the configured set; it never turns a disabled layer on.
fn select_layers(config: &AppConfig, raw: Option<&str>) -> Result<Vec<LayerId>, String> {
    let configured = config.enabled_layers();
    let Some(raw) = raw else {
        return Ok(configured);
    };
    let mut selected = parse_layers(raw)?;
    selected.retain(|id| {
        let allowed = configured.contains(id);
        if !allowed {
            warn!(layer = %id, flag = %id.env_flag(), "Layer is disabled in configuration, ignoring");
        }
        allowed
    });
    Ok(selected)
}

fn load_history(path: &Path) -> Result<Vec<Turn>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::{ClientEntry, TenantEntry};

    #[test]
    fn parses_layer_lists() {
        assert_eq!(parse_layers("L1, l4").unwrap(), vec![LayerId::Industry, LayerId::Client]);
        assert!(parse_layers("L2").is_err());
        assert!(parse_layers("").unwrap().is_empty());
    }

    #[test]
    fn layer_flag_only_narrows_configured_layers() {
        let mut config = AppConfig::default();
        config.apply_env(|key| (key == "L4_ENABLED").then(|| "false".to_string()));

        assert_eq!(
            select_layers(&config, None).unwrap(),
            vec![LayerId::Industry, LayerId::Shared, LayerId::History]
        );
        assert!(select_layers(&config, Some("L4")).unwrap().is_empty());
        assert_eq!(
            select_layers(&config, Some("L4,L1")).unwrap(),
            vec![LayerId::Industry]
        );
        assert!(select_layers(&config, Some("L9")).is_err());
    }

    #[tokio::test]
    async fn disabled_client_layer_stays_out_of_the_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("client.jsonl");
        std::fs::write(
            &corpus,
            r#"{"text":"Client leave policy","source":"handbook","scope":"client","tenant_id":"local","client_id":"c1"}"#,
        )
        .unwrap();
        let mut config = AppConfig::default();
        config.layers.client.corpus = Some(corpus);
        config.apply_env(|key| (key == "L4_ENABLED").then(|| "false".to_string()));

        let enabled = select_layers(&config, Some("L4")).unwrap();
        let layers =
            strata_knowledge::build_from_config(&config, Arc::new(ConversationStore::new()))
                .unwrap();
        let orchestrator = strata_pipeline::RetrievalOrchestrator::from_config(&config, layers);
        let trace = strata_telemetry::TraceRecorder::start(strata_core::TraceId::new());
        let bundle = orchestrator
            .retrieve(
                "leave policy",
                &TenantScope::client("local", "c1"),
                &strata_core::IntentResult::unknown(&strata_core::PriorityTable::default()),
                &enabled,
                None,
                &trace,
            )
            .await;

        assert!(bundle.get(LayerId::Client).is_none());
        assert!(trace.finalize().layers_accessed.is_empty());
    }

    #[test]
    fn parses_provider_lists() {
        assert_eq!(parse_list(" openai,,anthropic "), vec!["openai", "anthropic"]);
    }

    #[tokio::test]
    async fn local_scope_without_directory() {
        let args = AskArgs {
            message: "q".into(),
            client: Some("c1".into()),
            ..Default::default()
        };
        let scope = resolve_scope(&AppConfig::default(), &args).await.unwrap();
        assert_eq!(scope, TenantScope::client(LOCAL_TENANT, "c1"));
    }

    #[tokio::test]
    async fn directory_scope_from_host() {
        let mut config = AppConfig::default();
        config.tenants.entries.push(TenantEntry {
            slug: "acme".into(),
            tenant_id: "t-acme".into(),
            name: "Acme".into(),
            active: true,
            clients: vec![ClientEntry {
                slug: "globex".into(),
                client_id: "c-globex".into(),
                name: None,
            }],
        });
        let args = AskArgs {
            message: "q".into(),
            host: Some("acme.example.com:8443".into()),
            client: Some("globex".into()),
            ..Default::default()
        };
        let scope = resolve_scope(&config, &args).await.unwrap();
        assert_eq!(scope.partition_key(), "t-acme#c-globex");

        let unknown = AskArgs {
            host: Some("nobody.example.com".into()),
            ..args
        };
        assert!(matches!(
            resolve_scope(&config, &unknown).await,
            Err(Error::UnknownTenant(_))
        ));
    }

    #[test]
    fn history_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        assert!(load_history(&path).unwrap().is_empty());

        let turns = vec![Turn::user("hi"), Turn::assistant("hello")];
        std::fs::write(&path, serde_json::to_string(&turns).unwrap()).unwrap();
        assert_eq!(load_history(&path).unwrap(), turns);
    }
}
