//! Configuration loading, validation, and management for Strata.
//!
//! Loads configuration from `~/.strata/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use strata_core::{IntentCategory, LayerId, PersonaConfig, PriorityTable};

/// The root configuration structure.
///
/// Maps directly to `~/.strata/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// How many recent conversation turns travel with a request.
    #[serde(default = "default_recent_turns_limit")]
    pub recent_turns_limit: usize,

    /// Whole-request deadline in milliseconds.
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,

    /// Provider ids, tried in this order.
    #[serde(default = "default_provider_priority")]
    pub provider_priority: Vec<String>,

    /// Per-layer settings
    #[serde(default)]
    pub layers: LayersConfig,

    /// Who the assistant speaks as
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Category → ordered layer ids
    #[serde(default = "default_priority")]
    pub priority: BTreeMap<String, Vec<String>>,

    /// Intent classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Content-quality fallback for client-specific answers
    #[serde(default)]
    pub quality_gate: QualityGateConfig,

    /// Provider-specific configurations
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Tenant directory
    #[serde(default)]
    pub tenants: TenantsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_recent_turns_limit() -> usize {
    5
}
fn default_request_deadline_ms() -> u64 {
    30_000
}
fn default_provider_priority() -> Vec<String> {
    vec!["anthropic".into(), "openai".into()]
}
fn default_true() -> bool {
    true
}

fn default_priority() -> BTreeMap<String, Vec<String>> {
    let table = PriorityTable::default();
    IntentCategory::ALL
        .into_iter()
        .map(|category| {
            let layers = table
                .priority_for(category)
                .iter()
                .map(|l| l.as_str().to_string())
                .collect();
            (category.label().to_string(), layers)
        })
        .collect()
}

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    BTreeMap::from([
        (
            "anthropic".to_string(),
            ProviderConfig {
                kind: ProviderKind::Anthropic,
                model: "claude-sonnet-4-20250514".into(),
                ..ProviderConfig::default()
            },
        ),
        (
            "openai".to_string(),
            ProviderConfig {
                kind: ProviderKind::OpenAi,
                model: "gpt-4o".into(),
                ..ProviderConfig::default()
            },
        ),
        (
            "gemini".to_string(),
            ProviderConfig {
                kind: ProviderKind::Gemini,
                model: "gemini-2.0-flash".into(),
                ..ProviderConfig::default()
            },
        ),
    ])
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("recent_turns_limit", &self.recent_turns_limit)
            .field("request_deadline_ms", &self.request_deadline_ms)
            .field("provider_priority", &self.provider_priority)
            .field("layers", &self.layers)
            .field("persona", &self.persona)
            .field("priority", &self.priority)
            .field("classifier", &self.classifier)
            .field("retrieval", &self.retrieval)
            .field("quality_gate", &self.quality_gate)
            .field("providers", &self.providers)
            .field("tenants", &self.tenants)
            .field("logging", &self.logging)
            .finish()
    }
}

// ── Layers ────────────────────────────────────────────────────────────────

/// One knowledge layer's settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-fetch timeout in milliseconds.
    #[serde(default = "default_layer_timeout_ms")]
    pub timeout_ms: u64,

    /// Upper bound on chunks a single fetch may return.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// JSONL corpus backing the reference in-memory layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus: Option<PathBuf>,
}

fn default_layer_timeout_ms() -> u64 {
    3_000
}
fn default_max_chunks() -> usize {
    8
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_layer_timeout_ms(),
            max_chunks: default_max_chunks(),
            corpus: None,
        }
    }
}

impl LayerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `[layers.L1]`, `[layers.L3]`, `[layers.L4]`, `[layers.L5]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayersConfig {
    #[serde(rename = "L1", default)]
    pub industry: LayerConfig,
    #[serde(rename = "L3", default)]
    pub shared: LayerConfig,
    #[serde(rename = "L4", default)]
    pub client: LayerConfig,
    #[serde(rename = "L5", default)]
    pub history: LayerConfig,
}

impl LayersConfig {
    pub fn get(&self, id: LayerId) -> &LayerConfig {
        match id {
            LayerId::Industry => &self.industry,
            LayerId::Shared => &self.shared,
            LayerId::Client => &self.client,
            LayerId::History => &self.history,
        }
    }

    pub fn get_mut(&mut self, id: LayerId) -> &mut LayerConfig {
        match id {
            LayerId::Industry => &mut self.industry,
            LayerId::Shared => &mut self.shared,
            LayerId::Client => &mut self.client,
            LayerId::History => &mut self.history,
        }
    }
}

// ── Classifier ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Provider used for model classification. Defaults to the head of
    /// `provider_priority`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,

    /// Keyword groups are tried in this order; first match wins.
    #[serde(default = "default_group_order")]
    pub group_order: Vec<String>,

    /// Markers that make an otherwise unmatched query a follow-up
    /// (only when there is conversation history).
    #[serde(default = "default_anaphora")]
    pub anaphora: Vec<String>,

    /// Category label → regex pattern sources (case-insensitive).
    #[serde(default = "default_patterns")]
    pub patterns: BTreeMap<String, Vec<String>>,
}

fn default_classifier_timeout_ms() -> u64 {
    5_000
}

fn default_group_order() -> Vec<String> {
    [
        IntentCategory::InternalData,
        IntentCategory::ExternalKnowledge,
        IntentCategory::ProfessionalJudgment,
    ]
    .into_iter()
    .map(|c| c.label().to_string())
    .collect()
}

fn default_anaphora() -> Vec<String> {
    [
        r"^(it|that|this|those|these|they|he|she)\b",
        r"\b(what about|how about|tell me more|more detail|elaborate|go on|and then)\b",
        r"\b(above|aforementioned|you mentioned|earlier|previous)\b",
        r"^(そ|こ|あ)(れ|の)",
        r"^(上記|前述|さっき|先ほど)",
        r"(もう少し|詳しく|具体的に)",
        r"^(では|じゃあ|なら|ということは)",
        r"(続き|続けて|もっと)",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_patterns() -> BTreeMap<String, Vec<String>> {
    let group = |patterns: &[&str]| patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        (
            IntentCategory::InternalData.label().to_string(),
            group(&[
                r"\b(our|my) (company|firm|organi[sz]ation|office|team)\b",
                r"\b(our|internal|in-house|company) (rules?|polic(y|ies)|regulations?|handbook|guidelines?)\b",
                r"(当社|弊社|うちの会社|御社|わが社|自社)",
                r"(社内|会社の)(規程|規則|ルール|制度)",
            ]),
        ),
        (
            IntentCategory::ExternalKnowledge.label().to_string(),
            group(&[
                r"\b(article|section|clause|paragraph)\s+\d+",
                r"\b(law|act|statute|regulation|ordinance)s?\b.*\b(what|when|who|which)\b",
                r"\b(legal|statutory) (obligations?|rights?|requirements?)\b",
                r"第?\d+条",
                r"(何条|何項|何号)",
                r"(法律|法令|制度|規定).*(どう|何|いつ|誰)",
            ]),
        ),
        (
            IntentCategory::ProfessionalJudgment.label().to_string(),
            group(&[
                r"\b(should (we|i)|how (should|can|do) (we|i))\b",
                r"\b(advice|advise|recommend(ation)?|opinion)\b",
                r"\b(risks?|pros and cons|trade-?offs?)\b",
                r"(どうすれば|どうしたら|どのように)",
                r"(アドバイス|助言|意見|見解)",
                r"(メリット|デメリット|リスク)",
            ]),
        ),
    ])
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: None,
            timeout_ms: default_classifier_timeout_ms(),
            group_order: default_group_order(),
            anaphora: default_anaphora(),
            patterns: default_patterns(),
        }
    }
}

// ── Retrieval / quality gate ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Total characters of retrieved text allowed into one prompt.
    #[serde(default = "default_context_char_budget")]
    pub context_char_budget: usize,
}

fn default_context_char_budget() -> usize {
    12_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_char_budget: default_context_char_budget(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGateConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Answers shorter than this (in characters) are rejected.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,

    /// Answers containing any of these are rejected.
    #[serde(default = "default_reject_phrases")]
    pub reject_phrases: Vec<String>,
}

fn default_min_chars() -> usize {
    50
}

fn default_reject_phrases() -> Vec<String> {
    [
        "could not find",
        "no relevant information",
        "is not mentioned",
        "見当たりませんでした",
        "確認できませんでした",
        "記載がありません",
        "見つかりませんでした",
        "該当する規定はありません",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_chars: default_min_chars(),
            reject_phrases: default_reject_phrases(),
        }
    }
}

// ── Providers ─────────────────────────────────────────────────────────────

/// Which wire protocol a provider speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible `/chat/completions`.
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    /// Google `generateContent`.
    Gemini,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the vendor's default endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default)]
    pub model: String,

    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_provider_timeout_ms() -> u64 {
    20_000
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_temperature() -> f32 {
    0.3
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            api_url: None,
            model: String::new(),
            timeout_ms: default_provider_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

// ── Tenants ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantsConfig {
    /// Hosts look like `{tenant_slug}.{base_domain}`.
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    #[serde(default)]
    pub entries: Vec<TenantEntry>,
}

fn default_base_domain() -> String {
    "example.com".into()
}

impl Default for TenantsConfig {
    fn default() -> Self {
        Self {
            base_domain: default_base_domain(),
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantEntry {
    pub slug: String,
    pub tenant_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub clients: Vec<ClientEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEntry {
    pub slug: String,
    pub client_id: String,
    /// Display name shown in prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ── Logging ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ── AppConfig ─────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from the default path (~/.strata/config.toml)
    /// and apply process environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"), |key| {
            std::env::var(key).ok()
        })
    }

    /// Load from `path`, apply overrides from `lookup`, then validate.
    pub fn load_with_env(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without environment
    /// overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for id in LayerId::ALL {
            let flag = id.env_flag();
            if let Some(raw) = lookup(&flag) {
                match parse_bool(&raw) {
                    Some(enabled) => self.layers.get_mut(id).enabled = enabled,
                    None => tracing::warn!(flag = %flag, value = %raw, "Ignoring non-boolean layer flag"),
                }
            }
        }

        if let Some(raw) = lookup("L5_K_RECENT") {
            match raw.trim().parse() {
                Ok(k) => self.recent_turns_limit = k,
                Err(_) => tracing::warn!(value = %raw, "Ignoring non-numeric L5_K_RECENT"),
            }
        }

        if let Some(primary) = lookup("PRIMARY_LLM") {
            let primary = primary.trim().to_lowercase();
            if !primary.is_empty() {
                self.provider_priority.retain(|p| *p != primary);
                self.provider_priority.insert(0, primary);
            }
        }

        for (var, kind) in [
            ("ANTHROPIC_API_KEY", ProviderKind::Anthropic),
            ("OPENAI_API_KEY", ProviderKind::OpenAi),
            ("GOOGLE_API_KEY", ProviderKind::Gemini),
        ] {
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                for provider in self.providers.values_mut() {
                    if provider.kind == kind && provider.api_key.is_none() {
                        provider.api_key = Some(key.clone());
                    }
                }
            }
        }

        if let Some(name) = lookup("PERSONA_NAME") {
            self.persona.persona_name = name;
        }
        if let Some(name) = lookup("SERVICE_NAME") {
            self.persona.institution_name = name;
        }
        if let Some(domain) = lookup("BASE_DOMAIN") {
            self.tenants.base_domain = domain;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".strata")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.persona
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.request_deadline_ms == 0 {
            return Err(ConfigError::ValidationError(
                "request_deadline_ms must be > 0".into(),
            ));
        }

        if self.provider_priority.is_empty() {
            return Err(ConfigError::ValidationError(
                "provider_priority must name at least one provider".into(),
            ));
        }

        for id in LayerId::ALL {
            if self.layers.get(id).timeout_ms == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "layers.{id}.timeout_ms must be > 0"
                )));
            }
        }

        self.priority_table()?;
        self.group_order()?;
        for label in self.classifier.patterns.keys() {
            parse_category(label)?;
        }

        for (id, provider) in &self.providers {
            if !(0.0..=2.0).contains(&provider.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{id}.temperature must be between 0.0 and 2.0"
                )));
            }
        }

        let mut slugs = HashSet::new();
        for tenant in &self.tenants.entries {
            if tenant.slug.trim().is_empty() || tenant.tenant_id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "tenant entries need a slug and a tenant_id".into(),
                ));
            }
            if !slugs.insert(tenant.slug.to_lowercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate tenant slug '{}'",
                    tenant.slug
                )));
            }
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "logging.format must be 'pretty' or 'json', got '{other}'"
            ))),
        }
    }

    /// Enabled layers in declaration order.
    pub fn enabled_layers(&self) -> Vec<LayerId> {
        LayerId::ALL
            .into_iter()
            .filter(|id| self.layers.get(*id).enabled)
            .collect()
    }

    /// The `[priority]` section as a typed table.
    pub fn priority_table(&self) -> Result<PriorityTable, ConfigError> {
        let mut entries = HashMap::new();
        for (label, layers) in &self.priority {
            let category = parse_category(label)?;
            let mut parsed = Vec::with_capacity(layers.len());
            for raw in layers {
                let layer: LayerId = raw.parse().map_err(|e: String| {
                    ConfigError::ValidationError(format!("priority.{label}: {e}"))
                })?;
                if parsed.contains(&layer) {
                    return Err(ConfigError::ValidationError(format!(
                        "priority.{label}: layer {layer} listed twice"
                    )));
                }
                parsed.push(layer);
            }
            entries.insert(category, parsed);
        }
        Ok(PriorityTable::new(entries))
    }

    /// Classifier keyword groups in evaluation order.
    pub fn group_order(&self) -> Result<Vec<IntentCategory>, ConfigError> {
        self.classifier
            .group_order
            .iter()
            .map(|label| {
                let category = parse_category(label)?;
                if category == IntentCategory::Unknown {
                    return Err(ConfigError::ValidationError(
                        "classifier.group_order cannot contain UNKNOWN".into(),
                    ));
                }
                Ok(category)
            })
            .collect()
    }

    /// Provider used for model classification.
    pub fn classifier_provider(&self) -> Option<&str> {
        self.classifier
            .provider
            .as_deref()
            .or_else(|| self.provider_priority.first().map(String::as_str))
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    /// Check if any configured provider has an API key.
    pub fn has_api_key(&self) -> bool {
        self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `strata config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_category(label: &str) -> Result<IntentCategory, ConfigError> {
    label.parse().map_err(ConfigError::ValidationError)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recent_turns_limit: default_recent_turns_limit(),
            request_deadline_ms: default_request_deadline_ms(),
            provider_priority: default_provider_priority(),
            layers: LayersConfig::default(),
            persona: PersonaConfig::default(),
            priority: default_priority(),
            classifier: ClassifierConfig::default(),
            retrieval: RetrievalConfig::default(),
            quality_gate: QualityGateConfig::default(),
            providers: default_providers(),
            tenants: TenantsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for strata_core::Error {
    fn from(e: ConfigError) -> Self {
        strata_core::Error::config(e.to_string())
    }
}
