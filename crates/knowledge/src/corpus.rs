//! Corpus documents and the JSONL loader.
//!
//! Each line of a corpus file is one JSON-encoded [`Document`]. Corrupted
//! lines are skipped with a warning so one bad record cannot take a layer
//! offline.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_core::{LayerId, TenantScope};
use tracing::{debug, warn};

use crate::CorpusError;

/// Who may see a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Partition {
    /// Industry-common, visible to every tenant.
    Global,
    /// Shared across one tenant's clients.
    Tenant { tenant_id: String },
    /// One client of one tenant.
    Client { tenant_id: String, client_id: String },
}

impl Partition {
    /// The partition kind a layer stores.
    pub fn expected_for(layer: LayerId) -> &'static str {
        match layer {
            LayerId::Industry => "global",
            LayerId::Shared => "tenant",
            LayerId::Client | LayerId::History => "client",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Tenant { .. } => "tenant",
            Self::Client { .. } => "client",
        }
    }

    /// Whether a request in `scope` may read this partition.
    pub fn visible_to(&self, scope: &TenantScope) -> bool {
        match self {
            Self::Global => true,
            Self::Tenant { tenant_id } => tenant_id == scope.tenant_id(),
            Self::Client {
                tenant_id,
                client_id,
            } => tenant_id == scope.tenant_id() && scope.client_id() == Some(client_id.as_str()),
        }
    }
}

/// One searchable unit of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    /// Citation label (file name, URL, article number).
    pub source: String,
    #[serde(flatten)]
    pub partition: Partition,
}

impl Document {
    pub fn global(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            partition: Partition::Global,
        }
    }

    pub fn tenant(
        tenant_id: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            partition: Partition::Tenant {
                tenant_id: tenant_id.into(),
            },
        }
    }

    pub fn client(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            partition: Partition::Client {
                tenant_id: tenant_id.into(),
                client_id: client_id.into(),
            },
        }
    }
}

/// Load documents from a JSONL file.
pub fn load_jsonl(path: &Path) -> Result<Vec<Document>, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let documents: Vec<Document> = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str::<Document>(line) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(path = %path.display(), line = n + 1, error = %e, "Skipping corrupted corpus entry");
                None
            }
        })
        .collect();

    debug!(path = %path.display(), count = documents.len(), "Corpus loaded");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partition_visibility() {
        let acme = TenantScope::tenant("acme");
        let acme_widgets = TenantScope::client("acme", "widgets");

        assert!(Partition::Global.visible_to(&acme));

        let shared = Partition::Tenant {
            tenant_id: "acme".into(),
        };
        assert!(shared.visible_to(&acme));
        assert!(!shared.visible_to(&TenantScope::tenant("globex")));

        let client = Partition::Client {
            tenant_id: "acme".into(),
            client_id: "widgets".into(),
        };
        assert!(client.visible_to(&acme_widgets));
        assert!(!client.visible_to(&acme));
        assert!(!client.visible_to(&TenantScope::client("acme", "gadgets")));
        assert!(!client.visible_to(&TenantScope::client("globex", "widgets")));
    }

    #[test]
    fn loads_jsonl_and_skips_corrupted_lines() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#"{{"text":"Article 15: notice","source":"act.pdf","scope":"global"}}"#).unwrap();
        writeln!(tmp, "this is not json").unwrap();
        writeln!(tmp).unwrap();
        writeln!(
            tmp,
            r#"{{"text":"Leave policy","source":"handbook","scope":"client","tenant_id":"acme","client_id":"widgets"}}"#
        )
        .unwrap();

        let docs = load_jsonl(tmp.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].partition, Partition::Global);
        assert_eq!(
            docs[1],
            Document::client("acme", "widgets", "Leave policy", "handbook")
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_jsonl(Path::new("/nonexistent/strata-corpus.jsonl")).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}
