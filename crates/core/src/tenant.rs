//! Tenant scope: the isolation boundary of a request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The tenant (and optionally client) a request is scoped to.
///
/// Constructed once by a [`TenantResolver`] and then only ever shared by
/// reference; there is no way to mutate a scope after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    tenant_id: String,
    client_id: Option<String>,
    client_name: Option<String>,
}

impl TenantScope {
    /// A tenant-level scope (no client layers).
    pub fn tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: None,
            client_name: None,
        }
    }

    /// A client-level scope.
    pub fn client(tenant_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: Some(client_id.into()),
            client_name: None,
        }
    }

    /// Attach a display name for the client (prompt only, never used to filter).
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    pub fn has_client(&self) -> bool {
        self.client_id.is_some()
    }

    /// Composite key for per-conversation storage: `tenant` or `tenant#client`.
    pub fn partition_key(&self) -> String {
        match &self.client_id {
            Some(client) => format!("{}#{}", self.tenant_id, client),
            None => self.tenant_id.clone(),
        }
    }
}

impl std::fmt::Display for TenantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.partition_key())
    }
}

/// The inbound identity handed to a resolver by the API layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestIdentity {
    /// `Host` (or `X-Forwarded-Host`) header value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Explicit tenant slug; wins over `host`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_slug: Option<String>,
    /// Client slug (e.g. first path segment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_slug: Option<String>,
}

/// Maps an inbound identity to a tenant scope.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    /// Fails with [`Error::UnknownTenant`] when the identity is unresolvable.
    async fn resolve(&self, identity: &RequestIdentity) -> std::result::Result<TenantScope, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_key_includes_client() {
        assert_eq!(TenantScope::tenant("t_1").partition_key(), "t_1");
        assert_eq!(TenantScope::client("t_1", "c_9").partition_key(), "t_1#c_9");
    }

    #[test]
    fn client_name_is_display_only() {
        let a = TenantScope::client("t_1", "c_9");
        let b = a.clone().with_client_name("Acme Ltd");
        assert_eq!(a.client_id(), b.client_id());
        assert_eq!(b.client_name(), Some("Acme Ltd"));
        assert!(b.has_client());
    }
}
