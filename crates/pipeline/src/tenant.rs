//! Directory-backed tenant resolution.
//!
//! Tenants are listed in configuration and addressed by subdomain
//! (`{tenant_slug}.{base_domain}`) or by an explicit slug. An explicit slug
//! always wins over the host.

use async_trait::async_trait;
use std::collections::HashMap;
use strata_config::{TenantEntry, TenantsConfig};
use strata_core::{Error, RequestIdentity, TenantResolver, TenantScope};
use tracing::debug;

/// Subdomains that never name a tenant.
const RESERVED_SUBDOMAINS: [&str; 8] = [
    "www", "api", "admin", "client", "office", "dev", "staging", "test",
];

/// Resolves identities against the `[tenants]` directory.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    base_domain: String,
    tenants: HashMap<String, TenantEntry>,
}

impl DirectoryResolver {
    pub fn new(config: &TenantsConfig) -> Self {
        let tenants = config
            .entries
            .iter()
            .map(|entry| (entry.slug.to_lowercase(), entry.clone()))
            .collect();
        Self {
            base_domain: config.base_domain.trim_matches('.').to_lowercase(),
            tenants,
        }
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    /// The tenant slug encoded in `host`, if any.
    pub fn slug_from_host(&self, host: &str) -> Option<String> {
        let lowered = host.trim().to_lowercase();
        let host = match lowered.rsplit_once(':') {
            Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                name
            }
            _ => lowered.as_str(),
        };
        let host = host.trim_end_matches('.');

        let slug = host.strip_suffix(&self.base_domain)?.strip_suffix('.')?;
        if slug.is_empty() || slug.contains('.') || RESERVED_SUBDOMAINS.contains(&slug) {
            return None;
        }
        Some(slug.to_string())
    }

    fn identity_slug(&self, identity: &RequestIdentity) -> Option<String> {
        identity
            .tenant_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .or_else(|| identity.host.as_deref().and_then(|h| self.slug_from_host(h)))
    }
}

#[async_trait]
impl TenantResolver for DirectoryResolver {
    async fn resolve(&self, identity: &RequestIdentity) -> Result<TenantScope, Error> {
        let slug = self.identity_slug(identity).ok_or_else(|| {
            Error::UnknownTenant(format!(
                "no tenant in identity (host {:?})",
                identity.host.as_deref().unwrap_or("")
            ))
        })?;

        let tenant = self
            .tenants
            .get(&slug)
            .filter(|t| t.active)
            .ok_or_else(|| Error::UnknownTenant(slug.clone()))?;

        let Some(client_slug) = identity
            .client_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            debug!(tenant_id = %tenant.tenant_id, "Resolved tenant scope");
            return Ok(TenantScope::tenant(&tenant.tenant_id));
        };

        let client = tenant
            .clients
            .iter()
            .find(|c| c.slug.eq_ignore_ascii_case(client_slug))
            .ok_or_else(|| Error::UnknownTenant(format!("{slug}/{client_slug}")))?;

        debug!(tenant_id = %tenant.tenant_id, client_id = %client.client_id, "Resolved client scope");
        let scope = TenantScope::client(&tenant.tenant_id, &client.client_id);
        Ok(match &client.name {
            Some(name) => scope.with_client_name(name),
            None => scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::ClientEntry;

    fn resolver() -> DirectoryResolver {
        DirectoryResolver::new(&TenantsConfig {
            base_domain: "example.com".into(),
            entries: vec![
                TenantEntry {
                    slug: "acme".into(),
                    tenant_id: "tenant-acme".into(),
                    name: "Acme Advisory".into(),
                    active: true,
                    clients: vec![ClientEntry {
                        slug: "globex".into(),
                        client_id: "client-globex".into(),
                        name: Some("Globex Corp".into()),
                    }],
                },
                TenantEntry {
                    slug: "dormant".into(),
                    tenant_id: "tenant-dormant".into(),
                    name: String::new(),
                    active: false,
                    clients: vec![],
                },
            ],
        })
    }

    fn host(h: &str) -> RequestIdentity {
        RequestIdentity {
            host: Some(h.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn host_with_port_resolves() {
        let scope = resolver().resolve(&host("acme.example.com:443")).await.unwrap();
        assert_eq!(scope, TenantScope::tenant("tenant-acme"));
    }

    #[tokio::test]
    async fn explicit_slug_wins_over_host() {
        let identity = RequestIdentity {
            host: Some("other.example.com".into()),
            tenant_slug: Some("ACME".into()),
            client_slug: None,
        };
        let scope = resolver().resolve(&identity).await.unwrap();
        assert_eq!(scope.tenant_id(), "tenant-acme");
    }

    #[tokio::test]
    async fn client_slug_narrows_scope() {
        let identity = RequestIdentity {
            client_slug: Some("globex".into()),
            ..host("acme.example.com")
        };
        let scope = resolver().resolve(&identity).await.unwrap();
        assert_eq!(scope.client_id(), Some("client-globex"));
        assert_eq!(scope.client_name(), Some("Globex Corp"));
    }

    #[tokio::test]
    async fn unresolvable_identities_fail() {
        let resolver = resolver();
        for identity in [
            host("www.example.com"),
            host("api.example.com"),
            host("unknown.example.com"),
            host("acme.elsewhere.org"),
            host("a.b.example.com"),
            host("dormant.example.com"),
            RequestIdentity::default(),
            RequestIdentity {
                client_slug: Some("initech".into()),
                ..host("acme.example.com")
            },
        ] {
            let err = resolver.resolve(&identity).await.unwrap_err();
            assert!(matches!(err, Error::UnknownTenant(_)), "{identity:?}");
        }
    }

    #[test]
    fn slug_extraction() {
        let resolver = resolver();
        assert_eq!(resolver.slug_from_host("Acme.Example.com.").as_deref(), Some("acme"));
        assert_eq!(resolver.slug_from_host("example.com"), None);
        assert_eq!(resolver.slug_from_host("notexample.com"), None);
    }
}
