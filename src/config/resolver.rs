//! Credential resolution per execution context
//!
//! Trusted code (server-side rendering, the proxy route, the CLI) reads the
//! private key pair. Untrusted code only ever sees the `PUBLIC_` pair and has
//! to go through the proxy to read content.

use std::fmt;

use super::CmsEnv;

/// Suffix microCMS appends to every service id
pub const CMS_DOMAIN_SUFFIX: &str = ".microcms.io";

/// Where the calling code runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Has access to private secrets
    Trusted,
    /// Must not see private secrets
    Untrusted,
}

impl ExecutionContext {
    fn api_key_var(self) -> &'static str {
        match self {
            ExecutionContext::Trusted => "MICROCMS_API_KEY",
            ExecutionContext::Untrusted => "PUBLIC_MICROCMS_API_KEY",
        }
    }

    fn service_domain_var(self) -> &'static str {
        match self {
            ExecutionContext::Trusted => "MICROCMS_SERVICE_DOMAIN",
            ExecutionContext::Untrusted => "PUBLIC_MICROCMS_SERVICE_DOMAIN",
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Trusted => write!(f, "trusted"),
            ExecutionContext::Untrusted => write!(f, "untrusted"),
        }
    }
}

/// Required configuration is missing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("{var} is required ({context} context)")]
    MissingApiKey {
        var: &'static str,
        context: ExecutionContext,
    },
    #[error("{var} is required ({context} context)")]
    MissingServiceDomain {
        var: &'static str,
        context: ExecutionContext,
    },
}

/// A microCMS service id, always stored without the `.microcms.io` suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDomain(String);

impl ServiceDomain {
    /// Normalize a configured domain into the bare service id.
    ///
    /// Accepts `myblog`, `myblog.microcms.io` and
    /// `https://myblog.microcms.io/`. Applying it twice changes nothing.
    pub fn normalize(raw: &str) -> String {
        let mut domain = raw.trim();
        for scheme in ["https://", "http://"] {
            if let Some(rest) = domain.strip_prefix(scheme) {
                domain = rest;
            }
        }
        let domain = domain.trim_end_matches('/');
        domain
            .strip_suffix(CMS_DOMAIN_SUFFIX)
            .unwrap_or(domain)
            .to_string()
    }

    /// Parse a configured value; blank values yield `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let id = Self::normalize(raw);
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// The bare service id
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Fully qualified host name
    pub fn host(&self) -> String {
        format!("{}{}", self.0, CMS_DOMAIN_SUFFIX)
    }

    /// Base URL of the content API
    pub fn api_base(&self) -> String {
        format!("https://{}/api/v1", self.host())
    }
}

impl fmt::Display for ServiceDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved key/domain pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub service_domain: ServiceDomain,
}

// Keep the key out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("service_domain", &self.service_domain)
            .finish()
    }
}

/// Pick the key pair for `context`, failing on missing or blank values
pub fn resolve(env: &CmsEnv, context: ExecutionContext) -> Result<Credentials, ConfigurationError> {
    let (api_key, service_domain) = match context {
        ExecutionContext::Trusted => (&env.microcms_api_key, &env.microcms_service_domain),
        ExecutionContext::Untrusted => (
            &env.public_microcms_api_key,
            &env.public_microcms_service_domain,
        ),
    };

    let api_key = api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(ConfigurationError::MissingApiKey {
            var: context.api_key_var(),
            context,
        })?;

    let service_domain = service_domain
        .as_deref()
        .and_then(ServiceDomain::parse)
        .ok_or(ConfigurationError::MissingServiceDomain {
            var: context.service_domain_var(),
            context,
        })?;

    tracing::debug!(%context, service = %service_domain, "Resolved CMS credentials");

    Ok(Credentials {
        api_key: api_key.to_string(),
        service_domain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> CmsEnv {
        CmsEnv {
            microcms_api_key: Some("private-key".to_string()),
            microcms_service_domain: Some("private.microcms.io".to_string()),
            public_microcms_api_key: Some("public-key".to_string()),
            public_microcms_service_domain: Some("public".to_string()),
            public_google_adsense_id: None,
        }
    }

    #[test]
    fn test_normalize_variants() {
        assert_eq!(ServiceDomain::normalize("myblog"), "myblog");
        assert_eq!(ServiceDomain::normalize("myblog.microcms.io"), "myblog");
        assert_eq!(
            ServiceDomain::normalize(" https://myblog.microcms.io/ "),
            "myblog"
        );
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in [
            "myblog",
            "myblog.microcms.io",
            "https://myblog.microcms.io",
            "",
        ] {
            let once = ServiceDomain::normalize(raw);
            assert_eq!(ServiceDomain::normalize(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn test_service_domain_urls() {
        let domain = ServiceDomain::parse("myblog.microcms.io").unwrap();
        assert_eq!(domain.id(), "myblog");
        assert_eq!(domain.host(), "myblog.microcms.io");
        assert_eq!(domain.api_base(), "https://myblog.microcms.io/api/v1");
        assert!(ServiceDomain::parse("  ").is_none());
    }

    #[test]
    fn test_resolve_picks_pair_by_context() {
        let env = full_env();

        let trusted = resolve(&env, ExecutionContext::Trusted).unwrap();
        assert_eq!(trusted.api_key, "private-key");
        assert_eq!(trusted.service_domain.id(), "private");

        let untrusted = resolve(&env, ExecutionContext::Untrusted).unwrap();
        assert_eq!(untrusted.api_key, "public-key");
        assert_eq!(untrusted.service_domain.id(), "public");
    }

    #[test]
    fn test_resolve_missing_values() {
        let mut env = full_env();
        env.microcms_api_key = Some("   ".to_string());
        assert_eq!(
            resolve(&env, ExecutionContext::Trusted).unwrap_err(),
            ConfigurationError::MissingApiKey {
                var: "MICROCMS_API_KEY",
                context: ExecutionContext::Trusted,
            }
        );

        env.public_microcms_service_domain = None;
        let err = resolve(&env, ExecutionContext::Untrusted).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingServiceDomain {
                var: "PUBLIC_MICROCMS_SERVICE_DOMAIN",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "PUBLIC_MICROCMS_SERVICE_DOMAIN is required (untrusted context)"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = resolve(&full_env(), ExecutionContext::Trusted).unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("private-key"));
        assert!(debug.contains("redacted"));
    }
}
