//! Environment-sourced CMS settings

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Secrets and identifiers read from the process environment.
///
/// The `public_*` values are the ones allowed to reach untrusted code; the
/// unprefixed pair is server-only.
#[derive(Clone, Default, Deserialize)]
pub struct CmsEnv {
    pub microcms_api_key: Option<String>,
    pub microcms_service_domain: Option<String>,
    pub public_microcms_api_key: Option<String>,
    pub public_microcms_service_domain: Option<String>,
    pub public_google_adsense_id: Option<String>,
}

impl fmt::Debug for CmsEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("CmsEnv")
            .field("microcms_api_key", &redact(&self.microcms_api_key))
            .field("microcms_service_domain", &self.microcms_service_domain)
            .field("public_microcms_api_key", &redact(&self.public_microcms_api_key))
            .field(
                "public_microcms_service_domain",
                &self.public_microcms_service_domain,
            )
            .field("public_google_adsense_id", &self.public_google_adsense_id)
            .finish()
    }
}

impl CmsEnv {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        envy::from_env::<CmsEnv>().context("Failed to read CMS settings from environment")
    }

    /// Load `<dir>/.env` if present, then read the environment.
    ///
    /// Variables already set in the process take precedence over the file.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let env_path = dir.as_ref().join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)
                .with_context(|| format!("Failed to load {:?}", env_path))?;
            tracing::debug!("Loaded environment from {:?}", env_path);
        }
        Self::from_env()
    }

    /// Build settings from explicit key/value pairs
    #[cfg(test)]
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into()));
        envy::from_iter::<_, CmsEnv>(pairs).context("Invalid CMS settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs() {
        let env = CmsEnv::from_pairs([
            ("MICROCMS_API_KEY", "secret"),
            ("MICROCMS_SERVICE_DOMAIN", "myblog"),
            ("PUBLIC_GOOGLE_ADSENSE_ID", "ca-pub-1"),
            ("UNRELATED", "ignored"),
        ])
        .unwrap();

        assert_eq!(env.microcms_api_key.as_deref(), Some("secret"));
        assert_eq!(env.microcms_service_domain.as_deref(), Some("myblog"));
        assert_eq!(env.public_google_adsense_id.as_deref(), Some("ca-pub-1"));
        assert!(env.public_microcms_api_key.is_none());
    }

    #[test]
    fn test_load_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "PUBLIC_MICROCMS_SERVICE_DOMAIN=dotenv-service\n",
        )
        .unwrap();

        let env = CmsEnv::load(dir.path()).unwrap();
        assert_eq!(
            env.public_microcms_service_domain.as_deref(),
            Some("dotenv-service")
        );
    }
}
