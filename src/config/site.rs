//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    /// Public origin of the site, used to reach the proxy from untrusted code
    pub url: String,
    pub proxy_path: String,
    /// Overrides `https://{service}.microcms.io/api/v1`
    pub api_base: Option<String>,

    // Directory
    pub public_dir: String,

    // Listing
    pub per_page: usize,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Engineer's Diary".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "ja".to_string(),

            url: "http://localhost:3000".to_string(),
            proxy_path: "/api/proxy".to_string(),
            api_base: None,

            public_dir: "public".to_string(),

            per_page: 10,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Absolute URL of the proxy route
    pub fn proxy_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        let path = self.proxy_path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
