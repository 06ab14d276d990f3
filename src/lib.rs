//! microcms-blog: content layer for a microCMS-backed blog
//!
//! This crate reads posts, categories and tags from microCMS, either directly
//! with the private API key or through a same-origin proxy route that keeps
//! the key on the server.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod proxy;
pub mod server;

use anyhow::Result;
use std::path::Path;

use config::{CmsEnv, ConfigurationError, ExecutionContext};
use content::{ClientConfig, ContentApi};

/// The blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// CMS settings from the environment
    pub env: CmsEnv,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Static files served next to the proxy
    pub public_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let env = CmsEnv::load(&base_dir)?;
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            env,
            base_dir,
            public_dir,
        })
    }

    /// Client settings for code running in `context`
    pub fn client_config(&self, context: ExecutionContext) -> ClientConfig {
        ClientConfig {
            context,
            env: self.env.clone(),
            api_base: self.config.api_base.clone(),
            proxy_url: self.config.proxy_url(),
        }
    }

    /// Build the content API for `context`
    pub fn content_api(&self, context: ExecutionContext) -> Result<ContentApi, ConfigurationError> {
        ContentApi::initialize(&self.client_config(context))
    }

    /// List site content
    pub async fn list(&self, content_type: &str, limit: usize, context: ExecutionContext) -> Result<()> {
        commands::list::run(self, content_type, limit, context).await
    }

    /// Report configuration status
    pub fn check(&self) {
        commands::check::run(self)
    }
}
