//! Content access that works the same from trusted and untrusted code
//!
//! [`ContentApi`] hides whether a read goes straight to microCMS or through
//! the proxy route. Callers get identical result shapes either way.

use serde::de::DeserializeOwned;

use super::{Category, ListResult, Post, Queries, Tag};
use crate::cms::{CmsClient, ContentRequest, FetchError, ProxyClient};
use crate::config::{resolve, CmsEnv, ConfigurationError, Credentials, ExecutionContext};

pub const POSTS_ENDPOINT: &str = "blogs";
pub const CATEGORIES_ENDPOINT: &str = "categories";
pub const TAGS_ENDPOINT: &str = "tags";

/// Default page size used when generating static paths
pub const STATIC_PATHS_LIMIT: usize = 100;

/// Everything needed to build a [`ContentApi`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub context: ExecutionContext,
    pub env: CmsEnv,
    /// Overrides the microCMS API base for direct calls
    pub api_base: Option<String>,
    /// Absolute URL of the proxy route, used from untrusted code
    pub proxy_url: String,
}

#[derive(Debug, Clone)]
enum Backend {
    Direct(CmsClient),
    Proxy(ProxyClient),
}

/// Read-only access to posts, categories and tags
#[derive(Debug, Clone)]
pub struct ContentApi {
    context: ExecutionContext,
    credentials: Credentials,
    backend: Backend,
}

impl ContentApi {
    /// Resolve credentials for the configured context and pick a backend.
    ///
    /// Fails when the key pair for that context is incomplete. In the
    /// untrusted context the public pair is validated but never sent; reads
    /// go through the proxy, which attaches the server key.
    pub fn initialize(config: &ClientConfig) -> Result<Self, ConfigurationError> {
        let credentials = resolve(&config.env, config.context)?;

        let backend = match config.context {
            ExecutionContext::Trusted => {
                let client = CmsClient::new(&credentials);
                let client = match &config.api_base {
                    Some(base) => client.with_base_url(base.clone()),
                    None => client,
                };
                Backend::Direct(client)
            }
            ExecutionContext::Untrusted => Backend::Proxy(ProxyClient::new(&config.proxy_url)),
        };

        tracing::info!(
            context = %config.context,
            service = %credentials.service_domain,
            "Content API initialized"
        );

        Ok(Self {
            context: config.context,
            credentials,
            backend,
        })
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: ContentRequest<'_>,
    ) -> Result<T, FetchError> {
        let result = match &self.backend {
            Backend::Direct(client) => client.get(&request).await,
            Backend::Proxy(proxy) => proxy.get(&request).await,
        };

        if let Err(err) = &result {
            tracing::error!("Error fetching {}: {}", request.endpoint, err);
        }
        result
    }

    /// List blog posts
    pub async fn list_posts(
        &self,
        queries: Option<&Queries>,
    ) -> Result<ListResult<Post>, FetchError> {
        self.fetch(ContentRequest::list(POSTS_ENDPOINT, queries))
            .await
    }

    /// Get one blog post
    pub async fn get_post(&self, id: &str, queries: Option<&Queries>) -> Result<Post, FetchError> {
        self.fetch(ContentRequest::detail(POSTS_ENDPOINT, id, queries))
            .await
    }

    /// List categories
    pub async fn list_categories(
        &self,
        queries: Option<&Queries>,
    ) -> Result<ListResult<Category>, FetchError> {
        self.fetch(ContentRequest::list(CATEGORIES_ENDPOINT, queries))
            .await
    }

    /// List tags
    pub async fn list_tags(&self, queries: Option<&Queries>) -> Result<ListResult<Tag>, FetchError> {
        self.fetch(ContentRequest::list(TAGS_ENDPOINT, queries))
            .await
    }

    /// Look up a category by id; `None` when it does not exist
    pub async fn find_category(&self, id: &str) -> Result<Option<Category>, FetchError> {
        let queries = Queries::new().filters(&format!("id[equals]{}", id));
        let list = self.list_categories(Some(&queries)).await?;
        Ok(list.contents.into_iter().next())
    }

    /// Posts filed under a category
    pub async fn list_posts_in_category(
        &self,
        category_id: &str,
        limit: usize,
    ) -> Result<ListResult<Post>, FetchError> {
        let queries = Queries::new()
            .filters(&format!("category[equals]{}", category_id))
            .limit(limit);
        self.list_posts(Some(&queries)).await
    }

    /// Post ids to pre-render
    pub async fn post_ids(&self, limit: Option<usize>) -> Result<Vec<String>, FetchError> {
        let queries = Queries::new()
            .fields("id")
            .limit(limit.unwrap_or(STATIC_PATHS_LIMIT));
        let list: ListResult<IdOnly> = self
            .fetch(ContentRequest::list(POSTS_ENDPOINT, Some(&queries)))
            .await?;
        Ok(list.contents.into_iter().map(|item| item.id).collect())
    }

    /// Latest posts together with all categories, fetched concurrently
    pub async fn home(
        &self,
        limit: usize,
    ) -> Result<(ListResult<Post>, ListResult<Category>), FetchError> {
        let post_queries = Queries::new().limit(limit);
        let category_queries = Queries::new().limit(STATIC_PATHS_LIMIT);
        tokio::try_join!(
            self.list_posts(Some(&post_queries)),
            self.list_categories(Some(&category_queries)),
        )
    }
}

#[derive(serde::Deserialize)]
struct IdOnly {
    id: String,
}
