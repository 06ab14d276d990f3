//! HTTP clients for the microCMS content API
//!
//! [`CmsClient`] talks to microCMS directly with the API key attached.
//! [`ProxyClient`] reaches the same data through the `/api/proxy` route and
//! never holds a private key.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::config::Credentials;
use crate::content::{ListResult, Queries};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

/// Everything but RFC 3986 unreserved characters is escaped in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Failure while reading content
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("API responded with status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Upstream status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Upstream { status, .. } => Some(*status),
            FetchError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// What to fetch: `endpoint[/content_id][?queries]`
#[derive(Debug, Clone, Copy)]
pub struct ContentRequest<'a> {
    pub endpoint: &'a str,
    pub content_id: Option<&'a str>,
    pub queries: Option<&'a Queries>,
}

impl<'a> ContentRequest<'a> {
    pub fn list(endpoint: &'a str, queries: Option<&'a Queries>) -> Self {
        Self {
            endpoint,
            content_id: None,
            queries,
        }
    }

    pub fn detail(endpoint: &'a str, content_id: &'a str, queries: Option<&'a Queries>) -> Self {
        Self {
            endpoint,
            content_id: Some(content_id),
            queries,
        }
    }
}

/// Join `base/endpoint[/content_id][?query]` without doubled slashes.
///
/// `endpoint` and `content_id` are each encoded as a single path segment.
/// An empty content id or query string is treated as absent.
pub fn build_url(base: &str, endpoint: &str, content_id: Option<&str>, query: &str) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        utf8_percent_encode(endpoint.trim_matches('/'), PATH_SEGMENT)
    );

    if let Some(id) = content_id.map(|id| id.trim_matches('/')) {
        if !id.is_empty() {
            url.push('/');
            url.extend(utf8_percent_encode(id, PATH_SEGMENT));
        }
    }

    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }

    url
}

/// Turn a response into JSON, mapping non-success statuses to [`FetchError::Upstream`]
pub(crate) async fn decode_response<T: DeserializeOwned>(
    url: &str,
    response: Response,
) -> Result<T, FetchError> {
    let status = response.status();
    let body = response.text().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(FetchError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Direct client for the microCMS content API
#[derive(Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for CmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CmsClient {
    /// Create a client for the service named in `credentials`
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: credentials.api_key.clone(),
            base_url: credentials.service_domain.api_base(),
        }
    }

    /// Point the client at a different API base (self-hosted mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Share an existing connection pool
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full upstream URL for a request
    pub fn url_for(&self, request: &ContentRequest<'_>) -> String {
        let query = request
            .queries
            .map(Queries::to_query_string)
            .unwrap_or_default();
        build_url(&self.base_url, request.endpoint, request.content_id, &query)
    }

    /// Fetch and decode into any shape
    pub async fn get<T: DeserializeOwned>(
        &self,
        request: &ContentRequest<'_>,
    ) -> Result<T, FetchError> {
        let url = self.url_for(request);
        tracing::debug!("Fetching from URL: {}", url);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        decode_response(&url, response).await
    }

    /// Fetch a list endpoint
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        request: &ContentRequest<'_>,
    ) -> Result<ListResult<T>, FetchError> {
        self.get(request).await
    }

    /// Fetch a single item of a list endpoint
    pub async fn get_list_detail<T: DeserializeOwned>(
        &self,
        request: &ContentRequest<'_>,
    ) -> Result<T, FetchError> {
        self.get(request).await
    }
}

/// Client for the same-origin proxy route
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    proxy_url: String,
}

impl ProxyClient {
    pub fn new(proxy_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            proxy_url: proxy_url.into(),
        }
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        request: &ContentRequest<'_>,
    ) -> Result<T, FetchError> {
        let mut params: Vec<(&str, String)> = vec![("endpoint", request.endpoint.to_string())];
        if let Some(id) = request.content_id {
            params.push(("contentId", id.to_string()));
        }
        if let Some(queries) = request.queries {
            params.push(("queries", queries.to_json()));
        }

        tracing::debug!(
            endpoint = request.endpoint,
            content_id = request.content_id,
            "Fetching from proxy: {}",
            self.proxy_url
        );

        let response = self
            .http
            .get(&self.proxy_url)
            .query(&params)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: self.proxy_url.clone(),
                source,
            })?;

        decode_response(&self.proxy_url, response).await
    }
}
