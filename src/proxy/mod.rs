//! Same-origin proxy for the microCMS content API
//!
//! Untrusted callers hit `GET /api/proxy?endpoint=..&contentId=..&queries=..`
//! and the server performs the upstream request with the private API key.
//! Every failure is answered with a `{"error": "..."}` envelope.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cms::{CmsClient, ContentRequest, FetchError};
use crate::config::{resolve, CmsEnv, ConfigurationError, Credentials, ExecutionContext};
use crate::content::Queries;

pub const ENDPOINT_REQUIRED: &str = "Endpoint is required";
pub const INVALID_QUERIES: &str = "Invalid query parameters";
pub const NOT_CONFIGURED: &str = "API key or service domain is not configured";
pub const FETCH_FAILED: &str = "Failed to fetch data from microCMS";

/// Query parameters accepted by the proxy route
#[derive(Debug, Clone, Default)]
pub struct ProxyParams {
    pub endpoint: Option<String>,
    /// `contentId` on the wire
    pub content_id: Option<String>,
    /// JSON object of scalar query parameters
    pub queries: Option<String>,
}

impl ProxyParams {
    /// Build from decoded query pairs; the first occurrence of a key wins
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "endpoint" => &mut params.endpoint,
                "contentId" => &mut params.content_id,
                "queries" => &mut params.queries,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

/// Proxy failure, rendered as a JSON error envelope
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("API key or service domain is not configured: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("API responded with status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Failed to fetch data from microCMS: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Configuration(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }

    /// Message exposed to the caller
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::BadRequest(message) => *message,
            ProxyError::Configuration(_) => NOT_CONFIGURED,
            ProxyError::Upstream { .. } | ProxyError::Internal(_) => FETCH_FAILED,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::Upstream { status, .. } => {
                json!({ "error": self.public_message(), "status": status })
            }
            _ => json!({ "error": self.public_message() }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Shared state of the proxy route
pub struct ProxyState {
    env: CmsEnv,
    api_base: Option<String>,
    http: reqwest::Client,
}

impl ProxyState {
    pub fn new(env: CmsEnv) -> Self {
        Self {
            env,
            api_base: None,
            http: reqwest::Client::new(),
        }
    }

    /// Override the upstream API base URL
    pub fn with_api_base(mut self, api_base: Option<String>) -> Self {
        self.api_base = api_base;
        self
    }

    fn client(&self, credentials: &Credentials) -> CmsClient {
        let client = CmsClient::new(credentials).with_http(self.http.clone());
        match &self.api_base {
            Some(base) => client.with_base_url(base.clone()),
            None => client,
        }
    }
}

/// Forward one proxy request upstream and return the upstream JSON verbatim
pub async fn forward(state: &ProxyState, params: &ProxyParams) -> Result<Value, ProxyError> {
    let endpoint = params
        .endpoint
        .as_deref()
        .map(|endpoint| endpoint.trim_matches('/'))
        .filter(|endpoint| !endpoint.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Rejected proxy request without endpoint");
            ProxyError::BadRequest(ENDPOINT_REQUIRED)
        })?;

    let credentials = resolve(&state.env, ExecutionContext::Trusted).map_err(|err| {
        tracing::error!("Proxy is not configured: {}", err);
        ProxyError::from(err)
    })?;

    let queries = params
        .queries
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(Queries::from_json)
        .transpose()
        .map_err(|err| {
            tracing::warn!("Error parsing queries {:?}: {}", params.queries, err);
            ProxyError::BadRequest(INVALID_QUERIES)
        })?;

    let request = ContentRequest {
        endpoint,
        content_id: params.content_id.as_deref().filter(|id| !id.is_empty()),
        queries: queries.as_ref(),
    };

    state
        .client(&credentials)
        .get::<Value>(&request)
        .await
        .map_err(|err| match err {
            FetchError::Upstream { status, body } => {
                tracing::error!("API responded with status {}: {}", status, body);
                ProxyError::Upstream { status, body }
            }
            other => {
                tracing::error!("Error fetching from microCMS: {}", other);
                ProxyError::Internal(other.to_string())
            }
        })
}

/// `GET` handler for the proxy route
pub async fn proxy_handler(
    State(state): State<Arc<ProxyState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Query(pairs) = query.map_err(|rejection| {
        tracing::warn!("Rejected proxy query string: {}", rejection);
        ProxyError::BadRequest(INVALID_QUERIES)
    })?;
    let params = ProxyParams::from_pairs(pairs);
    forward(&state, &params).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::API_KEY_HEADER;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn env() -> CmsEnv {
        CmsEnv {
            microcms_api_key: Some("server-key".to_string()),
            microcms_service_domain: Some("myblog.microcms.io".to_string()),
            ..Default::default()
        }
    }

    fn params(endpoint: Option<&str>, content_id: Option<&str>, queries: Option<&str>) -> ProxyParams {
        ProxyParams {
            endpoint: endpoint.map(String::from),
            content_id: content_id.map(String::from),
            queries: queries.map(String::from),
        }
    }

    async fn state_with_upstream(server: &MockServer) -> ProxyState {
        ProxyState::new(env()).with_api_base(Some(format!("{}/api/v1", server.uri())))
    }

    #[test]
    fn test_params_first_value_wins() {
        let pairs = vec![
            ("endpoint".to_string(), "blogs".to_string()),
            ("endpoint".to_string(), "tags".to_string()),
            ("contentId".to_string(), "abc".to_string()),
            ("draftKey".to_string(), "ignored".to_string()),
        ];
        let params = ProxyParams::from_pairs(pairs);
        assert_eq!(params.endpoint.as_deref(), Some("blogs"));
        assert_eq!(params.content_id.as_deref(), Some("abc"));
        assert!(params.queries.is_none());
    }

    #[tokio::test]
    async fn test_escapes_content_id_in_upstream_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "a#b?c d" })))
            .expect(1)
            .mount(&server)
            .await;
        let state = state_with_upstream(&server).await;

        forward(
            &state,
            &params(Some("blogs"), Some("a#b?c d"), Some(r#"{"limit":1}"#)),
        )
        .await
        .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].url.path(), "/api/v1/blogs/a%23b%3Fc%20d");
        assert_eq!(received[0].url.query(), Some("limit=1"));
    }

    #[tokio::test]
    async fn test_missing_endpoint_makes_no_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let state = state_with_upstream(&server).await;

        for endpoint in [None, Some(""), Some("/")] {
            let err = forward(&state, &params(endpoint, None, None)).await.unwrap_err();
            assert!(matches!(err, ProxyError::BadRequest(ENDPOINT_REQUIRED)));
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_malformed_queries_make_no_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let state = state_with_upstream(&server).await;

        for raw in ["{limit:", "[]", r#"{"a":[1]}"#] {
            let err = forward(&state, &params(Some("blogs"), None, Some(raw)))
                .await
                .unwrap_err();
            assert!(matches!(err, ProxyError::BadRequest(INVALID_QUERIES)));
            assert_eq!(err.public_message(), "Invalid query parameters");
        }
    }

    #[tokio::test]
    async fn test_missing_configuration() {
        let state = ProxyState::new(CmsEnv {
            microcms_api_key: Some("server-key".to_string()),
            // only the public pair would not help the server
            public_microcms_service_domain: Some("myblog".to_string()),
            ..Default::default()
        });

        let err = forward(&state, &params(Some("blogs"), None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Configuration(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn test_forwards_detail_without_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blogs/abc123"))
            .and(header(API_KEY_HEADER, "server-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "abc123", "title": "t" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        let state = state_with_upstream(&server).await;

        let body = forward(&state, &params(Some("blogs"), Some("abc123"), None))
            .await
            .unwrap();
        assert_eq!(body, json!({ "id": "abc123", "title": "t" }));

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].url.query(), None);
    }

    #[tokio::test]
    async fn test_forwards_queries_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blogs"))
            .and(query_param("limit", "5"))
            .and(query_param("offset", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contents": [], "totalCount": 0, "offset": 10, "limit": 5
            })))
            .expect(1)
            .mount(&server)
            .await;
        let state = state_with_upstream(&server).await;

        forward(
            &state,
            &params(Some("blogs"), Some(""), Some(r#"{"limit":5,"offset":10}"#)),
        )
        .await
        .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].url.path(), "/api/v1/blogs");
        assert_eq!(received[0].url.query(), Some("limit=5&offset=10"));
    }

    #[tokio::test]
    async fn test_upstream_failure_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("X-MICROCMS-API-KEY header is invalid."))
            .mount(&server)
            .await;
        let state = state_with_upstream(&server).await;

        let err = forward(&state, &params(Some("tags"), None, None))
            .await
            .unwrap_err();
        match &err {
            ProxyError::Upstream { status, body } => {
                assert_eq!(*status, 401);
                assert!(body.contains("invalid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.public_message(), FETCH_FAILED);
    }

    #[tokio::test]
    async fn test_unparseable_upstream_body_is_internal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let state = state_with_upstream(&server).await;

        let err = forward(&state, &params(Some("blogs"), None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Internal(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_status_outside_error_range_maps_to_bad_gateway() {
        let err = ProxyError::Upstream {
            status: 304,
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
