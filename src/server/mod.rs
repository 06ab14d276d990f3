//! HTTP server hosting the CMS proxy and the built site

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::proxy::{proxy_handler, ProxyState};
use crate::Blog;

/// Build the application router.
///
/// Requests that do not hit the proxy route are served from `public_dir`
/// when one is given.
pub fn router(state: Arc<ProxyState>, proxy_path: &str, public_dir: Option<PathBuf>) -> Router {
    let proxy_path = format!("/{}", proxy_path.trim_start_matches('/'));

    let app = Router::new()
        .route(&proxy_path, get(proxy_handler))
        .with_state(state);

    let app = match public_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => app,
    };

    app.layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(
        ProxyState::new(blog.env.clone()).with_api_base(blog.config.api_base.clone()),
    );

    let public_dir = Some(blog.public_dir.clone()).filter(|dir| dir.is_dir());
    if public_dir.is_none() {
        tracing::debug!("No public directory at {:?}, serving proxy only", blog.public_dir);
    }

    let app = router(state, &blog.config.proxy_path, public_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Proxy available at {}", blog.config.proxy_path);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
