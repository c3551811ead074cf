//! Credential-forwarding proxy in front of the inference API.
//!
//! The forwarding endpoint (`proxy.route`, default `/image-proxy`) relays a
//! POST body to `<upstream>/models/<model>` with the caller's bearer token and
//! returns the API's JSON untouched, or a plain-text error envelope:
//!
//! | Situation                     | Status          | Body                                    |
//! |-------------------------------|-----------------|-----------------------------------------|
//! | non-POST                      | 405             | `Method Not Allowed`                    |
//! | missing `token` / `model`     | 400             | `Missing token or model query parameter.` |
//! | API answered 2xx              | API status      | API JSON                                |
//! | API answered non-2xx          | API status      | `Hugging Face API error: <status>, <body>` |
//! | network failure / bad JSON    | 500             | `Internal Server Error: <message>`      |
//!
//! `POST /generate` additionally captions a multipart upload with the
//! server's own token, and `GET /health` answers `ok`.

mod handler;
mod upstream;

pub use handler::{CaptionResponse, ForwardParams, ProxyError};
pub use upstream::{Upstream, UpstreamReply};

use crate::config::Config;
use crate::error::{ConfigError, KeyscribeError};
use crate::orchestrator::{Orchestrator, PipelineSettings};
use axum::extract::{DefaultBodyLimit, Request};
use axum::routing::{any, get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared, read-only state of the proxy server.
pub struct ProxyState {
    pub upstream: Upstream,
    /// Caption hop wired straight to the upstream, for `/generate`
    pub captioner: Orchestrator,
}

impl ProxyState {
    pub fn from_config(config: &Config) -> Self {
        let upstream = Upstream::new(&config.proxy.upstream_url)
            .with_timeout(config.proxy.timeout_ms.map(Duration::from_millis));
        let settings = PipelineSettings {
            token: config.proxy_token(),
            ..PipelineSettings::from_config(config)
        };
        let captioner = Orchestrator::new(Arc::new(upstream.clone()), settings);
        Self {
            upstream,
            captioner,
        }
    }
}

/// Build the proxy's router.
pub fn router(config: &Config) -> Router {
    let state = Arc::new(ProxyState::from_config(config));
    let body_limit = usize::try_from(config.limits.max_upload_bytes()).unwrap_or(usize::MAX);

    Router::new()
        .route(&config.proxy.route, any(handler::forward))
        .route("/generate", post(handler::generate))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span with method and path only; the query holds the caller's token.
fn request_span(request: &Request) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Bind `proxy.bind` and serve until Ctrl-C.
pub async fn serve(config: &Config) -> Result<(), KeyscribeError> {
    let addr: SocketAddr = config.proxy.bind.parse().map_err(|_| {
        ConfigError::ValidationError(format!("invalid proxy.bind: {}", config.proxy.bind))
    })?;
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, config, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_on<F>(
    listener: TcpListener,
    config: &Config,
    shutdown: F,
) -> Result<(), KeyscribeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(config);
    let local = listener.local_addr()?;
    tracing::info!(
        "Proxy listening on http://{local}{} -> {}",
        config.proxy.route,
        config.proxy.upstream_url
    );
    if config.proxy_token().is_none() {
        tracing::warn!("No server token configured; /generate will answer 503");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("Proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
