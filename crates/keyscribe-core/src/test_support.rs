//! Test helpers: ephemeral axum servers and a recording fake inference API.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::routing::any;
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral localhost port for the rest of the test.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// One request received by [`FakeUpstream`].
#[derive(Debug, Clone)]
pub struct UpstreamHit {
    pub model: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

type Responder = Box<dyn Fn(&UpstreamHit) -> (u16, String) + Send + Sync>;

/// Stand-in for the inference API's `/models/{model}` endpoint.
pub struct FakeUpstream {
    respond: Responder,
    hits: Mutex<Vec<UpstreamHit>>,
}

impl FakeUpstream {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&UpstreamHit) -> (u16, String) + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            hits: Mutex::new(Vec::new()),
        }
    }

    /// Always answer `status` with `body`.
    pub fn fixed(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| (status, body.clone()))
    }

    /// Always answer 200 with `body`.
    pub fn json(body: &str) -> Self {
        Self::fixed(200, body)
    }

    pub fn hits(&self) -> Vec<UpstreamHit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().unwrap().len()
    }

    /// Start serving; returns the base URL and a handle for assertions.
    pub async fn spawn(self) -> (String, Arc<Self>) {
        let fake = Arc::new(self);
        let app = Router::new()
            .route("/models/{*model}", any(model_endpoint))
            .with_state(fake.clone());
        let addr = spawn_app(app).await;
        (format!("http://{addr}"), fake)
    }
}

async fn model_endpoint(
    State(fake): State<Arc<FakeUpstream>>,
    Path(model): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let hit = UpstreamHit {
        model: model.trim_start_matches('/').to_string(),
        authorization: header(AUTHORIZATION),
        content_type: header(CONTENT_TYPE),
        body: body.to_vec(),
    };
    let (status, body) = (fake.respond)(&hit);
    fake.hits.lock().unwrap().push(hit);
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    )
}
