//! Inference transports: how one hop reaches a remote model.
//!
//! The orchestrator only sees the [`InferenceTransport`] trait. The production
//! implementation goes through the credential-forwarding proxy
//! ([`ProxyTransport`]); the proxy's own caption endpoint talks to the
//! inference API directly through its upstream relay.

mod proxy;

pub use proxy::ProxyTransport;

use crate::error::PipelineError;
use crate::upload::UploadedImage;
use async_trait::async_trait;
use std::fmt;

/// Body of an inference request.
#[derive(Debug, Clone)]
pub enum InferencePayload {
    /// Raw bytes forwarded untouched (image uploads)
    Binary(Vec<u8>),
    /// JSON document (text models)
    Json(serde_json::Value),
}

impl InferencePayload {
    /// Serialize the payload into the bytes that go on the wire.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Binary(bytes) => bytes,
            // Serializing a `Value` cannot fail
            Self::Json(value) => value.to_string().into_bytes(),
        }
    }
}

/// One hop's request: target model, credential, content type and payload.
///
/// Built fresh per hop and consumed by [`InferenceTransport::send`].
#[derive(Clone)]
pub struct InferenceRequest {
    pub model: String,
    pub token: String,
    pub content_type: String,
    pub payload: InferencePayload,
}

impl InferenceRequest {
    /// Image-to-text request: raw image bytes with the image's own MIME type.
    pub fn caption(model: &str, token: &str, image: &UploadedImage) -> Self {
        Self {
            model: model.to_string(),
            token: token.to_string(),
            content_type: image.mime_type().to_string(),
            payload: InferencePayload::Binary(image.bytes().to_vec()),
        }
    }

    /// Text-to-keyphrase request: `{"inputs": <caption>}` as JSON.
    pub fn keyphrase(model: &str, token: &str, text: &str) -> Self {
        Self {
            model: model.to_string(),
            token: token.to_string(),
            content_type: "application/json".to_string(),
            payload: InferencePayload::Json(serde_json::json!({ "inputs": text })),
        }
    }
}

// Keep the bearer token out of logs.
impl fmt::Debug for InferenceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceRequest")
            .field("model", &self.model)
            .field("token", &"<redacted>")
            .field("content_type", &self.content_type)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

impl TransportReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait that all inference transports implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the orchestrator holds an `Arc<dyn InferenceTransport>`).
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Transport name for logging (e.g., "proxy", "upstream").
    fn name(&self) -> &str;

    /// Perform one request/response cycle.
    ///
    /// Non-2xx statuses are returned as a normal [`TransportReply`]; only
    /// failures to complete the exchange are errors.
    async fn send(&self, request: InferenceRequest) -> Result<TransportReply, PipelineError>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scriptable in-memory transport for orchestrator and session tests.

    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// A request as seen by the mock, with the payload already serialized.
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub model: String,
        pub token: String,
        pub content_type: String,
        pub body: Vec<u8>,
    }

    type Handler = Box<dyn Fn(&RecordedCall) -> Result<TransportReply, PipelineError> + Send + Sync>;
    type DelayFn = Box<dyn Fn(&RecordedCall) -> Option<Duration> + Send + Sync>;

    pub struct MockTransport {
        handler: Handler,
        delay: DelayFn,
        calls: Arc<Mutex<Vec<RecordedCall>>>,
    }

    impl MockTransport {
        pub fn new<F>(handler: F) -> Self
        where
            F: Fn(&RecordedCall) -> Result<TransportReply, PipelineError> + Send + Sync + 'static,
        {
            Self {
                handler: Box::new(handler),
                delay: Box::new(|_| None),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Answers like the hosted models: the caption for binary uploads,
        /// the phrase string for JSON requests.
        pub fn models(caption: &str, phrases: &str) -> Self {
            let caption = generated_text(caption);
            let phrases = generated_text(phrases);
            Self::new(move |call| {
                let body = if call.content_type == "application/json" {
                    phrases.clone()
                } else {
                    caption.clone()
                };
                Ok(TransportReply { status: 200, body })
            })
        }

        /// Delay selected calls before answering.
        pub fn with_delay<F>(mut self, delay: F) -> Self
        where
            F: Fn(&RecordedCall) -> Option<Duration> + Send + Sync + 'static,
        {
            self.delay = Box::new(delay);
            self
        }

        /// Shared handle to the recorded calls (survives boxing the mock).
        pub fn calls(&self) -> Arc<Mutex<Vec<RecordedCall>>> {
            self.calls.clone()
        }
    }

    pub fn generated_text(text: &str) -> String {
        serde_json::json!([{ "generated_text": text }]).to_string()
    }

    #[async_trait]
    impl InferenceTransport for MockTransport {
        fn name(&self) -> &str {
            "mock"
        }

        async fn send(&self, request: InferenceRequest) -> Result<TransportReply, PipelineError> {
            let call = RecordedCall {
                model: request.model,
                token: request.token,
                content_type: request.content_type,
                body: request.payload.into_bytes(),
            };
            self.calls.lock().unwrap().push(call.clone());
            if let Some(delay) = (self.delay)(&call) {
                tokio::time::sleep(delay).await;
            }
            (self.handler)(&call)
        }
    }
}
