//! Outbound relay to the inference API.

use crate::error::PipelineError;
use crate::transport::{InferenceRequest, InferenceTransport, TransportReply};
use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

/// Raw answer from the inference API.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Bytes,
}

/// Forwards bodies to `<base_url>/models/<model>` with a bearer token.
#[derive(Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl Upstream {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Apply an outbound timeout (no timeout by default).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    /// POST `body` to the model, whatever status comes back.
    pub async fn forward(
        &self,
        model: &str,
        token: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<UpstreamReply, reqwest::Error> {
        let mut builder = self
            .client
            .post(self.model_url(model))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, content_type)
            .body(body);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        tracing::debug!("Upstream {model} answered {status} ({} bytes)", body.len());
        Ok(UpstreamReply { status, body })
    }
}

/// Direct transport used by the proxy's own caption endpoint.
#[async_trait]
impl InferenceTransport for Upstream {
    fn name(&self) -> &str {
        "upstream"
    }

    async fn send(&self, request: InferenceRequest) -> Result<TransportReply, PipelineError> {
        let model = request.model;
        let reply = self
            .forward(
                &model,
                &request.token,
                &request.content_type,
                Bytes::from(request.payload.into_bytes()),
            )
            .await
            .map_err(|e| PipelineError::Transport {
                model: model.clone(),
                message: e.to_string(),
            })?;

        Ok(TransportReply {
            status: reply.status,
            body: String::from_utf8_lossy(&reply.body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_url_keeps_namespace_slash() {
        let upstream = Upstream::new("https://api-inference.huggingface.co/");
        assert_eq!(
            upstream.model_url("Salesforce/blip-image-captioning-large"),
            "https://api-inference.huggingface.co/models/Salesforce/blip-image-captioning-large"
        );
    }
}
