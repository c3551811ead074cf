//! Transport that reaches the models through the credential-forwarding proxy.
//!
//! Routing travels as query parameters (`model`, `token`, `type`); the body is
//! the hop's payload, unmodified.

use super::{InferenceRequest, InferenceTransport, TransportReply};
use crate::error::PipelineError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Sends inference requests to a Keyscribe proxy endpoint.
pub struct ProxyTransport {
    client: reqwest::Client,
    proxy_url: String,
    timeout: Option<Duration>,
}

impl ProxyTransport {
    pub fn new(proxy_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            proxy_url: proxy_url.to_string(),
            timeout: None,
        }
    }

    /// Apply a per-hop timeout (no timeout by default).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn proxy_url(&self) -> &str {
        &self.proxy_url
    }
}

#[async_trait]
impl InferenceTransport for ProxyTransport {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn send(&self, request: InferenceRequest) -> Result<TransportReply, PipelineError> {
        let InferenceRequest {
            model,
            token,
            content_type,
            payload,
        } = request;

        let mut builder = self
            .client
            .post(&self.proxy_url)
            .query(&[
                ("model", model.as_str()),
                ("token", token.as_str()),
                ("type", content_type.as_str()),
            ])
            .header(CONTENT_TYPE, content_type.as_str())
            .body(payload.into_bytes());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        // The request URL carries the token, so errors are rendered without it
        let resp = builder.send().await.map_err(|e| PipelineError::Transport {
            model: model.clone(),
            message: format!("proxy request failed: {}", e.without_url()),
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| PipelineError::Transport {
            model: model.clone(),
            message: format!("failed to read proxy response: {}", e.without_url()),
        })?;

        Ok(TransportReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transport_error_does_not_leak_token() {
        // Bind then drop a listener to get a port nobody answers on
        let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);

        let transport = ProxyTransport::new(&format!("http://{dead_addr}/image-proxy"));
        let err = transport
            .send(InferenceRequest::keyphrase("m", "hf_SECRET_TOKEN", "a dog"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Transport { .. }));
        assert!(!err.to_string().contains("hf_SECRET_TOKEN"));
        assert!(!format!("{err:?}").contains("hf_SECRET_TOKEN"));
    }
}
