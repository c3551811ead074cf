//! Two-hop caption → keyword orchestration.
//!
//! Hop one sends the image to the captioning model; hop two sends the caption
//! to the keyphrase model and partitions the answer. The hops are separate
//! async steps so each can be driven (and faked) on its own; [`Orchestrator::run`]
//! chains them.

mod response;

use crate::config::{Config, LimitsConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::keywords::KeywordSet;
use crate::transport::{InferenceRequest, InferenceTransport, ProxyTransport};
use crate::types::{Caption, Description};
use crate::upload::UploadedImage;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Explicit run-time settings for the orchestrator.
///
/// The bearer token lives here rather than being read from the environment
/// mid-run; `None` makes every run fail with [`PipelineError::MissingToken`].
#[derive(Clone)]
pub struct PipelineSettings {
    pub token: Option<String>,
    pub caption_model: String,
    pub keyphrase_model: String,
    pub limits: LimitsConfig,
}

impl PipelineSettings {
    /// Settings for the client side of the pipeline.
    pub fn from_config(config: &Config) -> Self {
        Self {
            token: config.client_token(),
            caption_model: config.models.caption.clone(),
            keyphrase_model: config.models.keyphrase.clone(),
            limits: config.limits.clone(),
        }
    }
}

impl std::fmt::Debug for PipelineSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineSettings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("caption_model", &self.caption_model)
            .field("keyphrase_model", &self.keyphrase_model)
            .field("limits", &self.limits)
            .finish()
    }
}

/// Sequential caption → keyword pipeline over an [`InferenceTransport`].
pub struct Orchestrator {
    transport: Arc<dyn InferenceTransport>,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn InferenceTransport>, settings: PipelineSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Orchestrator that reaches the models through the configured proxy.
    pub fn from_config(config: &Config) -> Self {
        let transport = ProxyTransport::new(&config.client.proxy_url)
            .with_timeout(config.client.timeout_ms.map(Duration::from_millis));
        Self::new(Arc::new(transport), PipelineSettings::from_config(config))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Reject inputs that must never reach the network.
    pub fn validate(&self, image: &UploadedImage) -> PipelineResult<()> {
        image.validate(&self.settings.limits)
    }

    /// The configured bearer token, or [`PipelineError::MissingToken`].
    pub fn token(&self) -> PipelineResult<&str> {
        self.settings
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(PipelineError::MissingToken)
    }

    /// Hop one: image → caption.
    pub async fn caption(&self, image: &UploadedImage) -> PipelineResult<Caption> {
        let token = self.token()?;
        let model = &self.settings.caption_model;
        let request = InferenceRequest::caption(model, token, image);

        tracing::debug!(
            "Captioning {} bytes ({}) with {model} via {}",
            image.bytes().len(),
            image.mime_type(),
            self.transport.name()
        );
        let start = Instant::now();
        let reply = self.transport.send(request).await?;
        let status = reply.status;
        let body = reply.body.clone();
        let text = response::generated_text(model, reply)?;

        let caption = Caption::new(&text).ok_or_else(|| PipelineError::MalformedResponse {
            model: model.clone(),
            status,
            body,
            reason: "empty caption".to_string(),
        })?;
        tracing::debug!("Caption in {}ms: {caption}", start.elapsed().as_millis());
        Ok(caption)
    }

    /// Hop two: caption → keyword set.
    pub async fn keywords(&self, caption: &Caption) -> PipelineResult<KeywordSet> {
        let token = self.token()?;
        let model = &self.settings.keyphrase_model;
        let request = InferenceRequest::keyphrase(model, token, caption.as_str());

        tracing::debug!("Generating keyphrases with {model} via {}", self.transport.name());
        let start = Instant::now();
        let reply = self.transport.send(request).await?;
        let phrases = response::generated_text(model, reply)?;

        let keywords = KeywordSet::from_phrases(&phrases);
        tracing::debug!(
            "{} short-tail / {} long-tail keywords in {}ms",
            keywords.short_tail.len(),
            keywords.long_tail.len(),
            start.elapsed().as_millis()
        );
        Ok(keywords)
    }

    /// Validate, then run both hops in order.
    pub async fn run(&self, image: &UploadedImage) -> PipelineResult<Description> {
        self.validate(image)?;
        self.token()?;
        let caption = self.caption(image).await?;
        let keywords = self.keywords(&caption).await?;
        Ok(Description { caption, keywords })
    }
}
