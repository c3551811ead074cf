//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Default remote inference host.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api-inference.huggingface.co";

/// Default captioning model.
pub const DEFAULT_CAPTION_MODEL: &str = "Salesforce/blip-image-captioning-large";

/// Default keyphrase-generation model.
pub const DEFAULT_KEYPHRASE_MODEL: &str = "ml6team/keyphrase-generation-t5-base-presentation";

/// Proxy server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Socket address the proxy listens on
    pub bind: String,

    /// Path of the forwarding endpoint
    pub route: String,

    /// Base URL of the inference API (models are addressed as `<url>/models/<model>`)
    pub upstream_url: String,

    /// Server-side token for the `/generate` caption endpoint (supports ${ENV_VAR} syntax).
    /// The forwarding endpoint never uses it; callers supply their own token.
    pub token: String,

    /// Optional outbound request timeout in milliseconds (unset = no timeout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8888".to_string(),
            route: "/image-proxy".to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            token: "${HUGGING_FACE_TOKEN}".to_string(),
            timeout_ms: None,
        }
    }
}

/// Orchestrator (client) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the proxy's forwarding endpoint
    pub proxy_url: String,

    /// Bearer token forwarded to the inference API (supports ${ENV_VAR} syntax)
    pub token: String,

    /// Optional per-hop timeout in milliseconds (unset = no timeout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: "http://127.0.0.1:8888/image-proxy".to_string(),
            token: "${HUGGING_FACE_TOKEN}".to_string(),
            timeout_ms: None,
        }
    }
}

/// Remote model identifiers for the two hops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Image-to-text model used for the caption hop
    pub caption: String,

    /// Text-to-keyphrase model used for the keyword hop
    pub keyphrase: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            caption: DEFAULT_CAPTION_MODEL.to_string(),
            keyphrase: DEFAULT_KEYPHRASE_MODEL.to_string(),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes (client-side check and proxy body limit)
    pub max_upload_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_upload_mb: 10 }
    }
}

impl LimitsConfig {
    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("text", "json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
