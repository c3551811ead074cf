//! Error types for the Keyscribe pipeline and proxy.
//!
//! Pipeline errors carry the context the user needs to act on them: which
//! model was being called, the HTTP status, and the body the remote sent back.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Keyscribe operations.
#[derive(Error, Debug)]
pub enum KeyscribeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while running the caption → keyword pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The submitted file is not an image
    #[error("Please upload a valid image file. (got {mime_type:?})")]
    InvalidImage { mime_type: String },

    /// The submitted image exceeds the upload limit
    #[error("Image too large: {size_mb}MB > {max_mb}MB")]
    ImageTooLarge { size_mb: u64, max_mb: u64 },

    /// Image path does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Image file exists but could not be read
    #[error("Cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// No bearer token configured
    #[error(
        "Hugging Face API token is not set. Set HUGGING_FACE_TOKEN or add it to your .env file."
    )]
    MissingToken,

    /// The inference API (or the proxy in front of it) answered non-2xx
    #[error("HTTP error! status: {status}, body: {body}")]
    RemoteApi {
        model: String,
        status: u16,
        body: String,
    },

    /// The proxy or inference API could not be reached
    #[error("Request to {model} failed: {message}")]
    Transport { model: String, message: String },

    /// The response did not have the expected `[{"generated_text": ...}]` shape
    #[error("Unexpected response from {model} ({reason}). status: {status}, body: {body}")]
    MalformedResponse {
        model: String,
        status: u16,
        body: String,
        reason: String,
    },
}

impl PipelineError {
    /// True for errors detected locally, before any network call.
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidImage { .. }
                | Self::ImageTooLarge { .. }
                | Self::FileNotFound(_)
                | Self::Read { .. }
        )
    }

    /// HTTP status attached to the error, if the failure came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RemoteApi { status, .. } | Self::MalformedResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Convenience type alias for Keyscribe results.
pub type Result<T> = std::result::Result<T, KeyscribeError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_api_message_includes_status_and_body() {
        let err = PipelineError::RemoteApi {
            model: "m".to_string(),
            status: 503,
            body: "model loading".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("model loading"));
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn test_missing_token_is_not_a_remote_error() {
        let err = PipelineError::MissingToken;
        assert!(err.status_code().is_none());
        assert!(!err.is_client_input());
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_invalid_image_is_client_input() {
        let err = PipelineError::InvalidImage {
            mime_type: "text/plain".to_string(),
        };
        assert!(err.is_client_input());
        assert!(err.to_string().starts_with("Please upload a valid image file."));
    }
}
