//! Request handlers: the forwarding endpoint and the caption endpoint.

use super::ProxyState;
use crate::error::PipelineError;
use crate::upload::UploadedImage;
use axum::body::Bytes;
use axum::extract::{Multipart, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors the proxy reports to its caller. The `Display` text is the
/// response body.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Missing token or model query parameter.")]
    MissingParams,

    #[error("Invalid model identifier: {0}")]
    InvalidModel(String),

    /// Non-2xx answer from the inference API
    #[error("Hugging Face API error: {status}, {body}")]
    Upstream { status: u16, body: String },

    #[error("Bad upload: {0}")]
    BadUpload(String),

    #[error("Caption endpoint unavailable: no server token configured")]
    NoServerToken,

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingParams | Self::InvalidModel(_) | Self::BadUpload(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::NoServerToken => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(message) => tracing::error!("Proxy error: {message}"),
            Self::Upstream { status, .. } => tracing::warn!("Inference API answered {status}"),
            other => tracing::debug!("Rejected request: {other}"),
        }
        (self.status(), self.to_string()).into_response()
    }
}

impl From<PipelineError> for ProxyError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::RemoteApi { status, body, .. } => Self::Upstream { status, body },
            PipelineError::MissingToken => Self::NoServerToken,
            e if e.is_client_input() => Self::BadUpload(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

/// Routing parameters of the forwarding endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ForwardParams {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub token: Option<String>,
    pub model: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reject model ids that would escape the `/models/` path.
///
/// Percent escapes are refused outright: URL normalization decodes `%2e`
/// into a dot segment.
fn check_model(model: &str) -> Result<(), ProxyError> {
    let bad = model.starts_with('/')
        || model.contains(['?', '#', '\\', '%'])
        || model.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(ProxyError::InvalidModel(model.to_string()));
    }
    Ok(())
}

/// Content type to forward: the `type` parameter, else the request's own
/// `Content-Type`, else `application/octet-stream`.
fn forwarded_content_type(param: Option<String>, headers: &HeaderMap) -> String {
    non_empty(param)
        .or_else(|| {
            headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Forward a request body to `<upstream>/models/<model>`.
///
/// Accepts every method so non-POST requests get the contract's 405 rather
/// than the router's default.
pub async fn forward(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    if method != Method::POST {
        return Err(ProxyError::MethodNotAllowed);
    }

    let Query(params) =
        Query::<ForwardParams>::try_from_uri(&uri).map_err(|_| ProxyError::MissingParams)?;
    let (token, model) = match (non_empty(params.token), non_empty(params.model)) {
        (Some(token), Some(model)) => (token, model),
        _ => return Err(ProxyError::MissingParams),
    };
    check_model(&model)?;
    let content_type = forwarded_content_type(params.content_type, &headers);

    tracing::debug!("Forwarding {} bytes ({content_type}) to {model}", body.len());
    let reply = state
        .upstream
        .forward(&model, &token, &content_type, body)
        .await
        .map_err(|e| ProxyError::Internal(e.to_string()))?;

    if !(200..300).contains(&reply.status) {
        return Err(ProxyError::Upstream {
            status: reply.status,
            body: String::from_utf8_lossy(&reply.body).into_owned(),
        });
    }

    // Only relay well-formed JSON; the body itself goes out untouched
    serde_json::from_slice::<serde::de::IgnoredAny>(&reply.body)
        .map_err(|e| ProxyError::Internal(format!("invalid JSON from inference API: {e}")))?;

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    Ok((status, [(CONTENT_TYPE, "application/json")], reply.body).into_response())
}

/// Response of the caption endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionResponse {
    pub caption: String,
}

/// Caption an uploaded image with the server's own token.
///
/// Expects `multipart/form-data` with the image in a `file` field.
pub async fn generate(
    State(state): State<Arc<ProxyState>>,
    mut multipart: Multipart,
) -> Result<Json<CaptionResponse>, ProxyError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProxyError::BadUpload(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ProxyError::BadUpload(e.to_string()))?;

        let mut image = UploadedImage::new(data.to_vec(), mime_type);
        if let Some(name) = name {
            image = image.with_name(name);
        }
        upload = Some(image);
        break;
    }

    let image = upload.ok_or_else(|| ProxyError::BadUpload("missing 'file' field".to_string()))?;
    state.captioner.validate(&image)?;
    let caption = state.captioner.caption(&image).await?;
    tracing::info!(
        "Captioned {}: {caption}",
        image.name().unwrap_or(image.mime_type())
    );
    Ok(Json(CaptionResponse {
        caption: caption.into_inner(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_bodies() {
        assert_eq!(ProxyError::MethodNotAllowed.to_string(), "Method Not Allowed");
        assert_eq!(
            ProxyError::MissingParams.to_string(),
            "Missing token or model query parameter."
        );
        let upstream = ProxyError::Upstream {
            status: 429,
            body: "Rate limit reached".to_string(),
        };
        assert_eq!(upstream.to_string(), "Hugging Face API error: 429, Rate limit reached");
        assert_eq!(upstream.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_check_model() {
        assert!(check_model("Salesforce/blip-image-captioning-large").is_ok());
        assert!(check_model("gpt2").is_ok());
        assert!(check_model("../admin").is_err());
        assert!(check_model("/etc").is_err());
        assert!(check_model("a//b").is_err());
        assert!(check_model("a?x=1").is_err());
        assert!(check_model("%2e%2e/secret").is_err());
        assert!(check_model("org/%2E/model").is_err());
        assert!(check_model(".%2e/secret").is_err());
    }

    #[test]
    fn test_forwarded_content_type_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "image/jpeg".parse().unwrap());

        assert_eq!(
            forwarded_content_type(Some("image/png".to_string()), &headers),
            "image/png"
        );
        assert_eq!(forwarded_content_type(Some(String::new()), &headers), "image/jpeg");
        assert_eq!(
            forwarded_content_type(None, &HeaderMap::new()),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_pipeline_error_mapping() {
        let err: ProxyError = PipelineError::RemoteApi {
            model: "m".to_string(),
            status: 503,
            body: "loading".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ProxyError = PipelineError::InvalidImage {
            mime_type: "text/plain".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ProxyError = PipelineError::MissingToken.into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
