//! Parsing of the hosted models' `[{"generated_text": "..."}]` answers.

use crate::error::PipelineError;
use crate::transport::TransportReply;
use serde::Deserialize;

#[derive(Deserialize)]
struct Generation {
    generated_text: String,
}

/// Extract `generated_text` from the first element of a model's answer.
///
/// Non-2xx replies become [`PipelineError::RemoteApi`]; anything that is not a
/// non-empty array of objects carrying a string `generated_text` becomes
/// [`PipelineError::MalformedResponse`].
pub(crate) fn generated_text(model: &str, reply: TransportReply) -> Result<String, PipelineError> {
    if !reply.is_success() {
        return Err(PipelineError::RemoteApi {
            model: model.to_string(),
            status: reply.status,
            body: reply.body,
        });
    }

    let malformed = |reason: String, reply: TransportReply| PipelineError::MalformedResponse {
        model: model.to_string(),
        status: reply.status,
        body: reply.body,
        reason,
    };

    let generations: Vec<Generation> = match serde_json::from_str(&reply.body) {
        Ok(g) => g,
        Err(e) => return Err(malformed(format!("expected [{{\"generated_text\": ...}}]: {e}"), reply)),
    };

    match generations.into_iter().next() {
        Some(first) => Ok(first.generated_text),
        None => Err(malformed("empty result array".to_string(), reply)),
    }
}
