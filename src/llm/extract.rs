use serde::de::DeserializeOwned;
use thiserror::Error;

pub const START_TAG: &str = "<start>";
pub const END_TAG: &str = "<end>";

/// The model answer did not contain a usable tagged payload. The raw answer
/// is kept for diagnostics.
#[derive(Debug, Error)]
pub enum ResponseFormatError {
    #[error("model response is missing the {tag} delimiter")]
    MissingDelimiter { tag: &'static str, raw: String },
    #[error("model response payload is not valid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
}

impl ResponseFormatError {
    pub fn raw(&self) -> &str {
        match self {
            ResponseFormatError::MissingDelimiter { raw, .. } => raw,
            ResponseFormatError::InvalidJson { raw, .. } => raw,
        }
    }
}

/// Returns the text between the first `<start>` and the next `<end>`.
pub fn tagged_payload(raw: &str) -> Result<&str, ResponseFormatError> {
    let start = raw.find(START_TAG).ok_or_else(|| ResponseFormatError::MissingDelimiter {
        tag: START_TAG,
        raw: raw.to_string(),
    })? + START_TAG.len();
    let end = raw[start..]
        .find(END_TAG)
        .ok_or_else(|| ResponseFormatError::MissingDelimiter {
            tag: END_TAG,
            raw: raw.to_string(),
        })?;
    Ok(strip_code_fence(raw[start..start + end].trim()))
}

/// Parses the tagged JSON block of a model answer into `T`.
pub fn extract_tagged_json<T: DeserializeOwned>(raw: &str) -> Result<T, ResponseFormatError> {
    let payload = tagged_payload(raw)?;
    serde_json::from_str(payload).map_err(|source| ResponseFormatError::InvalidJson {
        source,
        raw: raw.to_string(),
    })
}

// Models sometimes wrap the block in ```json ... ``` even inside the tags.
fn strip_code_fence(content: &str) -> &str {
    if content.starts_with("```") && content.ends_with("```") && content.len() >= 6 {
        content
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        content
    }
}
