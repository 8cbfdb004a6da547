use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use cryptopay_core::payment::ValidationError;

/// Parses a JSON object body. Empty, non-JSON and non-object bodies are
/// validation errors rather than extractor rejections.
pub fn parse_json_object<T: DeserializeOwned>(body: &Bytes) -> Result<T, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::MalformedBody("body is empty".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
    if !value.is_object() {
        return Err(ValidationError::MalformedBody(
            "expected a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| ValidationError::MalformedBody(e.to_string()))
}
