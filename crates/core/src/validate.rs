use crate::errors::ValidationError;

/// Upper bound on `schema.len() + json.len()` accepted from callers.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Shape check applied by the request layer. Stores never look inside payloads.
pub fn validate_payload(schema: &str, json: &str, limit: usize) -> Result<(), ValidationError> {
    if schema.trim().is_empty() {
        return Err(ValidationError::EmptySchema);
    }
    if json.trim().is_empty() {
        return Err(ValidationError::EmptyJson);
    }
    if schema.len().saturating_add(json.len()) > limit {
        return Err(ValidationError::TooLarge { limit });
    }
    Ok(())
}
