//! Query-parameter validation (§4.6): malformed geohash/style tokens return
//! 400 with a field-level reason; unknown parameters are simply ignored by
//! virtue of `axum`'s `Query` extractor only binding the fields it knows.

use crate::error::ApiError;

const GEOHASH_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

pub fn validate_style(style: &str) -> Result<String, ApiError> {
    let trimmed = style.trim();
    if trimmed.is_empty() || trimmed.len() > 64 {
        return Err(ApiError::InvalidInput {
            field: "style".to_string(),
            reason: "must be 1-64 characters".to_string(),
        });
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::InvalidInput {
            field: "style".to_string(),
            reason: "must contain only letters, digits, '_' or '-'".to_string(),
        });
    }
    Ok(trimmed.to_lowercase())
}

/// Validates a geohash (or geohash prefix, as used for a `postcode`-derived
/// filter — §6 "optional geospatial filter derived from a postcode-to-geohash
/// mapping"). Rejects anything outside the standard base32 geohash alphabet.
pub fn validate_geohash_prefix(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() || trimmed.len() > 12 {
        return Err(ApiError::InvalidInput {
            field: field.to_string(),
            reason: "must be 1-12 characters".to_string(),
        });
    }
    if !trimmed.chars().all(|c| GEOHASH_ALPHABET.contains(c)) {
        return Err(ApiError::InvalidInput {
            field: field.to_string(),
            reason: "not a valid geohash".to_string(),
        });
    }
    Ok(trimmed)
}
