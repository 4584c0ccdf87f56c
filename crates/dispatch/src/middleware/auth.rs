//! API key authentication.
//!
//! When `DISPATCH_API_KEY` is configured, every `/api` and `/functions` request
//! must present it either as `Authorization: Bearer <key>` or in an `apikey`
//! header. Without a configured key the extractor lets everything through.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::config::api_key_matches;
use crate::error::AppError;
use crate::state::AppState;

/// Alternate header accepted alongside `Authorization`.
pub const API_KEY_HEADER: &str = "apikey";

/// Extractor that requires the configured API key.
///
/// Installed on routers with `axum::middleware::from_extractor_with_state`.
#[derive(Debug, Clone, Copy)]
pub struct RequireApiKey;

fn presented_key(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    bearer.or_else(|| {
        parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    })
}

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config().api_key() else {
            return Ok(Self);
        };

        match presented_key(parts) {
            Some(key) if api_key_matches(expected, key) => Ok(Self),
            Some(_) => {
                tracing::warn!(path = %parts.uri.path(), "Rejected request with wrong API key");
                Err(AppError::Unauthorized("Invalid API key".to_string()))
            }
            None => Err(AppError::Unauthorized("Missing API key".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: (&str, &str)) -> Parts {
        let (parts, ()) = Request::builder()
            .uri("/api/customers")
            .header(header.0, header.1)
            .body(())
            .expect("request")
            .into_parts();
        parts
    }

    #[test]
    fn test_presented_key_sources() {
        assert_eq!(
            presented_key(&parts(("authorization", "Bearer abc"))),
            Some("abc")
        );
        assert_eq!(presented_key(&parts(("apikey", " abc "))), Some("abc"));
        assert_eq!(presented_key(&parts(("authorization", "Basic abc"))), None);
    }
}
