//! # Authentication Module
//!
//! Two independent checks guard the Sprout HTTP API.
//!
//! ## Service API key
//!
//! - `SPROUT_API_KEY`: If set, all requests (except /health) require this key
//!
//! ```text
//! Authorization: Bearer <your-api-key>
//! ```
//!
//! ## Caller identity
//!
//! Sessions are handled by an upstream authenticator, which forwards the
//! authenticated user id in the `X-User-Id` header. Record endpoints take a
//! [`CurrentUser`] and answer 401 when the header is missing.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use sprout_core::UserId;
use subtle::ConstantTimeEq;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Longest accepted user id, in bytes.
const MAX_USER_ID_LENGTH: usize = 128;

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// Get API key from environment variable.
///
/// Returns `Some(key)` if `SPROUT_API_KEY` is set and non-empty,
/// `None` otherwise (disabling authentication).
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var("SPROUT_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

/// Constant-time key comparison over equal-length padded buffers.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

/// API key authentication middleware.
///
/// If `SPROUT_API_KEY` is set:
/// - `/health` endpoint is always allowed (for load balancer health checks)
/// - All other endpoints require `Authorization: Bearer <key>` or the raw key
///
/// If `SPROUT_API_KEY` is not set, all requests are allowed.
pub async fn api_key_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(expected) = get_api_key_from_env() else {
        return Ok(next.run(request).await);
    };

    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            let provided_key = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

            if keys_match(provided_key, &expected) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_api_key",
                    "Authentication failed: invalid API key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// CALLER IDENTITY
// =============================================================================

/// The authenticated caller, taken from the `X-User-Id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if value.is_empty() || value.len() > MAX_USER_ID_LENGTH {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_user_id",
                "Request without a valid user id"
            );
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Unauthorized")),
            ));
        }

        Ok(CurrentUser(UserId::new(value)))
    }
}

// =============================================================================
// TESTS
// =============================================================================
