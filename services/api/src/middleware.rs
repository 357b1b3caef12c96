//! Session and API-key authentication middleware

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use common::session::{SESSION_COOKIE, parse_bearer};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Header carrying the ingress secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// The caller's token: the bearer header first, then the session cookie
fn request_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// Authentication middleware
///
/// Resolves the caller's login session and inserts it into the request
/// extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request_token(req.headers()).ok_or(ApiError::Unauthorized)?;

    let session = state
        .sessions
        .find_valid_login(&token)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Constant-time comparison against the configured secret
///
/// An unconfigured secret rejects every key.
pub fn api_key_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (Some(expected), Some(provided)) if !expected.is_empty() => {
            expected.as_bytes().ct_eq(provided.as_bytes()).into()
        }
        _ => false,
    }
}

/// Reject ingress calls without the right `x-api-key`, before the body is read
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if !api_key_matches(state.settings.voyager_api_key.as_deref(), provided) {
        warn!("Rejected ingress call to {} with invalid API key", req.uri().path());
        return Err(ApiError::InvalidApiKey);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_api_key_matches() {
        assert!(api_key_matches(Some("secret"), Some("secret")));
        assert!(!api_key_matches(Some("secret"), Some("secreT")));
        assert!(!api_key_matches(Some("secret"), Some("secret2")));
        assert!(!api_key_matches(Some("secret"), None));
        assert!(!api_key_matches(None, Some("secret")));
        assert!(!api_key_matches(Some(""), Some("")));
    }

    #[test]
    fn test_request_token_sources() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("voyager_token=cookie"));
        assert_eq!(request_token(&headers).as_deref(), Some("cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(request_token(&headers).as_deref(), Some("header"));
    }
}
