//! Session extraction and authentication middleware

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use common::session::{ClientMetadata, SESSION_COOKIE, parse_bearer};
use tracing::debug;

use crate::{AppState, error::AuthError};

/// The caller's token: the bearer header first, then the session cookie
pub fn request_token(headers: &HeaderMap) -> Option<String> {
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

/// Client metadata recorded with new login sessions
pub fn client_metadata(headers: &HeaderMap) -> ClientMetadata {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    ClientMetadata {
        user_agent: header_str(header::USER_AGENT.as_str()),
        ip_address: header_str("x-forwarded-for")
            .and_then(|forwarded| forwarded.split(',').next().map(|ip| ip.trim().to_string()))
            .filter(|ip| !ip.is_empty()),
    }
}

/// Reject requests without a live login session
///
/// The resolved [`common::session::LoginSession`] is added to the request
/// extensions for the handlers.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request_token(req.headers()).ok_or(AuthError::Unauthorized)?;

    let session = state
        .sessions
        .find_valid_login(&token)
        .await?
        .ok_or_else(|| {
            debug!("Rejected request with invalid session");
            AuthError::Unauthorized
        })?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
