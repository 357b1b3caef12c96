//! Page-navigation guard keyed on the session cookie
//!
//! Only the cookie's presence is checked here; the session itself is
//! validated by the endpoints the pages call.

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use common::session::SESSION_COOKIE;
use reqwest::Url;

/// Pages that require a signed-in visitor, including everything below them
pub const PROTECTED_PREFIXES: [&str; 5] = [
    "/alerts",
    "/favorites",
    "/history",
    "/preferences",
    "/statistics",
];

/// Pages that a signed-in visitor is sent away from
pub const AUTH_PAGES: [&str; 3] = ["/login", "/register", "/forgot-password"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    /// Send to the login page, remembering where the visitor was going
    ToLogin(String),
    ToHome,
}

fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// `/login?redirect=<path>` with the path form-encoded
fn login_location(path: &str) -> String {
    match Url::parse("http://localhost/login") {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("redirect", path);
            format!("{}?{}", url.path(), url.query().unwrap_or_default())
        }
        Err(_) => "/login".to_string(),
    }
}

pub fn decide(path: &str, has_session_cookie: bool) -> GuardDecision {
    if is_protected(path) && !has_session_cookie {
        return GuardDecision::ToLogin(login_location(path));
    }

    if has_session_cookie && AUTH_PAGES.contains(&path) {
        return GuardDecision::ToHome;
    }

    GuardDecision::Pass
}

/// Middleware applying [`decide`] to every request
pub async fn route_guard(jar: CookieJar, req: Request<Body>, next: Next) -> Response {
    let has_session_cookie = jar
        .get(SESSION_COOKIE)
        .is_some_and(|cookie| !cookie.value().is_empty());

    match decide(req.uri().path(), has_session_cookie) {
        GuardDecision::Pass => next.run(req).await,
        GuardDecision::ToLogin(location) => Redirect::temporary(&location).into_response(),
        GuardDecision::ToHome => Redirect::temporary("/").into_response(),
    }
}
