//! Session cookie handling.
//!
//! The session is the Discord access token itself, carried in a
//! `discord_token` cookie. Presence of the cookie is the sole authentication
//! signal; every protected handler re-validates the token against Discord.

use axum::http::HeaderMap;

pub const COOKIE_NAME: &str = "discord_token";

/// Fixed cookie lifetime in seconds. Discord controls the real token
/// lifetime; this only bounds how long the browser keeps presenting it.
pub const MAX_AGE_SECS: u64 = 6000;

/// Extract the access token from the request's cookies
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let cookie = cookie.trim();
            cookie
                .strip_prefix(COOKIE_NAME)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|value| value.to_string())
        })
}

/// Serialize the session cookie. The dashboard front-end reads the token
/// from JS, so the cookie is deliberately not HttpOnly.
pub fn session_cookie(token: &str, secure: bool) -> String {
    format!(
        "{}={}; Path=/; SameSite=Lax; Max-Age={}{}",
        COOKIE_NAME,
        token,
        MAX_AGE_SECS,
        if secure { "; Secure" } else { "" }
    )
}
