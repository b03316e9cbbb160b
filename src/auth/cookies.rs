//! Session cookie construction.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

/// Long-lived cookie set by password login.
pub const SESSION_COOKIE: &str = "sessionId";
/// Short-lived cookie set by ticket redemption.
pub const TICKET_COOKIE: &str = "ticketId";
/// Query parameter carrying a ticket on a bootstrap link.
pub const TICKET_PARAM: &str = "ticket";

/// Build a cookie carrying `token` that expires with its session.
///
/// An expiry past what a cookie date can hold leaves `Expires` off, so the
/// cookie lasts for the browser session instead of being dropped at once.
pub fn session_cookie(
    name: &'static str,
    token: &str,
    expires_on: u64,
    secure: bool,
) -> Cookie<'static> {
    let builder = Cookie::build((name, token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/");

    match cookie_date(expires_on) {
        Some(expires) => builder.expires(expires).build(),
        None => {
            tracing::warn!(
                cookie = name,
                expires_on,
                "Session expiry out of range, cookie set without Expires"
            );
            builder.build()
        }
    }
}

fn cookie_date(secs: u64) -> Option<OffsetDateTime> {
    let secs = i64::try_from(secs).ok()?;
    OffsetDateTime::from_unix_timestamp(secs).ok()
}

/// Build an empty, already expired cookie that clears `name`.
pub fn cleared_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Non-empty value of `name`, if the request carried it.
pub fn token(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
