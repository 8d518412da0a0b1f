use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::server::{dynamic::signed_keys::SignedKeys, state::AppState, util::cookie::parse_cookies};

/// Name of the signed tracking cookie.
pub const TRACK_COOKIE: &str = "jt";

const TRACK_COOKIE_MAX_AGE: u64 = 365 * 24 * 60 * 60;

/// Tracking id of the caller, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackId(pub String);

/// Extracts the id of a `<id>.<signature>` cookie value when the signature verifies.
pub fn verify_track_cookie(keys: &SignedKeys, value: &str) -> Option<String> {
    let (id, signature) = value.rsplit_once('.')?;
    if id.is_empty() || !keys.verify(id, signature) {
        return None;
    }
    Some(id.to_string())
}

/// Issues a new tracking id and its signed cookie value.
///
/// Returns `None` when there is no signing key.
pub fn issue_track_cookie(keys: &SignedKeys) -> Option<(String, String)> {
    let id = hex::encode(rand::random::<[u8; 16]>());
    let signature = keys.sign(&id)?;
    let value = format!("{}.{}", id, signature);
    Some((id, value))
}

/// Ensures every caller carries a validly signed tracking cookie.
///
/// A missing or forged cookie is replaced by a fresh one in the response. The
/// resulting [`TrackId`] is available to handlers either way.
pub async fn track(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let keys = &state.dynamic.signed_keys;
    let existing = parse_cookies(req.headers())
        .get(TRACK_COOKIE)
        .and_then(|value| verify_track_cookie(keys, value));

    if let Some(id) = existing {
        req.extensions_mut().insert(TrackId(id));
        return next.run(req).await;
    }

    let Some((id, value)) = issue_track_cookie(keys) else {
        return next.run(req).await;
    };
    req.extensions_mut().insert(TrackId(id));

    let mut response = next.run(req).await;

    let cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        TRACK_COOKIE, value, TRACK_COOKIE_MAX_AGE
    );
    match HeaderValue::from_str(&cookie) {
        Ok(cookie) => {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        Err(e) => warn!("Failed to build tracking cookie: {}", e),
    }

    response
}
