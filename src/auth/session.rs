// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};

use crate::model::{SessionId, UserId};
use crate::store::{Database, StoreError};

pub const SESSION_COOKIE: &str = "mindflow_sid";

/// Sliding expiration window; refreshed on every authenticated request.
pub const SESSION_TTL_SECS: i64 = 60 * 60;

pub(crate) fn ttl() -> Duration {
    Duration::seconds(SESSION_TTL_SECS)
}

/// Creates a new session for `user` and returns its id.
pub async fn establish(db: &Database, user: &UserId) -> Result<SessionId, StoreError> {
    db.create_session(user, Utc::now() + ttl()).await
}

/// Extracts the session id from the request's `Cookie` header(s). Anything
/// that does not parse as a session id is treated as absent.
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if name.trim() == SESSION_COOKIE {
                if let Ok(id) = value.trim().parse() {
                    return Some(id);
                }
            }
        }
    }
    None
}

/// `Set-Cookie` value binding the session to the browser for one TTL window.
pub fn session_cookie(id: &SessionId) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; Max-Age={SESSION_TTL_SECS}; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
