// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

//! Authentication: password hashing, the session lifecycle and the gate
//! middleware that stands in front of every business-logic route.

pub mod password;
pub mod session;

use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::api::{ApiError, AppState};
use crate::model::UserId;

pub use session::{establish, expired_cookie, session_cookie, session_from_headers};
pub use session::{SESSION_COOKIE, SESSION_TTL_SECS};

/// The authenticated user's identity, populated once by [`require_session`]
/// and read by handlers through a request extension. There is no other
/// channel for per-request identity.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

/// Authentication gate. Rejects any request without a valid, unexpired
/// session before handler logic runs; on success it slides the session
/// expiry forward (rolling sessions) and re-issues the cookie.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(session_id) = session_from_headers(request.headers()) else {
        return Err(ApiError::Auth("User not authenticated".to_owned()));
    };

    let now = Utc::now();
    let refreshed = now + session::ttl();
    let Some(user_id) = state.db.resolve_session(&session_id, now, refreshed).await? else {
        return Err(ApiError::Auth("User not authenticated".to_owned()));
    };

    request.extensions_mut().insert(AuthUser(user_id));
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&session_cookie(&session_id)) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}
