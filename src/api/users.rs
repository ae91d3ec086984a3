// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiError, ApiJson, AppState};
use crate::auth::{self, password, AuthUser};
use crate::model::UserId;

/// The only projection of a user ever sent to clients.
#[derive(Debug, Serialize)]
struct UserResponse {
    id: UserId,
    username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignupBody {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    email: Option<String>,
    password: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::Validation(format!("{name} is missing."))),
    }
}

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

pub(crate) async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupBody>,
) -> Result<Response, ApiError> {
    let username = required(body.username, "Username")?;
    let email = required(body.email, "Email")?;
    let password_raw = required(body.password, "Password")?;

    if state.db.user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already taken.".to_owned()));
    }

    let password_hash = password::hash(&password_raw)?;
    // The unique index still backstops a concurrent signup; StoreError
    // maps it to the same 409.
    let user = state
        .db
        .insert_user(&username, &email, &password_hash)
        .await?;
    let session_id = auth::establish(&state.db, &user.id).await?;

    let response = (
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
        }),
    )
        .into_response();
    Ok(with_cookie(response, &auth::session_cookie(&session_id)))
}

pub(crate) async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Response, ApiError> {
    let email = required(body.email, "Email")?;
    let password_raw = required(body.password, "Password")?;

    // Unknown email and wrong password reject identically so the endpoint
    // cannot be used to enumerate accounts.
    let Some(user) = state.db.user_by_email(&email).await? else {
        return Err(ApiError::Auth("Invalid credentials".to_owned()));
    };
    if !password::verify(&password_raw, &user.password_hash) {
        return Err(ApiError::Auth("Invalid credentials".to_owned()));
    }

    let session_id = auth::establish(&state.db, &user.id).await?;
    let response = (
        StatusCode::OK,
        Json(UserResponse {
            id: user.id,
            username: user.username,
        }),
    )
        .into_response();
    Ok(with_cookie(response, &auth::session_cookie(&session_id)))
}

pub(crate) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session_id) = auth::session_from_headers(&headers) {
        if let Err(err) = state.db.destroy_session(&session_id).await {
            tracing::error!(error = %err, "session destroy failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to log out. Please try again." })),
            )
                .into_response();
        }
    }
    with_cookie(
        StatusCode::NO_CONTENT.into_response(),
        &auth::expired_cookie(),
    )
}

pub(crate) async fn logged_in_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    // The session can outlive its user if the row was removed out-of-band.
    let Some(user) = state.db.user_by_id(&user_id).await? else {
        return Err(ApiError::NotFound("User not found.".to_owned()));
    };
    Ok((
        StatusCode::OK,
        Json(UserResponse {
            id: user.id,
            username: user.username,
        }),
    )
        .into_response())
}
