// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::password::PasswordHashError;
use crate::store::StoreError;

/// What a client sees when a failure does not match a known kind. Internal
/// detail never leaks; it goes to the log instead.
pub const GENERIC_ERROR_MESSAGE: &str = "An unknown error occurred";

/// The error taxonomy of the HTTP surface. Every handler propagates into
/// this type and a single [`IntoResponse`] impl maps it to a status code and
/// a JSON `{message}` body.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input (400).
    Validation(String),
    /// Missing or invalid credentials or session (401).
    Auth(String),
    /// Ownership mismatch (403).
    Forbidden(String),
    /// Missing document (404).
    NotFound(String),
    /// Duplicate unique field (409).
    Conflict(String),
    /// Everything unclassified (500).
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::Auth(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => message,
            Self::Internal => GENERIC_ERROR_MESSAGE,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken => Self::Conflict("Email already taken.".to_owned()),
            StoreError::NoSuchUser => Self::NotFound("User not found.".to_owned()),
            other => {
                tracing::error!(error = %other, "store operation failed");
                Self::Internal
            }
        }
    }
}

impl From<PasswordHashError> for ApiError {
    fn from(err: PasswordHashError) -> Self {
        tracing::error!(error = %err, "password hashing failed");
        Self::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.message() }))).into_response()
    }
}
