// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

//! The HTTP/JSON surface.
//!
//! Signup, login and logout are public; everything else sits behind the
//! authentication gate. All error responses share the `{message}` body shape
//! produced by [`ApiError`].

pub mod error;
mod flows;
mod notes;
mod users;

use axum::extract::{DefaultBodyLimit, FromRequest, Request};
use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::model::{Flow, Id, Note, UserId};
use crate::store::Database;

pub use error::{ApiError, GENERIC_ERROR_MESSAGE};

/// Request bodies above this size are rejected before deserialization.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

/// Assembles the full application router.
pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/user", get(users::logged_in_user))
        .route(
            "/flows",
            get(flows::list_flows)
                .post(flows::create_flow)
                .delete(flows::delete_flow),
        )
        .route("/flows/update_name", put(flows::update_flow_name))
        .route("/flows/{id}", get(flows::get_flow).put(flows::update_flow))
        .route(
            "/notes",
            post(notes::create_note).delete(notes::delete_note),
        )
        .route("/notes/{id}", get(notes::get_note).put(notes::update_note))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .merge(gated)
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .fallback(page_not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn page_not_found() -> ApiError {
    ApiError::NotFound("Page Not Found".to_owned())
}

/// JSON body extractor whose rejection keeps the `{message}` error shape
/// (the stock extractor replies with plain text).
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// A document with exactly one owning user.
pub(crate) trait Owned {
    /// Human-readable kind used in "… not found." messages.
    const KIND: &'static str;

    fn owner_id(&self) -> &UserId;
}

impl Owned for Flow {
    const KIND: &'static str = "Flowchart";

    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

impl Owned for Note {
    const KIND: &'static str = "Note";

    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

/// The single ownership-authorization policy: absent document → 404, owner
/// mismatch → 403. Every flow and note handler goes through here; none may
/// skip the owner comparison.
pub(crate) fn authorize<T: Owned>(doc: Option<T>, user_id: &UserId) -> Result<T, ApiError> {
    let Some(doc) = doc else {
        return Err(ApiError::NotFound(format!("{} not found.", T::KIND)));
    };
    if doc.owner_id() != user_id {
        return Err(ApiError::Forbidden("Not authorized".to_owned()));
    }
    Ok(doc)
}

/// Parses a client-supplied document id, mapping failure to the 400
/// "ID is not valid" response.
pub(crate) fn parse_doc_id<T>(raw: &str, kind: &str) -> Result<Id<T>, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("{kind} ID is not valid.")))
}

#[cfg(test)]
mod tests;
