// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{authorize, parse_doc_id, ApiError, ApiJson, AppState};
use crate::auth::AuthUser;
use crate::model::{FlowId, NoteId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNoteBody {
    flow_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateNoteBody {
    content: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteNoteBody {
    note_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteCreated {
    id: NoteId,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteResponse {
    updated_at: DateTime<Utc>,
    content: Vec<Value>,
}

/// POST /notes — seeds the single heading block. The referenced flow must
/// exist and belong to the caller; a note can never be attached to someone
/// else's flow.
pub(crate) async fn create_note(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateNoteBody>,
) -> Result<Response, ApiError> {
    let flow_id: FlowId = parse_doc_id(body.flow_id.as_deref().unwrap_or(""), "Flowchart")?;
    authorize(state.db.flow_by_id(&flow_id).await?, &user_id)?;

    let note = state.db.insert_note(&user_id, &flow_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(NoteCreated {
            id: note.id,
            updated_at: note.updated_at,
        }),
    )
        .into_response())
}

/// GET /notes/{id}
pub(crate) async fn get_note(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let note_id: NoteId = parse_doc_id(&raw_id, "Note")?;
    let note = authorize(state.db.note_by_id(&note_id).await?, &user_id)?;
    Ok((
        StatusCode::OK,
        Json(NoteResponse {
            updated_at: note.updated_at,
            content: note.content,
        }),
    )
        .into_response())
}

/// PUT /notes/{id} — wholesale replacement of the block content.
pub(crate) async fn update_note(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpdateNoteBody>,
) -> Result<Response, ApiError> {
    let note_id: NoteId = parse_doc_id(&raw_id, "Note")?;
    authorize(state.db.note_by_id(&note_id).await?, &user_id)?;

    state.db.replace_note_content(&note_id, &body.content).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /notes
pub(crate) async fn delete_note(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<DeleteNoteBody>,
) -> Result<Response, ApiError> {
    let note_id: NoteId = parse_doc_id(body.note_id.as_deref().unwrap_or(""), "Note")?;
    authorize(state.db.note_by_id(&note_id).await?, &user_id)?;

    state.db.delete_note(&note_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
