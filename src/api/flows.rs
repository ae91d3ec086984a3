// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use super::{authorize, parse_doc_id, ApiError, ApiJson, AppState};
use crate::auth::AuthUser;
use crate::model::{Flow, FlowGraph, FlowId};

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateFlowBody {
    flowchart: FlowGraph,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateFlowNameBody {
    flow_id: Option<String>,
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteFlowBody {
    flow_id: Option<String>,
}

/// GET /flows — the owner's summary index verbatim; no graph loads.
pub(crate) async fn list_flows(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let summaries = state.db.flow_summaries(&user_id).await?;
    Ok((StatusCode::OK, Json(summaries)).into_response())
}

/// POST /flows — seeds the root node and the summary entry in one
/// transaction.
pub(crate) async fn create_flow(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let summary = state.db.create_flow(&user_id).await?;
    Ok((StatusCode::CREATED, Json(summary)).into_response())
}

/// GET /flows/{id}
pub(crate) async fn get_flow(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let flow_id: FlowId = parse_doc_id(&raw_id, "Flowchart")?;
    let flow = authorize(state.db.flow_by_id(&flow_id).await?, &user_id)?;
    Ok((StatusCode::OK, Json(flow)).into_response())
}

/// PUT /flows/{id} — full replacement of the graph payload, last-write-wins.
pub(crate) async fn update_flow(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpdateFlowBody>,
) -> Result<Response, ApiError> {
    let flow_id: FlowId = parse_doc_id(&raw_id, "Flowchart")?;
    let existing = authorize(state.db.flow_by_id(&flow_id).await?, &user_id)?;

    let updated_at = state
        .db
        .replace_flow_graph(&flow_id, &body.flowchart)
        .await?;
    let updated = Flow {
        id: existing.id,
        user_id: existing.user_id,
        flow: body.flowchart,
        created_at: existing.created_at,
        updated_at,
    };
    Ok((StatusCode::OK, Json(updated)).into_response())
}

/// PUT /flows/update_name — renames the summary entry and the root-node
/// label together.
pub(crate) async fn update_flow_name(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpdateFlowNameBody>,
) -> Result<Response, ApiError> {
    let topic = match body.topic {
        Some(topic) if !topic.trim().is_empty() => topic,
        _ => return Err(ApiError::Validation("Topic is missing.".to_owned())),
    };
    let flow_id: FlowId = parse_doc_id(body.flow_id.as_deref().unwrap_or(""), "Flowchart")?;
    authorize(state.db.flow_by_id(&flow_id).await?, &user_id)?;

    state.db.rename_flow(&user_id, &flow_id, &topic).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /flows — removes the flow, its notes and its summary entry as a
/// unit.
pub(crate) async fn delete_flow(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(body): ApiJson<DeleteFlowBody>,
) -> Result<Response, ApiError> {
    let flow_id: FlowId = parse_doc_id(body.flow_id.as_deref().unwrap_or(""), "Flowchart")?;
    authorize(state.db.flow_by_id(&flow_id).await?, &user_id)?;

    state.db.delete_flow(&user_id, &flow_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
