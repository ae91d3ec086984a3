// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{FlowId, UserId};

/// An account. The password hash never leaves the server: responses are
/// always projections (id + username) built in the handlers.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Denormalized index of the flows this user owns, mutated whenever a
    /// flow is created, renamed or deleted. Served verbatim by the listing
    /// endpoint so no graph documents are loaded.
    pub flows: Vec<FlowSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One `{flowId, topic}` entry of the per-user flow index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub flow_id: FlowId,
    pub topic: String,
}
