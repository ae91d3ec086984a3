// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::ids::{FlowId, NoteId, UserId};

/// A rich-text note attached to one node of one flow.
///
/// Content is an ordered sequence of editor blocks the server treats as
/// opaque JSON; updates replace the whole sequence (last-write-wins).
#[derive(Debug, Clone)]
pub struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub flow_id: FlowId,
    pub content: Vec<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// The single heading block every note starts with.
    pub fn initial_content() -> Vec<Value> {
        vec![json!({
            "type": "heading",
            "content": "Title",
        })]
    }
}
