// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{FlowId, UserId};

/// Identity of the seeded root/topic node. Exactly one node with this id
/// exists in every graph; the client never lets it be deleted.
pub const ROOT_NODE_ID: &str = "0";

/// Label given to the root node of a freshly created flow.
pub const INITIAL_TOPIC: &str = "New Topic";

/// A flowchart document: one owner, one graph payload.
///
/// The graph is fully overwritten (never merged) on update, so the owner
/// reference and timestamps are the only fields the server itself maintains.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub id: FlowId,
    pub user_id: UserId,
    pub flow: FlowGraph,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The client-authored graph payload: nodes, edges, viewport.
///
/// Only the handful of fields the server touches are typed; everything else
/// the graph editor stores per node/edge (dimensions, selection state, ...)
/// is preserved verbatim through flattened maps so a read-after-write returns
/// exactly what the client sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub viewport: Viewport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    /// Empty until the user first opens this node's note.
    #[serde(rename = "noteId", default)]
    pub note_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl FlowGraph {
    /// The graph every new flow starts with: a single root node and no edges.
    ///
    /// The extra node fields mirror what the graph editor writes for a node it
    /// has just placed, so the first client load renders identically to a
    /// client-side creation.
    pub fn initial() -> Self {
        let mut extra = Map::new();
        extra.insert("deletable".to_owned(), Value::Bool(false));
        extra.insert("width".to_owned(), Value::from(100));
        extra.insert("height".to_owned(), Value::from(27));
        extra.insert("selected".to_owned(), Value::Bool(true));
        extra.insert("dragging".to_owned(), Value::Bool(true));

        Self {
            nodes: vec![FlowNode {
                id: ROOT_NODE_ID.to_owned(),
                kind: Some("topicNode".to_owned()),
                position: Some(Position { x: 0.0, y: 0.0 }),
                data: Some(NodeData {
                    label: INITIAL_TOPIC.to_owned(),
                    note_id: String::new(),
                    extra: Map::new(),
                }),
                extra,
            }],
            edges: Vec::new(),
            viewport: Viewport {
                x: 225.29,
                y: 1209.25,
                zoom: 1.0,
            },
        }
    }

    pub fn root_node(&self) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id == ROOT_NODE_ID)
    }

    /// Relabels the root node. Returns false when no root node exists (a
    /// client-supplied graph is not validated beyond ownership, so a graph
    /// without one is tolerated).
    pub fn set_root_label(&mut self, label: &str) -> bool {
        match self.nodes.iter_mut().find(|node| node.id == ROOT_NODE_ID) {
            Some(node) => {
                node.data.get_or_insert_with(NodeData::default).label = label.to_owned();
                true
            }
            None => false,
        }
    }
}
