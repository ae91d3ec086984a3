// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

//! Core data model.
//!
//! Users own flows (a graph of topic nodes, edges and a viewport) and notes
//! (opaque rich-text blocks scoped to a flow). The user document also carries
//! a denormalized list of `{flowId, topic}` summary entries so flows can be
//! listed without loading full graphs.

pub mod flow;
pub mod ids;
pub mod note;
pub mod user;

pub use flow::{Flow, FlowEdge, FlowGraph, FlowNode, NodeData, Position, Viewport};
pub use flow::{INITIAL_TOPIC, ROOT_NODE_ID};
pub use ids::{FlowId, Id, IdError, NoteId, SessionId, UserId};
pub use note::Note;
pub use user::{FlowSummary, User};
