// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

//! Persistence for users, flows, notes and sessions.
//!
//! The store module wraps a SQLite pool; document payloads (graphs, note
//! blocks, flow summaries) live in JSON text columns. The flow create,
//! delete and rename sequences are the only multi-statement transactions.

pub mod database;

pub use database::{Database, StoreError};
