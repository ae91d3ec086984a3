// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

//! Mindflow — backend for a flowchart + notes mind-mapping app.
//!
//! Users author flowcharts (topic nodes connected by edges) and attach
//! rich-text notes to individual nodes. The surface is a session-cookie
//! authenticated HTTP/JSON API over a SQLite-backed document store.

pub mod api;
pub mod auth;
pub mod model;
pub mod store;

#[cfg(test)]
mod tests {
    #[test]
    fn sanity() {
        assert_eq!(2 + 2, 4);
    }
}
