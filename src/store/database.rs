// SPDX-FileCopyrightText: 2026 Mindflow contributors
// SPDX-License-Identifier: MIT

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};

use crate::model::{
    Flow, FlowGraph, FlowId, FlowSummary, Id, Note, NoteId, SessionId, User, UserId,
    INITIAL_TOPIC,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    flows         TEXT NOT NULL DEFAULT '[]',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS flows (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    graph      TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    flow_id    TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_flow_id ON notes(flow_id);

CREATE TABLE IF NOT EXISTS sessions (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id),
    expires_at TEXT NOT NULL
);
"#;

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Json(serde_json::Error),
    /// The unique index on `users.email` fired.
    EmailTaken,
    /// A write targeted a user row that no longer exists.
    NoSuchUser,
    /// A stored id or payload failed to parse back into its model type.
    Corrupt { column: &'static str },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(source) => write!(f, "database error: {source}"),
            Self::Json(source) => write!(f, "document payload error: {source}"),
            Self::EmailTaken => f.write_str("email is already registered"),
            Self::NoSuchUser => f.write_str("user row does not exist"),
            Self::Corrupt { column } => write!(f, "stored value in {column} is corrupt"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(source) => Some(source),
            Self::Json(source) => Some(source),
            Self::EmailTaken | Self::NoSuchUser | Self::Corrupt { .. } => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(source: sqlx::Error) -> Self {
        Self::Database(source)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json(source)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(dbe)
            if matches!(dbe.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

fn parse_id<T>(raw: &str, column: &'static str) -> Result<Id<T>, StoreError> {
    raw.parse().map_err(|_| StoreError::Corrupt { column })
}

/// Handle to the document store. Cheap to clone; every handler shares the
/// same underlying pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self { pool })
    }

    /// A private in-memory database. One connection, kept alive, so the
    /// schema and data survive between calls. Same connection options as
    /// [`Database::connect`].
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    // ---- users -----------------------------------------------------------

    pub async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let id = UserId::generate();
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, flows, created_at, updated_at) \
             VALUES (?, ?, ?, ?, '[]', ?, ?)",
        )
        .bind(id.to_string())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(User {
                id,
                username: username.to_owned(),
                email: email.to_owned(),
                password_hash: password_hash.to_owned(),
                flows: Vec::new(),
                created_at: now,
                updated_at: now,
            }),
            Err(err) if is_unique_violation(&err) => Err(StoreError::EmailTaken),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// The denormalized flow index, served verbatim by the listing endpoint.
    pub async fn flow_summaries(&self, user: &UserId) -> Result<Vec<FlowSummary>, StoreError> {
        let row = sqlx::query("SELECT flows FROM users WHERE id = ?")
            .bind(user.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let raw: String = row.try_get("flows")?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(Vec::new()),
        }
    }

    // ---- flows -----------------------------------------------------------

    /// Creates a flow seeded with the single root node and appends its
    /// summary entry to the owner's index. Both writes commit or neither.
    pub async fn create_flow(&self, owner: &UserId) -> Result<FlowSummary, StoreError> {
        let id = FlowId::generate();
        let now = Utc::now();
        let graph_json = serde_json::to_string(&FlowGraph::initial())?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO flows (id, user_id, graph, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(owner.to_string())
        .bind(&graph_json)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let summary = FlowSummary {
            flow_id: id,
            topic: INITIAL_TOPIC.to_owned(),
        };
        let mut summaries = load_summaries(&mut tx, owner).await?;
        summaries.push(summary.clone());
        store_summaries(&mut tx, owner, &summaries, now).await?;

        tx.commit().await?;
        Ok(summary)
    }

    pub async fn flow_by_id(&self, id: &FlowId) -> Result<Option<Flow>, StoreError> {
        let row = sqlx::query("SELECT * FROM flows WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(flow_from_row).transpose()
    }

    /// Full replacement of the graph payload — last-write-wins, no merge.
    /// Returns the new `updated_at`.
    pub async fn replace_flow_graph(
        &self,
        id: &FlowId,
        graph: &FlowGraph,
    ) -> Result<DateTime<Utc>, StoreError> {
        let now = Utc::now();
        sqlx::query("UPDATE flows SET graph = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(graph)?)
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(now)
    }

    /// Renames a flow: the owner's summary entry and the graph's root-node
    /// label change together in one transaction, so the two can never
    /// diverge on failure.
    pub async fn rename_flow(
        &self,
        owner: &UserId,
        id: &FlowId,
        topic: &str,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut summaries = load_summaries(&mut tx, owner).await?;
        if let Some(entry) = summaries.iter_mut().find(|entry| entry.flow_id == *id) {
            entry.topic = topic.to_owned();
        }
        store_summaries(&mut tx, owner, &summaries, now).await?;

        let row = sqlx::query("SELECT graph FROM flows WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(row) = row {
            let raw: String = row.try_get("graph")?;
            let mut graph: FlowGraph = serde_json::from_str(&raw)?;
            graph.set_root_label(topic);
            sqlx::query("UPDATE flows SET graph = ?, updated_at = ? WHERE id = ?")
                .bind(serde_json::to_string(&graph)?)
                .bind(now)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a flow, every note referencing it, and its summary entry.
    /// All three writes commit or none.
    pub async fn delete_flow(&self, owner: &UserId, id: &FlowId) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM notes WHERE flow_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM flows WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        let mut summaries = load_summaries(&mut tx, owner).await?;
        summaries.retain(|entry| entry.flow_id != *id);
        store_summaries(&mut tx, owner, &summaries, now).await?;

        tx.commit().await?;
        Ok(())
    }

    // ---- notes -----------------------------------------------------------

    pub async fn insert_note(&self, owner: &UserId, flow: &FlowId) -> Result<Note, StoreError> {
        let id = NoteId::generate();
        let now = Utc::now();
        let content = Note::initial_content();
        sqlx::query(
            "INSERT INTO notes (id, user_id, flow_id, content, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(owner.to_string())
        .bind(flow.to_string())
        .bind(serde_json::to_string(&content)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Note {
            id,
            user_id: *owner,
            flow_id: *flow,
            content,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn note_by_id(&self, id: &NoteId) -> Result<Option<Note>, StoreError> {
        let row = sqlx::query("SELECT * FROM notes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(note_from_row).transpose()
    }

    /// Wholesale replacement of the block content (last-write-wins).
    pub async fn replace_note_content(
        &self,
        id: &NoteId,
        content: &[Value],
    ) -> Result<DateTime<Utc>, StoreError> {
        let now = Utc::now();
        sqlx::query("UPDATE notes SET content = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(content)?)
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(now)
    }

    pub async fn delete_note(&self, id: &NoteId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- sessions --------------------------------------------------------

    pub async fn create_session(
        &self,
        user: &UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionId, StoreError> {
        let id = SessionId::generate();
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(user.to_string())
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Resolves a session to its user, sliding the expiry forward (rolling
    /// sessions). Expired rows are deleted on sight and resolve to `None`.
    pub async fn resolve_session(
        &self,
        id: &SessionId,
        now: DateTime<Utc>,
        refreshed_expiry: DateTime<Utc>,
    ) -> Result<Option<UserId>, StoreError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
        if expires_at <= now {
            self.destroy_session(id).await?;
            return Ok(None);
        }

        sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
            .bind(refreshed_expiry)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        let raw: String = row.try_get("user_id")?;
        Ok(Some(parse_id(&raw, "sessions.user_id")?))
    }

    pub async fn destroy_session(&self, id: &SessionId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn load_summaries(
    tx: &mut Transaction<'_, Sqlite>,
    user: &UserId,
) -> Result<Vec<FlowSummary>, StoreError> {
    let row = sqlx::query("SELECT flows FROM users WHERE id = ?")
        .bind(user.to_string())
        .fetch_optional(&mut **tx)
        .await?;
    let Some(row) = row else {
        return Err(StoreError::NoSuchUser);
    };
    let raw: String = row.try_get("flows")?;
    Ok(serde_json::from_str(&raw)?)
}

async fn store_summaries(
    tx: &mut Transaction<'_, Sqlite>,
    user: &UserId,
    summaries: &[FlowSummary],
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE users SET flows = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(summaries)?)
        .bind(now)
        .bind(user.to_string())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    let id_raw: String = row.try_get("id")?;
    let flows_raw: String = row.try_get("flows")?;
    Ok(User {
        id: parse_id(&id_raw, "users.id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        flows: serde_json::from_str(&flows_raw)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn flow_from_row(row: &SqliteRow) -> Result<Flow, StoreError> {
    let id_raw: String = row.try_get("id")?;
    let user_raw: String = row.try_get("user_id")?;
    let graph_raw: String = row.try_get("graph")?;
    Ok(Flow {
        id: parse_id(&id_raw, "flows.id")?,
        user_id: parse_id(&user_raw, "flows.user_id")?,
        flow: serde_json::from_str(&graph_raw)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn note_from_row(row: &SqliteRow) -> Result<Note, StoreError> {
    let id_raw: String = row.try_get("id")?;
    let user_raw: String = row.try_get("user_id")?;
    let flow_raw: String = row.try_get("flow_id")?;
    let content_raw: String = row.try_get("content")?;
    Ok(Note {
        id: parse_id(&id_raw, "notes.id")?,
        user_id: parse_id(&user_raw, "notes.user_id")?,
        flow_id: parse_id(&flow_raw, "notes.flow_id")?,
        content: serde_json::from_str(&content_raw)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
