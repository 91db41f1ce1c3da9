//! The per-process `SQLite` store.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time checked)
//! so no live database is required at build time. All queries are
//! parameterized. Every write is an idempotent upsert keyed by `id`; every
//! row body is the JSON projection of the corresponding value object, with
//! the columns needed for filtering broken out alongside.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

use swarm_agents::AgentState;
use swarm_types::{AgentId, CollectiveMemory, Decision, Signal, Thought};

use crate::error::StoreError;

/// Schema bootstrap statements, executed once at open.
const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS agents (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        body TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS thoughts (
        id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS decisions (
        id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pheromones (
        id TEXT PRIMARY KEY,
        producer_id TEXT NOT NULL,
        body TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS collective_memories (
        id TEXT PRIMARY KEY,
        topic TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
];

/// Handle to the per-process store.
#[derive(Clone)]
pub struct SwarmStore {
    pool: SqlitePool,
}

impl SwarmStore {
    /// Open (creating if missing) the database file at `path` and ensure
    /// the schema exists.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        info!(path, "store opened");
        Ok(store)
    }

    /// Open an in-memory database (tests and ephemeral runs).
    ///
    /// A single connection keeps the in-memory database alive and shared.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options: SqliteConnectOptions = "sqlite::memory:"
            .parse()
            .map_err(|e: sqlx::Error| StoreError::Config(format!("memory options: {e}")))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    // -- agents -----------------------------------------------------------

    /// Upsert the full agent state.
    pub async fn save_agent(&self, state: &AgentState) -> Result<(), StoreError> {
        let body = serde_json::to_string(state)?;
        sqlx::query(
            "INSERT INTO agents (id, name, body, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 body = excluded.body,
                 updated_at = excluded.updated_at",
        )
        .bind(state.id.as_str())
        .bind(&state.name)
        .bind(body)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load a previously saved agent state, if any.
    pub async fn load_agent(&self, id: &AgentId) -> Result<Option<AgentState>, StoreError> {
        let row = sqlx::query("SELECT body FROM agents WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|r| decode_body(&r, "agent")))
    }

    // -- thoughts ---------------------------------------------------------

    /// Upsert one thought.
    pub async fn save_thought(&self, thought: &Thought) -> Result<(), StoreError> {
        let body = serde_json::to_string(thought)?;
        sqlx::query(
            "INSERT INTO thoughts (id, agent_id, body, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body",
        )
        .bind(thought.id.to_string())
        .bind(thought.producer_id.as_str())
        .bind(body)
        .bind(thought.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The most recent thoughts for an agent, newest first.
    pub async fn load_thoughts(
        &self,
        agent_id: &AgentId,
        limit: u32,
    ) -> Result<Vec<Thought>, StoreError> {
        let rows = sqlx::query(
            "SELECT body FROM thoughts WHERE agent_id = ?
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(agent_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().filter_map(|r| decode_body(r, "thought")).collect())
    }

    // -- decisions --------------------------------------------------------

    /// Upsert one decision.
    pub async fn save_decision(&self, decision: &Decision) -> Result<(), StoreError> {
        let body = serde_json::to_string(decision)?;
        sqlx::query(
            "INSERT INTO decisions (id, agent_id, body, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body",
        )
        .bind(decision.id.to_string())
        .bind(decision.agent_id.as_str())
        .bind(body)
        .bind(decision.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The most recent decisions for an agent, newest first.
    pub async fn load_decisions(
        &self,
        agent_id: &AgentId,
        limit: u32,
    ) -> Result<Vec<Decision>, StoreError> {
        let rows = sqlx::query(
            "SELECT body FROM decisions WHERE agent_id = ?
             ORDER BY created_at DESC LIMIT ?",
        )
        .bind(agent_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().filter_map(|r| decode_body(r, "decision")).collect())
    }

    // -- pheromones -------------------------------------------------------

    /// Upsert one signal.
    pub async fn save_signal(&self, signal: &Signal) -> Result<(), StoreError> {
        let body = serde_json::to_string(signal)?;
        sqlx::query(
            "INSERT INTO pheromones (id, producer_id, body, timestamp) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body",
        )
        .bind(signal.id.to_string())
        .bind(signal.producer_id.as_str())
        .bind(body)
        .bind(signal.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All persisted signals, oldest first.
    pub async fn load_signals(&self) -> Result<Vec<Signal>, StoreError> {
        let rows = sqlx::query("SELECT body FROM pheromones ORDER BY timestamp ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().filter_map(|r| decode_body(r, "signal")).collect())
    }

    // -- collective memories ----------------------------------------------

    /// Upsert one collective memory.
    pub async fn save_memory(&self, memory: &CollectiveMemory) -> Result<(), StoreError> {
        let body = serde_json::to_string(memory)?;
        sqlx::query(
            "INSERT INTO collective_memories (id, topic, body, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body",
        )
        .bind(memory.id.to_string())
        .bind(&memory.topic)
        .bind(body)
        .bind(memory.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All collective memories, newest first.
    pub async fn load_memories(&self) -> Result<Vec<CollectiveMemory>, StoreError> {
        let rows = sqlx::query(
            "SELECT body FROM collective_memories ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().filter_map(|r| decode_body(r, "memory")).collect())
    }
}

/// Decode a JSON `body` column, logging and skipping rows that no longer
/// parse (schema drift survives restarts; it does not take the process
/// down).
fn decode_body<T: serde::de::DeserializeOwned>(
    row: &sqlx::sqlite::SqliteRow,
    what: &str,
) -> Option<T> {
    let body: String = row.try_get("body").ok()?;
    match serde_json::from_str(&body) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(what, error = %e, "skipping undecodable row");
            None
        }
    }
}
