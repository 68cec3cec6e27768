//! Memory persistence over SQLite

use crate::error::{MemoryError, Result};
use crate::types::{ImpactLevel, LinkType, Memory, MemoryLink};

use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Store for memories and the link graph between them
#[derive(Clone)]
pub struct MemoryStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl MemoryStore {
    /// Create a new store with the given SQLite pool
    pub fn new(pool: SqlitePool) -> Arc<Self> {
        Arc::new(Self { pool })
    }

    /// Get a reference to the SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Save a new memory
    pub async fn save(&self, memory: &Memory) -> Result<()> {
        let embedding_blob = encode_embedding(memory.embedding.as_deref())?;
        let metadata_json = memory
            .metadata
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok());

        sqlx::query(
            r#"
            INSERT INTO memories (id, content, kind, impact, embedding, created_at, updated_at, superseded_by, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&memory.id)
        .bind(&memory.content)
        .bind(&memory.kind)
        .bind(memory.impact.to_string())
        .bind(embedding_blob)
        .bind(memory.created_at)
        .bind(memory.updated_at)
        .bind(memory.superseded_by.as_ref())
        .bind(metadata_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load a memory by ID
    pub async fn load(&self, id: &str) -> Result<Option<Memory>> {
        let row = sqlx::query(
            r#"
            SELECT id, content, kind, impact, embedding, created_at, updated_at, superseded_by, metadata
            FROM memories
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row_to_memory(&row)))
    }

    /// Update an existing memory
    pub async fn update(&self, memory: &Memory) -> Result<()> {
        let embedding_blob = encode_embedding(memory.embedding.as_deref())?;
        let metadata_json = memory
            .metadata
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok());

        sqlx::query(
            r#"
            UPDATE memories
            SET content = ?, kind = ?, impact = ?, embedding = ?, updated_at = ?, superseded_by = ?, metadata = ?
            WHERE id = ?
            "#,
        )
        .bind(&memory.content)
        .bind(&memory.kind)
        .bind(memory.impact.to_string())
        .bind(embedding_blob)
        .bind(chrono::Utc::now())
        .bind(memory.superseded_by.as_ref())
        .bind(metadata_json)
        .bind(&memory.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Attach an embedding to a stored memory.
    ///
    /// Write-once per record in the intended usage; calling again simply
    /// overwrites the column.
    pub async fn set_embedding(&self, id: &str, embedding: &[f32]) -> Result<()> {
        let blob =
            bincode::serialize(embedding).map_err(|e| MemoryError::Serialization(e.to_string()))?;

        sqlx::query("UPDATE memories SET embedding = ?, updated_at = ? WHERE id = ?")
            .bind(blob)
            .bind(chrono::Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Mark a memory as superseded by another
    pub async fn supersede(&self, id: &str, by: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE memories SET superseded_by = ?, updated_at = ? WHERE id = ? AND superseded_by IS NULL",
        )
        .bind(by)
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All memories not superseded, oldest first
    pub async fn get_all(&self) -> Result<Vec<Memory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, kind, impact, embedding, created_at, updated_at, superseded_by, metadata
            FROM memories
            WHERE superseded_by IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_memory).collect())
    }

    /// Memories that already carry an embedding, oldest first.
    ///
    /// These are the candidates for recall scoring and auto-linking.
    pub async fn get_with_embeddings(&self) -> Result<Vec<Memory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, kind, impact, embedding, created_at, updated_at, superseded_by, metadata
            FROM memories
            WHERE superseded_by IS NULL AND embedding IS NOT NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_memory).collect())
    }

    /// Memories still waiting for an embedding, oldest first
    pub async fn get_missing_embeddings(&self) -> Result<Vec<Memory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, kind, impact, embedding, created_at, updated_at, superseded_by, metadata
            FROM memories
            WHERE superseded_by IS NULL AND embedding IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_memory).collect())
    }

    /// Upsert a link keyed by (source_id, target_id)
    pub async fn upsert_link(&self, link: &MemoryLink) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO memory_links (source_id, target_id, link_type, similarity, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(source_id, target_id) DO UPDATE SET
                link_type = excluded.link_type,
                similarity = excluded.similarity
            "#,
        )
        .bind(&link.source_id)
        .bind(&link.target_id)
        .bind(link.link_type.to_string())
        .bind(link.similarity)
        .bind(link.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All links touching a memory, strongest first
    pub async fn get_links(&self, memory_id: &str) -> Result<Vec<MemoryLink>> {
        let rows = sqlx::query(
            r#"
            SELECT source_id, target_id, link_type, similarity, created_at
            FROM memory_links
            WHERE source_id = ? OR target_id = ?
            ORDER BY similarity DESC
            "#,
        )
        .bind(memory_id)
        .bind(memory_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_link).collect())
    }

    /// Delete a memory permanently
    pub async fn delete(&self, id: &str) -> Result<()> {
        // First delete links
        sqlx::query("DELETE FROM memory_links WHERE source_id = ? OR target_id = ?")
            .bind(id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        // Then delete the memory
        sqlx::query("DELETE FROM memories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create an in-memory store for testing
    pub async fn connect_in_memory() -> Arc<Self> {
        use sqlx::sqlite::SqliteConnectOptions;

        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .create_if_missing(true);

        let pool = sqlx::pool::PoolOptions::<sqlx::Sqlite>::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("in-memory SQLite");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");

        Arc::new(Self { pool })
    }
}

fn encode_embedding(embedding: Option<&[f32]>) -> Result<Option<Vec<u8>>> {
    embedding
        .map(bincode::serialize)
        .transpose()
        .map_err(|e| MemoryError::Serialization(e.to_string()))
}

/// Helper: Convert database row to Memory
fn row_to_memory(row: &sqlx::sqlite::SqliteRow) -> Memory {
    let impact_str: String = row.try_get("impact").unwrap_or_default();

    let embedding_blob: Option<Vec<u8>> = row.try_get("embedding").unwrap_or(None);
    let embedding = embedding_blob.and_then(|blob| bincode::deserialize(&blob).ok());

    let metadata_json: Option<String> = row.try_get("metadata").unwrap_or(None);
    let metadata = metadata_json.and_then(|s| serde_json::from_str(&s).ok());

    Memory {
        id: row.try_get("id").unwrap_or_default(),
        content: row.try_get("content").unwrap_or_default(),
        kind: row.try_get("kind").unwrap_or_default(),
        impact: parse_impact(&impact_str),
        embedding,
        created_at: row.try_get("created_at").unwrap_or_else(|_| chrono::Utc::now()),
        updated_at: row.try_get("updated_at").unwrap_or_else(|_| chrono::Utc::now()),
        superseded_by: row.try_get("superseded_by").unwrap_or(None),
        metadata,
    }
}

/// Helper: Convert database row to MemoryLink
fn row_to_link(row: &sqlx::sqlite::SqliteRow) -> MemoryLink {
    let link_type_str: String = row.try_get("link_type").unwrap_or_default();

    MemoryLink {
        source_id: row.try_get("source_id").unwrap_or_default(),
        target_id: row.try_get("target_id").unwrap_or_default(),
        link_type: parse_link_type(&link_type_str),
        similarity: row.try_get("similarity").unwrap_or(0.0),
        created_at: row.try_get("created_at").unwrap_or_else(|_| chrono::Utc::now()),
    }
}

/// Helper: Parse impact level from string
fn parse_impact(s: &str) -> ImpactLevel {
    match s {
        "low" => ImpactLevel::Low,
        "medium" => ImpactLevel::Medium,
        "high" => ImpactLevel::High,
        "critical" => ImpactLevel::Critical,
        _ => ImpactLevel::Medium,
    }
}

/// Helper: Parse link type from string
fn parse_link_type(s: &str) -> LinkType {
    match s {
        "relates_to" => LinkType::RelatesTo,
        "builds_on" => LinkType::BuildsOn,
        "contradicts" => LinkType::Contradicts,
        "supersedes" => LinkType::Supersedes,
        _ => LinkType::RelatesTo,
    }
}
