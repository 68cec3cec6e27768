//! # Remora - Conversational Recall Core for AI Agents

pub mod cues;
pub mod embedding;
pub mod error;
pub mod linker;
pub mod recall;
pub mod similarity;
pub mod store;
pub mod types;

pub use cues::{
    detect_all_social_cues, detect_social_cue, extract_recall_query, normalize_topic,
    requires_recall, CueKind, SocialCue,
};
pub use embedding::{EmbeddingProvider, HashEmbeddingProvider, DEFAULT_DIMENSION};
pub use error::{MemoryError, Result};
pub use linker::{auto_link, link_candidates, LinkCandidate, LinkConfig};
pub use recall::RecallResult;
pub use similarity::{cosine_similarity, find_similar, SimilarityResult};
pub use store::MemoryStore;
pub use types::{ImpactLevel, LinkType, Memory, MemoryId, MemoryLink};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

/// Main entry point: a store wired to an embedding provider.
///
/// New memories are embedded and auto-linked on write; inbound messages
/// can be answered from stored context via cue-gated recall.
#[derive(Clone)]
pub struct MemorySystem {
    store: Arc<MemoryStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    link_config: LinkConfig,
}

impl std::fmt::Debug for MemorySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySystem")
            .field("embedder", &self.embedder.name())
            .field("link_config", &self.link_config)
            .finish()
    }
}

impl MemorySystem {
    /// Create a new memory system backed by SQLite in `data_dir`
    pub async fn new(
        data_dir: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let options = SqliteConnectOptions::new()
            .filename(data_dir.join("memories.db"))
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| MemoryError::Database(e.into()))?;

        Ok(Self {
            store: MemoryStore::new(pool),
            embedder,
            link_config: LinkConfig::default(),
        })
    }

    /// Override the linking policy
    pub fn with_link_config(mut self, link_config: LinkConfig) -> Self {
        self.link_config = link_config;
        self
    }

    /// Record a new memory: persist it, embed its content, and link it to
    /// related memories already in the store.
    ///
    /// Returns the memory with its embedding attached. Links are capped at
    /// `LinkConfig::max_links`, strongest first.
    pub async fn remember(&self, mut memory: Memory) -> Result<Memory> {
        self.store.save(&memory).await?;

        let vector = self.embedder.embed_one(&memory.content).await?;
        self.store.set_embedding(&memory.id, &vector).await?;
        memory.embedding = Some(vector);

        let existing = self.store.get_with_embeddings().await?;
        let mut candidates =
            linker::link_candidates(&memory, &existing, self.link_config.threshold);
        candidates.truncate(self.link_config.max_links);
        linker::persist_links(&self.store, &memory.id, &candidates).await?;

        if !candidates.is_empty() {
            tracing::info!(
                "Recorded memory {} with {} links",
                memory.id,
                candidates.len()
            );
        }

        Ok(memory)
    }

    /// Semantic recall over all stored, embedded memories
    pub async fn recall(&self, query: &str, top_k: usize) -> Result<Vec<RecallResult>> {
        let memories = self.store.get_with_embeddings().await?;
        recall::search(self.embedder.as_ref(), query, &memories, top_k).await
    }

    /// Cue-gated recall for an inbound message.
    ///
    /// `None` means the message does not reference shared context, or the
    /// detected cue carried no usable topic.
    pub async fn recall_for_message(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Option<Vec<RecallResult>>> {
        let memories = self.store.get_with_embeddings().await?;
        recall::recall_for_message(self.embedder.as_ref(), text, &memories, top_k).await
    }

    /// Batch-embed stored memories that are still missing an embedding.
    ///
    /// Backfill only: attaching an embedding to an old memory never
    /// creates links. Returns the number of memories embedded.
    pub async fn embed_pending(&self) -> Result<usize> {
        let pending = self.store.get_missing_embeddings().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = pending.iter().map(|m| m.content.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(MemoryError::EmbeddingFailed(format!(
                "provider returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        for (memory, vector) in pending.iter().zip(&vectors) {
            self.store.set_embedding(&memory.id, vector).await?;
        }

        tracing::info!("Embedded {} pending memories", pending.len());
        Ok(pending.len())
    }

    /// Mark `old_id` as superseded by `new_id`
    pub async fn supersede(&self, old_id: &str, new_id: &str) -> Result<bool> {
        self.store.supersede(old_id, new_id).await
    }

    /// All links touching a memory, strongest first
    pub async fn links_for(&self, memory_id: &str) -> Result<Vec<MemoryLink>> {
        self.store.get_links(memory_id).await
    }

    /// Warm the embedding provider ahead of the first real call
    pub async fn warm(&self) -> Result<()> {
        self.embedder.warm().await
    }

    /// Get the underlying store
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn system(dir: &Path) -> MemorySystem {
        MemorySystem::new(dir, Arc::new(HashEmbeddingProvider::default()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn remember_attaches_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let memories = system(dir.path()).await;

        let memory = memories
            .remember(Memory::new("Rust ownership rules", "learnings"))
            .await
            .unwrap();

        assert!(memory.has_embedding());
        let stored = memories.store().load(&memory.id).await.unwrap().unwrap();
        assert!(stored.has_embedding());
    }

    #[tokio::test]
    async fn remember_links_similar_memories() {
        let dir = tempfile::tempdir().unwrap();
        let memories = system(dir.path()).await;

        let first = memories
            .remember(Memory::new("caching layer uses redis", "architectural"))
            .await
            .unwrap();
        let second = memories
            .remember(Memory::new("caching layer uses redis", "architectural"))
            .await
            .unwrap();

        let links = memories.links_for(&second.id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target_id, first.id);
        assert!((links[0].similarity - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn dissimilar_memories_stay_unlinked() {
        let dir = tempfile::tempdir().unwrap();
        let memories = system(dir.path()).await;

        memories
            .remember(Memory::new("caching layer uses redis", "architectural"))
            .await
            .unwrap();
        let other = memories
            .remember(Memory::new("sunset walks feel calming", "emotional"))
            .await
            .unwrap();

        let links = memories.links_for(&other.id).await.unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn message_cue_recalls_stored_memory() {
        let dir = tempfile::tempdir().unwrap();
        let memories = system(dir.path()).await;

        let stored = memories
            .remember(Memory::new("caching strategy for hot paths", "architectural"))
            .await
            .unwrap();

        let results = memories
            .recall_for_message("We discussed caching.", 5)
            .await
            .unwrap()
            .expect("cue should trigger recall");

        assert!(results.iter().any(|r| r.memory.id == stored.id));
    }

    #[tokio::test]
    async fn plain_message_recalls_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let memories = system(dir.path()).await;

        memories
            .remember(Memory::new("caching strategy for hot paths", "architectural"))
            .await
            .unwrap();

        let results = memories
            .recall_for_message("What is a decorator?", 5)
            .await
            .unwrap();
        assert!(results.is_none());
    }

    #[tokio::test]
    async fn embed_pending_backfills_without_linking() {
        let dir = tempfile::tempdir().unwrap();
        let memories = system(dir.path()).await;

        // Written behind the system's back, so no embedding yet.
        let raw = Memory::new("raw imported note", "learnings");
        memories.store().save(&raw).await.unwrap();

        let embedded = memories.embed_pending().await.unwrap();
        assert_eq!(embedded, 1);

        let loaded = memories.store().load(&raw.id).await.unwrap().unwrap();
        assert!(loaded.has_embedding());
        assert!(memories.links_for(&raw.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recall_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let memories = system(dir.path()).await;

        let close = memories
            .remember(Memory::new("database migration plan", "architectural"))
            .await
            .unwrap();

        let results = memories.recall("database migration plan", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, close.id);
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }
}
