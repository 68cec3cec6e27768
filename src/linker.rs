//! Auto-linking of semantically similar memories
//!
//! When a new memory is recorded, its embedding is compared against every
//! stored embedded memory; pairs scoring at or above the threshold get a
//! relates-to link. The trigger is one-directional: re-embedding an old
//! memory never creates links retroactively.

use crate::error::Result;
use crate::similarity::find_similar;
use crate::store::MemoryStore;
use crate::types::{Memory, MemoryId, MemoryLink};

/// Linking policy
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Minimum similarity score for a link
    pub threshold: f32,
    /// Cap on links persisted per new memory
    pub max_links: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            max_links: 10,
        }
    }
}

/// A potential link target with its similarity score
#[derive(Debug, Clone)]
pub struct LinkCandidate {
    pub memory_id: MemoryId,
    pub similarity: f32,
}

/// Find link targets for `memory` among `existing`, sorted descending.
///
/// Skips the memory itself, superseded records, and anything without an
/// embedding. Empty when `memory` has no embedding yet.
pub fn link_candidates(memory: &Memory, existing: &[Memory], threshold: f32) -> Vec<LinkCandidate> {
    let Some(source) = memory.embedding.as_deref() else {
        return Vec::new();
    };

    let candidates = existing
        .iter()
        .filter(|m| m.id != memory.id && !m.is_superseded())
        .map(|m| (m.id.clone(), m.embedding.clone()));

    find_similar(source, candidates, usize::MAX, threshold)
        .into_iter()
        .map(|r| LinkCandidate {
            memory_id: r.item,
            similarity: r.score,
        })
        .collect()
}

/// Persist relates-to links from a new memory to every qualifying target.
///
/// Links go through the store's upsert keyed by (source, target), so
/// re-running against an unchanged store leaves the link set unchanged.
/// Returns (target id, score) pairs sorted descending by score.
pub async fn auto_link(
    store: &MemoryStore,
    memory: &Memory,
    existing: &[Memory],
    threshold: f32,
) -> Result<Vec<(MemoryId, f32)>> {
    let candidates = link_candidates(memory, existing, threshold);
    persist_links(store, &memory.id, &candidates).await?;

    Ok(candidates
        .into_iter()
        .map(|c| (c.memory_id, c.similarity))
        .collect())
}

pub(crate) async fn persist_links(
    store: &MemoryStore,
    source_id: &str,
    candidates: &[LinkCandidate],
) -> Result<()> {
    for candidate in candidates {
        let link = MemoryLink::relates_to(source_id, &candidate.memory_id, candidate.similarity);
        store.upsert_link(&link).await?;
    }

    if !candidates.is_empty() {
        tracing::debug!("Linked {} to {} related memories", source_id, candidates.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Memory;

    fn embedded(content: &str, embedding: Vec<f32>) -> Memory {
        Memory::new(content, "learnings").with_embedding(embedding)
    }

    #[test]
    fn candidates_respect_threshold() {
        let new = embedded("new", vec![1.0, 0.0]);
        let near = embedded("near", vec![0.6, 0.8]); // cosine 0.6
        let far = embedded("far", vec![0.0, 1.0]); // cosine 0.0
        let existing = vec![near.clone(), far];

        let candidates = link_candidates(&new, &existing, 0.5);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].memory_id, near.id);
        assert!((candidates[0].similarity - 0.6).abs() < 1e-5);
    }

    #[test]
    fn never_links_to_itself() {
        let new = embedded("new", vec![1.0, 0.0]);
        let existing = vec![new.clone()];

        assert!(link_candidates(&new, &existing, 0.0).is_empty());
    }

    #[test]
    fn skips_candidates_without_embeddings() {
        let new = embedded("new", vec![1.0, 0.0]);
        let bare = Memory::new("bare", "learnings");
        let existing = vec![bare];

        assert!(link_candidates(&new, &existing, 0.0).is_empty());
    }

    #[test]
    fn skips_superseded_candidates() {
        let new = embedded("new", vec![1.0, 0.0]);
        let mut old = embedded("old", vec![1.0, 0.0]);
        old.superseded_by = Some("newer".into());
        let existing = vec![old];

        assert!(link_candidates(&new, &existing, 0.0).is_empty());
    }

    #[test]
    fn unembedded_source_yields_no_candidates() {
        let new = Memory::new("new", "learnings");
        let existing = vec![embedded("other", vec![1.0, 0.0])];

        assert!(link_candidates(&new, &existing, 0.0).is_empty());
    }

    #[test]
    fn candidates_sorted_descending() {
        let new = embedded("new", vec![1.0, 0.0]);
        let mid = embedded("mid", vec![0.6, 0.8]);
        let close = embedded("close", vec![1.0, 0.0]);
        let existing = vec![mid.clone(), close.clone()];

        let candidates = link_candidates(&new, &existing, 0.0);
        assert_eq!(candidates[0].memory_id, close.id);
        assert_eq!(candidates[1].memory_id, mid.id);
    }

    #[tokio::test]
    async fn auto_link_persists_and_is_idempotent() {
        let store = MemoryStore::connect_in_memory().await;

        let new = embedded("new memory", vec![1.0, 0.0]);
        let near = embedded("near memory", vec![0.6, 0.8]);
        let far = embedded("far memory", vec![0.0, 1.0]);

        store.save(&new).await.unwrap();
        store.save(&near).await.unwrap();
        store.save(&far).await.unwrap();

        let existing = vec![near.clone(), far.clone()];
        let links = auto_link(&store, &new, &existing, 0.5).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, near.id);

        // Re-running against the unchanged store changes nothing.
        let again = auto_link(&store, &new, &existing, 0.5).await.unwrap();
        assert_eq!(again, links);

        let stored = store.get_links(&new.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].target_id, near.id);
    }
}
