//! Semantic recall over stored memories

use crate::cues;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::similarity::find_similar;
use crate::types::Memory;

/// A memory scored against a recall query
#[derive(Debug, Clone)]
pub struct RecallResult {
    pub memory: Memory,
    pub score: f32,
}

/// Rank `memories` against `query`, best first.
///
/// Memories without an embedding are skipped, not errors. At most `top_k`
/// results come back; tied scores keep the caller's memory order.
pub async fn search(
    embedder: &dyn EmbeddingProvider,
    query: &str,
    memories: &[Memory],
    top_k: usize,
) -> Result<Vec<RecallResult>> {
    let query_embedding = embedder.embed_one(query).await?;

    let ranked = find_similar(
        &query_embedding,
        memories.iter().map(|m| (m.clone(), m.embedding.clone())),
        top_k,
        f32::NEG_INFINITY,
    );

    Ok(ranked
        .into_iter()
        .map(|r| RecallResult {
            memory: r.item,
            score: r.score,
        })
        .collect())
}

/// Cue-gated recall for an inbound message.
///
/// Runs the cheap pre-filter, detects a social cue, builds its query, and
/// searches. `None` means the message does not reference shared context
/// or the cue carried no usable topic — a legitimate outcome, not an
/// error.
pub async fn recall_for_message(
    embedder: &dyn EmbeddingProvider,
    text: &str,
    memories: &[Memory],
    top_k: usize,
) -> Result<Option<Vec<RecallResult>>> {
    if !cues::requires_recall(text) {
        return Ok(None);
    }

    let Some(cue) = cues::detect_social_cue(text) else {
        return Ok(None);
    };
    let Some(query) = cues::extract_recall_query(&cue) else {
        return Ok(None);
    };

    tracing::debug!("Recall triggered by {} cue: {}", cue.kind, query);

    let results = search(embedder, &query, memories, top_k).await?;
    Ok(Some(results))
}
