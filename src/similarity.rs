//! Cosine similarity and top-k ranking helpers

/// Scored item from a similarity ranking
#[derive(Debug, Clone)]
pub struct SimilarityResult<T> {
    pub item: T,
    pub score: f32,
}

/// Cosine similarity between two equal-length vectors.
///
/// Returns exactly 0.0 when either vector has zero magnitude. Panics on
/// length mismatch; dimension agreement is the caller's contract.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(
        a.len(),
        b.len(),
        "vector dimensions don't match: {} vs {}",
        a.len(),
        b.len()
    );

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Rank candidates against a query embedding.
///
/// Candidates without an embedding are skipped. Results at or above
/// `threshold` come back sorted descending, at most `top_k` of them. The
/// sort is stable, so tied scores keep candidate order.
pub fn find_similar<T>(
    query: &[f32],
    candidates: impl IntoIterator<Item = (T, Option<Vec<f32>>)>,
    top_k: usize,
    threshold: f32,
) -> Vec<SimilarityResult<T>> {
    let mut results: Vec<SimilarityResult<T>> = candidates
        .into_iter()
        .filter_map(|(item, embedding)| {
            let embedding = embedding?;
            let score = cosine_similarity(query, &embedding);
            (score >= threshold).then(|| SimilarityResult { item, score })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_exactly_zero() {
        let a = vec![1.0, 2.0, 3.0];
        let zero = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = vec![0.1, 0.9, 0.2];
        let b = vec![0.7, 0.3, 0.5];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    #[should_panic(expected = "dimensions don't match")]
    fn mismatched_lengths_panic() {
        cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn find_similar_filters_and_sorts() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            ("far", Some(vec![0.0, 1.0])),
            ("near", Some(vec![1.0, 0.0])),
            ("mid", Some(vec![0.6, 0.8])),
        ];

        let results = find_similar(&query, candidates, 10, 0.5);
        let names: Vec<&str> = results.iter().map(|r| r.item).collect();
        assert_eq!(names, vec!["near", "mid"]);
    }

    #[test]
    fn find_similar_skips_missing_embeddings() {
        let query = vec![1.0, 0.0];
        let candidates = vec![("a", Some(vec![1.0, 0.0])), ("b", None)];

        let results = find_similar(&query, candidates, 10, f32::NEG_INFINITY);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item, "a");
    }

    #[test]
    fn find_similar_respects_top_k() {
        let query = vec![1.0, 0.0];
        let candidates = (0..5).map(|i| (i, Some(vec![1.0, 0.0])));

        let results = find_similar(&query, candidates, 2, f32::NEG_INFINITY);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn ties_keep_candidate_order() {
        let query = vec![1.0, 0.0];
        let candidates = vec![
            ("first", Some(vec![1.0, 0.0])),
            ("second", Some(vec![1.0, 0.0])),
        ];

        let results = find_similar(&query, candidates, 10, f32::NEG_INFINITY);
        let names: Vec<&str> = results.iter().map(|r| r.item).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
