//! In-memory [`VectorIndex`] implementation.
//!
//! Brute-force cosine similarity over a `Vec` behind `std::sync::RwLock`.
//! Used by tests and by deployments that re-ingest on every start.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{IndexEntry, ScoredMatch};

use super::VectorIndex;

/// Non-persistent index for testing and single-process use.
pub struct MemoryIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
        let mut stored = self.entries.write().unwrap();
        stored.clear();
        stored.extend_from_slice(entries);
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let stored = self.entries.read().unwrap();

        let mut matches: Vec<ScoredMatch> = stored
            .iter()
            .map(|entry| ScoredMatch {
                text: entry.text.clone(),
                page_index: entry.page_index,
                score: cosine_similarity(vector, &entry.vector),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().unwrap().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, text: &str, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            page_index: 0,
            chunk_index: 0,
            text: text.to_string(),
            hash: String::new(),
            vector,
        }
    }

    #[tokio::test]
    async fn query_returns_best_first() {
        let index = MemoryIndex::new();
        index
            .upsert(&[
                entry("a", "far", vec![0.0, 1.0]),
                entry("b", "near", vec![1.0, 0.0]),
                entry("c", "middle", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let matches = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].text, "near");
        assert_eq!(matches[1].text, "middle");
        assert!(matches[0].score >= matches[1].score);
    }

    #[tokio::test]
    async fn query_empty_index_returns_nothing() {
        let index = MemoryIndex::new();
        let matches = index.query(&[1.0, 0.0], 4).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_previous_run() {
        let index = MemoryIndex::new();
        index
            .upsert(&[entry("a", "old", vec![1.0, 0.0])])
            .await
            .unwrap();
        index
            .upsert(&[entry("b", "new", vec![1.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let matches = index.query(&[1.0, 0.0], 4).await.unwrap();
        assert_eq!(matches[0].text, "new");
    }
}
