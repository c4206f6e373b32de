//! Core data types that flow through the ingestion and query pipelines.

/// A single page of extracted document text, in document order.
///
/// Produced by the reader, consumed by the chunker, never persisted.
#[derive(Debug, Clone)]
pub struct Page {
    pub page_index: i64,
    pub text: String,
}

/// A bounded unit of source text, the retrieval granularity.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    /// Page the chunk was cut from.
    pub page_index: i64,
    /// Position within the flattened chunk sequence, contiguous from 0.
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of the chunk text.
    pub hash: String,
}

/// A chunk paired with its embedding vector, as stored in the index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub page_index: i64,
    pub chunk_index: i64,
    pub text: String,
    pub hash: String,
    pub vector: Vec<f32>,
}

/// A retrieval hit returned from [`VectorIndex::query`](crate::index::VectorIndex::query),
/// best match first.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub text: String,
    pub page_index: i64,
    /// Cosine similarity against the query vector.
    pub score: f32,
}
