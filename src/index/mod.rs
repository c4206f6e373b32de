//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait defines the two operations the pipelines
//! need: a batched upsert at ingestion time and a top-K nearest-vector
//! lookup at query time. Backends:
//!
//! - [`memory::MemoryIndex`] — brute-force cosine over an in-process `Vec`,
//!   used in tests and for throwaway deployments.
//! - [`sqlite::SqliteIndex`] — persistent SQLite store with vectors kept
//!   as little-endian f32 BLOBs.
//!
//! Implementations must be `Send + Sync`; the serving path queries the
//! index concurrently from multiple in-flight requests.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::IndexConfig;
use crate::models::{IndexEntry, ScoredMatch};

/// Abstract similarity index over (chunk text, embedding vector) pairs.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Replace the index contents with the given entries, atomically per
    /// backend. Called once per ingestion run; entries are never mutated
    /// afterwards.
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<()>;

    /// Return up to `top_k` entries nearest to `vector`, best match first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>>;

    /// Number of entries currently stored.
    async fn count(&self) -> Result<usize>;
}

/// Open the index backend named by the configuration.
pub async fn open_index(config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(memory::MemoryIndex::new())),
        "sqlite" => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("index.path required for sqlite backend"))?;
            Ok(Arc::new(sqlite::SqliteIndex::open(path).await?))
        }
        other => anyhow::bail!("Unknown index backend: {}", other),
    }
}
