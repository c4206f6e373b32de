//! Ingestion pipeline orchestration.
//!
//! Coordinates the one-shot offline flow: read → chunk → embed → upsert.
//! There is no retry or partial-success handling; the run is a batch job
//! off the serving path, and any failure aborts it before the single
//! index upsert, so a failed run commits nothing. Re-running after a fix
//! replaces the previous index contents.

use anyhow::{Context, Result};

use crate::chunk::chunk_pages;
use crate::config::Config;
use crate::embedding::{create_embedder, Embedder};
use crate::index::{open_index, VectorIndex};
use crate::models::{Chunk, IndexEntry};
use crate::reader::read_pages;

/// Run the full ingestion pipeline for the configured document.
///
/// With `dry_run`, prints page and chunk counts and stops before any
/// embedding or index write.
pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    let path = &config.document.path;
    let pages = read_pages(path).with_context(|| format!("reading {}", path.display()))?;
    let chunks = chunk_pages(&pages, config.chunking.max_tokens);

    println!("ingest {}", path.display());
    println!("  pages read: {}", pages.len());
    println!("  chunks: {}", chunks.len());

    if dry_run {
        println!("  (dry-run, nothing written)");
        return Ok(());
    }

    anyhow::ensure!(
        !chunks.is_empty(),
        "document produced no chunks; nothing to index"
    );

    let embedder = create_embedder(&config.embedding)?;
    let index = open_index(&config.index).await?;

    let written = embed_and_store(
        &chunks,
        embedder.as_ref(),
        index.as_ref(),
        config.embedding.batch_size,
    )
    .await?;

    println!("  entries written: {}", written);
    println!(
        "  embedding model: {} ({} dims)",
        embedder.model_name(),
        embedder.dims()
    );
    println!("ok");

    Ok(())
}

/// Embed all chunks in config-sized batches and write every (chunk,
/// vector) pair to the index in one upsert.
///
/// Vectors stay order-aligned with the chunk sequence; a batch failure
/// aborts before anything reaches the index.
pub async fn embed_and_store(
    chunks: &[Chunk],
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    batch_size: usize,
) -> Result<usize> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let batch_vectors = embedder
            .embed(batch)
            .await
            .context("embedding a chunk batch")?;
        vectors.extend(batch_vectors);
    }

    let entries: Vec<IndexEntry> = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexEntry {
            id: chunk.id.clone(),
            page_index: chunk.page_index,
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
            hash: chunk.hash.clone(),
            vector,
        })
        .collect();

    index
        .upsert(&entries)
        .await
        .context("writing entries to the vector index")?;

    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::MemoryIndex;
    use crate::models::Page;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: one-hot on the first byte of the text.
    struct ByteEmbedder {
        batches: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for ByteEmbedder {
        fn model_name(&self) -> &str {
            "byte-one-hot"
        }
        fn dims(&self) -> usize {
            256
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; 256];
                    v[t.as_bytes().first().copied().unwrap_or(0) as usize] = 1.0;
                    v
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn embed_and_store_batches_and_aligns() {
        let pages = vec![Page {
            page_index: 0,
            text: "alpha\n\nbravo\n\ncharlie\n\ndelta\n\necho".to_string(),
        }];
        let chunks = chunk_pages(&pages, 2);
        assert!(chunks.len() >= 5);

        let embedder = ByteEmbedder {
            batches: AtomicUsize::new(0),
        };
        let index = MemoryIndex::new();

        let written = embed_and_store(&chunks, &embedder, &index, 2).await.unwrap();
        assert_eq!(written, chunks.len());
        assert!(embedder.batches.load(Ordering::SeqCst) >= 3);
        assert_eq!(index.count().await.unwrap(), chunks.len());

        // Round trip: a stored chunk queried verbatim is its own best match.
        let query_vec = embedder.embed(&[chunks[1].text.clone()]).await.unwrap();
        let matches = index.query(&query_vec[0], 4).await.unwrap();
        assert_eq!(matches[0].text, chunks[1].text);
    }
}
