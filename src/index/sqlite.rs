//! SQLite-backed [`VectorIndex`] implementation.
//!
//! Entries live in a single `entries` table; vectors are stored as
//! little-endian f32 BLOBs and similarity is computed in Rust over the
//! fetched rows. At the scale of one indexed document this is faster than
//! maintaining an ANN structure and keeps the backend dependency-free.
//!
//! An ingestion run replaces the whole table inside one transaction, so a
//! failed run commits nothing and re-running ingestion is idempotent.

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{IndexEntry, ScoredMatch};

use super::VectorIndex;

/// Persistent index stored in a SQLite database file.
pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                page_index INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                hash TEXT NOT NULL,
                vector BLOB NOT NULL,
                dims INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entries").execute(&mut *tx).await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO entries (id, page_index, chunk_index, text, hash, vector, dims, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(entry.page_index)
            .bind(entry.chunk_index)
            .bind(&entry.text)
            .bind(&entry.hash)
            .bind(vec_to_blob(&entry.vector))
            .bind(entry.vector.len() as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let rows = sqlx::query("SELECT text, page_index, vector FROM entries")
            .fetch_all(&self.pool)
            .await?;

        let mut matches: Vec<ScoredMatch> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("vector");
                let entry_vec = blob_to_vec(&blob);
                ScoredMatch {
                    text: row.get("text"),
                    page_index: row.get("page_index"),
                    score: cosine_similarity(vector, &entry_vec),
                }
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
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
