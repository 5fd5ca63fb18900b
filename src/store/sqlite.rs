//! SQLite-backed [`VectorStore`].
//!
//! One row per email; embeddings are stored as little-endian f32 BLOBs
//! and ranked by brute-force cosine similarity in Rust. WAL mode allows
//! concurrent readers alongside upserts.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};

use super::{EmailMatch, EmailMeta, EmailRecord, VectorStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS emails (
    id          TEXT PRIMARY KEY,
    subject     TEXT NOT NULL,
    date        TEXT NOT NULL,
    sender      TEXT NOT NULL,
    body        TEXT NOT NULL,
    embedding   BLOB NOT NULL,
    dims        INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
"#;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists. Idempotent.
    pub async fn connect(path: &Path) -> Result<Self> {
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

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn upsert_batch(&self, records: &[EmailRecord], vectors: &[Vec<f32>]) -> Result<()> {
        if records.len() != vectors.len() {
            anyhow::bail!(
                "record/vector count mismatch: {} records, {} vectors",
                records.len(),
                vectors.len()
            );
        }

        // One transaction for the whole batch: either every email lands
        // or the rollback leaves the index untouched.
        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now().timestamp();

        for (record, vector) in records.iter().zip(vectors.iter()) {
            sqlx::query(
                r#"
                INSERT INTO emails (id, subject, date, sender, body, embedding, dims, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    subject = excluded.subject,
                    date = excluded.date,
                    sender = excluded.sender,
                    body = excluded.body,
                    embedding = excluded.embedding,
                    dims = excluded.dims,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&record.id)
            .bind(&record.meta.subject)
            .bind(&record.meta.date)
            .bind(&record.meta.sender)
            .bind(&record.body)
            .bind(vec_to_blob(vector))
            .bind(vector.len() as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<EmailMatch>> {
        // Fetch all vectors and compute cosine similarity in Rust.
        let rows = sqlx::query("SELECT id, subject, date, sender, body, embedding FROM emails")
            .fetch_all(&self.pool)
            .await?;

        let mut scored: Vec<(String, EmailMatch)> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                let sim = cosine_similarity(query_vec, &vec) as f64;
                let id: String = row.get("id");
                (
                    id,
                    EmailMatch {
                        document: row.get("body"),
                        meta: EmailMeta {
                            subject: row.get("subject"),
                            date: row.get("date"),
                            sender: row.get("sender"),
                        },
                        distance: 1.0 - sim,
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.distance
                .partial_cmp(&b.1.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        Ok(scored.into_iter().map(|(_, m)| m).collect())
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emails")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }
}
