//! Vector store abstraction.
//!
//! The [`VectorStore`] trait defines the storage operations the pipeline
//! needs, enabling pluggable backends. The store exclusively owns the
//! persisted email content; the search path only reads it.
//!
//! Implementations must be `Send + Sync` and must tolerate concurrent
//! readers and concurrent upserts without corrupting the index.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

/// Per-email metadata stored alongside the indexed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMeta {
    pub subject: String,
    pub date: String,
    pub sender: String,
}

/// An email prepared for indexing: normalized body plus metadata, keyed
/// by the provider-assigned id.
#[derive(Debug, Clone)]
pub struct EmailRecord {
    pub id: String,
    pub body: String,
    pub meta: EmailMeta,
}

/// A single nearest-neighbor match returned from [`VectorStore::query`].
///
/// `distance` is cosine distance (`1 − similarity`); matches are returned
/// in ascending distance order, most similar first.
#[derive(Debug, Clone)]
pub struct EmailMatch {
    pub document: String,
    pub meta: EmailMeta,
    pub distance: f64,
}

/// Abstract vector index over email bodies.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_batch`](VectorStore::upsert_batch) | Insert or overwrite a batch of emails, all-or-nothing |
/// | [`query`](VectorStore::query) | Nearest-neighbor search by cosine distance |
/// | [`count`](VectorStore::count) | Number of indexed emails |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite `records` with their embedding `vectors`
    /// (parallel slices, one vector per record).
    ///
    /// The whole batch lands or none of it does: backends either wrap the
    /// writes in a single transaction or validate everything before the
    /// first mutation.
    async fn upsert_batch(&self, records: &[EmailRecord], vectors: &[Vec<f32>]) -> Result<()>;

    /// Return up to `top_k` stored emails ranked by ascending cosine
    /// distance to `query_vec`. Ties break on id for determinism.
    async fn query(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<EmailMatch>>;

    /// Number of emails currently indexed.
    async fn count(&self) -> Result<usize>;
}
