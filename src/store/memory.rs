//! In-memory [`VectorStore`] implementation for tests and ephemeral runs.
//!
//! A `HashMap` behind `std::sync::RwLock`; vector search is brute-force
//! cosine similarity over all stored vectors.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;

use super::{EmailMatch, EmailRecord, VectorStore};

struct StoredEmail {
    record: EmailRecord,
    vector: Vec<f32>,
}

/// In-memory store. Nothing survives process exit.
pub struct MemoryStore {
    emails: RwLock<HashMap<String, StoredEmail>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            emails: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert_batch(&self, records: &[EmailRecord], vectors: &[Vec<f32>]) -> Result<()> {
        if records.len() != vectors.len() {
            bail!(
                "record/vector count mismatch: {} records, {} vectors",
                records.len(),
                vectors.len()
            );
        }
        // Single write-lock section after validation keeps the batch
        // all-or-nothing.
        let mut emails = self.emails.write().unwrap();
        for (record, vector) in records.iter().zip(vectors.iter()) {
            emails.insert(
                record.id.clone(),
                StoredEmail {
                    record: record.clone(),
                    vector: vector.clone(),
                },
            );
        }
        Ok(())
    }

    async fn query(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<EmailMatch>> {
        let emails = self.emails.read().unwrap();

        let mut scored: Vec<(&StoredEmail, f64)> = emails
            .values()
            .map(|stored| {
                let sim = cosine_similarity(query_vec, &stored.vector) as f64;
                (stored, 1.0 - sim)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.record.id.cmp(&b.0.record.id))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(stored, distance)| EmailMatch {
                document: stored.record.body.clone(),
                meta: stored.record.meta.clone(),
                distance,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.emails.read().unwrap().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hashed_embedding;
    use crate::store::EmailMeta;

    fn record(id: &str, body: &str) -> EmailRecord {
        EmailRecord {
            id: id.to_string(),
            body: body.to_string(),
            meta: EmailMeta {
                subject: format!("subject-{}", id),
                date: "Mon, 1 Jan 2024 09:00:00 +0000".to_string(),
                sender: "someone@example.com".to_string(),
            },
        }
    }

    fn embed(text: &str) -> Vec<f32> {
        hashed_embedding(text, 256)
    }

    #[tokio::test]
    async fn test_upsert_and_count() {
        let store = MemoryStore::new();
        let records = vec![record("a", "alpha body"), record("b", "beta body")];
        let vectors: Vec<_> = records.iter().map(|r| embed(&r.body)).collect();
        store.upsert_batch(&records, &vectors).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_same_id_overwrites() {
        let store = MemoryStore::new();

        let first = vec![record("a", "the old body about invoices")];
        store
            .upsert_batch(&first, &[embed(&first[0].body)])
            .await
            .unwrap();

        let second = vec![record("a", "the new body about standups")];
        store
            .upsert_batch(&second, &[embed(&second[0].body)])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);

        let matches = store
            .query(&embed("standups"), 5)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].document.contains("new body"));
    }

    #[tokio::test]
    async fn test_query_orders_by_distance() {
        let store = MemoryStore::new();
        let records = vec![
            record("a", "standup meeting notes from the team standup"),
            record("b", "quarterly invoice for cloud spend"),
            record("c", "standup moved to nine thirty"),
        ];
        let vectors: Vec<_> = records.iter().map(|r| embed(&r.body)).collect();
        store.upsert_batch(&records, &vectors).await.unwrap();

        let matches = store.query(&embed("standup"), 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].distance <= matches[1].distance);
        assert!(matches[0].document.contains("standup"));
        assert!(matches[1].document.contains("standup"));
    }

    #[tokio::test]
    async fn test_query_empty_store() {
        let store = MemoryStore::new();
        let matches = store.query(&embed("anything"), 5).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_batch_rejected_before_write() {
        let store = MemoryStore::new();
        let records = vec![record("a", "body"), record("b", "body")];
        let vectors = vec![embed("body")];
        assert!(store.upsert_batch(&records, &vectors).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
