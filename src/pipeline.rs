//! Ingestion and retrieval-and-summarization core.
//!
//! [`EmailIndex`] composes the vector store, the embedding provider, and
//! the LLM client. Both dependencies are injected at construction — no
//! ambient globals — so tests substitute fakes.
//!
//! The search path is a self-contained, blocking sequence: at most one
//! vector-store query and at most one LLM call per invocation. It either
//! returns a full [`SearchResponse`] or fails; there is no retry and no
//! partial success, and nothing in the store is mutated.

use std::sync::Arc;

use crate::config::EmbeddingConfig;
use crate::embedding::{embed_query, embed_texts};
use crate::error::{Error, Result};
use crate::llm::Completions;
use crate::models::{AddResult, EmailBatch, SearchResponse, SourceEmail};
use crate::normalize::normalize;
use crate::store::{EmailMatch, EmailMeta, EmailRecord, VectorStore};

/// Separator between emails in the LLM context block.
const CONTEXT_SEPARATOR: &str = "==================================================";

/// Summary returned when the index has nothing relevant; the LLM is not
/// called in that case.
const NO_MATCH_SUMMARY: &str = "No relevant emails found for this query.";

pub struct EmailIndex {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn Completions>,
    embedding: EmbeddingConfig,
}

impl EmailIndex {
    pub fn new(
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn Completions>,
        embedding: EmbeddingConfig,
    ) -> Self {
        Self {
            store,
            llm,
            embedding,
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Index a batch of emails: normalize each body, embed, and upsert
    /// keyed by the provider id. All-or-nothing — a malformed email is
    /// rejected before anything is written, and the store applies the
    /// batch in a single transaction.
    pub async fn add_emails(&self, batch: &EmailBatch) -> Result<AddResult> {
        if batch.emails.is_empty() {
            return Ok(AddResult::success(0));
        }

        // Pre-validation pass before any write.
        for (i, email) in batch.emails.iter().enumerate() {
            if email.id.trim().is_empty() {
                return Err(Error::invalid(format!(
                    "email at index {} has an empty id",
                    i
                )));
            }
        }

        let records: Vec<EmailRecord> = batch
            .emails
            .iter()
            .map(|email| EmailRecord {
                id: email.id.clone(),
                body: normalize(&email.body),
                meta: EmailMeta {
                    subject: email.subject.clone(),
                    date: email.date.clone(),
                    sender: email.sender.clone(),
                },
            })
            .collect();

        let texts: Vec<String> = records.iter().map(|r| r.body.clone()).collect();
        let vectors = embed_texts(&self.embedding, &texts)
            .await
            .map_err(Error::ingestion)?;

        self.store
            .upsert_batch(&records, &vectors)
            .await
            .map_err(Error::ingestion)?;

        tracing::debug!(count = records.len(), "indexed email batch");
        Ok(AddResult::success(records.len()))
    }

    /// Retrieve the `n_results` most similar emails and summarize them.
    ///
    /// Zero matches still produce a `SearchResponse` — `matches = 0`,
    /// empty `source_emails`, and a canned summary — without invoking
    /// the LLM.
    pub async fn search(&self, query: &str, n_results: usize) -> Result<SearchResponse> {
        if query.trim().is_empty() {
            return Err(Error::invalid("query must not be empty"));
        }
        if n_results < 1 {
            return Err(Error::invalid("n_results must be >= 1"));
        }

        let query_vec = embed_query(&self.embedding, query)
            .await
            .map_err(Error::retrieval)?;

        let matches = self
            .store
            .query(&query_vec, n_results)
            .await
            .map_err(Error::retrieval)?;

        if matches.is_empty() {
            return Ok(SearchResponse {
                summary: NO_MATCH_SUMMARY.to_string(),
                matches: 0,
                source_emails: Vec::new(),
            });
        }

        let context = format_context(&matches);
        let prompt = build_prompt(query, &context);
        let summary = self.llm.complete(&prompt).await.map_err(Error::retrieval)?;

        let source_emails: Vec<SourceEmail> = matches
            .iter()
            .map(|m| SourceEmail {
                subject: m.meta.subject.clone(),
                date: m.meta.date.clone(),
                sender: m.meta.sender.clone(),
            })
            .collect();

        Ok(SearchResponse {
            summary,
            matches: source_emails.len(),
            source_emails,
        })
    }
}

/// Format retrieved emails into a single context block, preserving the
/// similarity order.
fn format_context(matches: &[EmailMatch]) -> String {
    let parts: Vec<String> = matches
        .iter()
        .map(|m| {
            format!(
                "Email Subject: {}\nDate: {}\nSender: {}\nContent: {}\n{}",
                m.meta.subject, m.meta.date, m.meta.sender, m.document, CONTEXT_SEPARATOR
            )
        })
        .collect();
    parts.join("\n")
}

/// Fixed prompt template embedding the query and the context block.
fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "Based on the following query and email contents, provide a structured list \
         of relevant answers that match the query criteria. Extract and highlight \
         specific details like dates, locations, and other relevant information.\n\n\
         Query: {}\n\n\
         Email Contents:\n{}\n\n\
         Please provide:\n\
         1. A structured list of matching answers. Discard parts of email contents \
         that are not relevant to the query",
        query, context
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use crate::llm::Completions;
    use crate::models::Email;
    use crate::store::memory::MemoryStore;
    use anyhow::Result as AnyResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records prompts and returns a canned summary.
    struct FakeLlm {
        calls: AtomicUsize,
        last_prompt: Mutex<String>,
    }

    impl FakeLlm {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_prompt(&self) -> String {
            self.last_prompt.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Completions for FakeLlm {
        async fn complete(&self, prompt: &str) -> AnyResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            Ok("1. A structured answer".to_string())
        }
    }

    fn email(id: &str, subject: &str, body: &str) -> Email {
        Email {
            id: id.to_string(),
            sender: format!("{}@example.com", id),
            subject: subject.to_string(),
            date: "Mon, 1 Jan 2024 09:00:00 +0000".to_string(),
            body: body.to_string(),
        }
    }

    fn index_with(llm: Arc<FakeLlm>) -> EmailIndex {
        EmailIndex::new(
            Arc::new(MemoryStore::new()),
            llm,
            EmbeddingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_add_then_search_matches_both() {
        let llm = FakeLlm::new();
        let index = index_with(llm.clone());

        let batch = EmailBatch {
            emails: vec![
                email("m1", "Standup", "standup meeting moved to nine thirty"),
                email("m2", "Standup notes", "notes from the standup meeting"),
            ],
        };
        let result = index.add_emails(&batch).await.unwrap();
        assert_eq!(result.status, "success");
        assert_eq!(result.count, Some(2));

        let resp = index.search("standup meeting", 5).await.unwrap();
        assert_eq!(resp.matches, 2);
        assert_eq!(resp.matches, resp.source_emails.len());
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_relevant_emails_ranked_first() {
        let llm = FakeLlm::new();
        let index = index_with(llm.clone());

        let batch = EmailBatch {
            emails: vec![
                email("s1", "Standup today", "standup meeting at nine"),
                email("s2", "Standup moved", "the standup meeting moved rooms"),
                email("s3", "Re: standup", "skipping the standup meeting tomorrow"),
                email("x1", "Invoice", "your april invoice is attached"),
                email("x2", "Newsletter", "product updates and announcements"),
            ],
        };
        index.add_emails(&batch).await.unwrap();

        let resp = index.search("standup meeting", 3).await.unwrap();
        assert_eq!(resp.matches, 3);
        assert_eq!(resp.matches, resp.source_emails.len());
        for source in &resp.source_emails {
            assert!(
                source.subject.to_lowercase().contains("standup"),
                "unrelated email ranked into top 3: {:?}",
                source
            );
        }
    }

    #[tokio::test]
    async fn test_reindex_same_id_overwrites() {
        let llm = FakeLlm::new();
        let index = index_with(llm.clone());

        let first = EmailBatch {
            emails: vec![email("m1", "Plans", "dinner at the old place")],
        };
        index.add_emails(&first).await.unwrap();

        let second = EmailBatch {
            emails: vec![email("m1", "Plans", "dinner at the new place downtown")],
        };
        index.add_emails(&second).await.unwrap();

        assert_eq!(index.store().count().await.unwrap(), 1);

        let resp = index.search("dinner place", 5).await.unwrap();
        assert_eq!(resp.matches, 1);
        let prompt = llm.last_prompt();
        assert!(prompt.contains("new place downtown"));
        assert!(!prompt.contains("old place"));
    }

    #[tokio::test]
    async fn test_empty_store_skips_llm() {
        let llm = FakeLlm::new();
        let index = index_with(llm.clone());

        let resp = index.search("anything at all", 5).await.unwrap();
        assert_eq!(resp.matches, 0);
        assert!(resp.source_emails.is_empty());
        assert!(resp.summary.contains("No relevant emails"));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_success_zero() {
        let index = index_with(FakeLlm::new());
        let result = index.add_emails(&EmailBatch { emails: vec![] }).await.unwrap();
        assert_eq!(result.status, "success");
        assert_eq!(result.count, Some(0));
    }

    #[tokio::test]
    async fn test_rejects_empty_query_and_zero_n_results() {
        let index = index_with(FakeLlm::new());

        let err = index.search("   ", 5).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = index.search("standup", 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_batch_with_empty_id_writes_nothing() {
        let index = index_with(FakeLlm::new());

        let batch = EmailBatch {
            emails: vec![
                email("ok", "Fine", "a perfectly fine email"),
                email("", "Broken", "no id on this one"),
            ],
        };
        let err = index.add_emails(&batch).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(index.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bodies_are_normalized_before_indexing() {
        let llm = FakeLlm::new();
        let index = index_with(llm.clone());

        let batch = EmailBatch {
            emails: vec![email(
                "m1",
                "Tracking",
                "meeting notes http://track.example/abc123 attached",
            )],
        };
        index.add_emails(&batch).await.unwrap();

        let resp = index.search("meeting notes", 5).await.unwrap();
        assert_eq!(resp.matches, 1);
        assert!(!llm.last_prompt().contains("track.example"));
    }

    #[tokio::test]
    async fn test_prompt_contains_query_and_separator() {
        let llm = FakeLlm::new();
        let index = index_with(llm.clone());

        let batch = EmailBatch {
            emails: vec![email("m1", "Standup", "standup at nine")],
        };
        index.add_emails(&batch).await.unwrap();
        index.search("standup", 5).await.unwrap();

        let prompt = llm.last_prompt();
        assert!(prompt.contains("Query: standup"));
        assert!(prompt.contains("Email Subject: Standup"));
        assert!(prompt.contains(CONTEXT_SEPARATOR));
    }

    #[test]
    fn test_format_context_order_and_fields() {
        let matches = vec![
            EmailMatch {
                document: "first body".to_string(),
                meta: EmailMeta {
                    subject: "First".to_string(),
                    date: "d1".to_string(),
                    sender: "a@x".to_string(),
                },
                distance: 0.1,
            },
            EmailMatch {
                document: "second body".to_string(),
                meta: EmailMeta {
                    subject: "Second".to_string(),
                    date: "d2".to_string(),
                    sender: "b@x".to_string(),
                },
                distance: 0.2,
            },
        ];
        let context = format_context(&matches);
        let first_pos = context.find("First").unwrap();
        let second_pos = context.find("Second").unwrap();
        assert!(first_pos < second_pos);
        assert!(context.contains("Sender: a@x"));
        assert_eq!(context.matches(CONTEXT_SEPARATOR).count(), 2);
    }
}
