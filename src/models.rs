//! Request and response data types for the Mailseek API.
//!
//! These shapes are shared between the HTTP layer, the CLI, and the
//! on-disk `emails.json` dump format produced by `mailseek fetch`.

use serde::{Deserialize, Serialize};

/// A single email message as delivered by the mail provider.
///
/// Identity is the provider-assigned `id`; re-adding the same id
/// overwrites the previously stored content (upsert semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub date: String,
    pub body: String,
}

/// Transport grouping for a set of emails. No lifecycle of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailBatch {
    pub emails: Vec<Email>,
}

/// A search request: the natural-language query plus a result cap.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

fn default_n_results() -> usize {
    5
}

/// Metadata-only projection of a matched email. Never carries the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEmail {
    pub subject: String,
    pub date: String,
    pub sender: String,
}

/// Result of a search: the LLM summary plus the matched emails' metadata,
/// in the similarity order returned by the vector store.
///
/// Invariant: `matches == source_emails.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub summary: String,
    pub matches: usize,
    pub source_emails: Vec<SourceEmail>,
}

/// Outcome of an ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddResult {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl AddResult {
    pub fn success(count: usize) -> Self {
        Self {
            status: "success".to_string(),
            message: format!("Added {} emails to vector store", count),
            count: Some(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_default_n_results() {
        let q: SearchQuery = serde_json::from_str(r#"{"query": "standup"}"#).unwrap();
        assert_eq!(q.n_results, 5);

        let q: SearchQuery =
            serde_json::from_str(r#"{"query": "standup", "n_results": 3}"#).unwrap();
        assert_eq!(q.n_results, 3);
    }

    #[test]
    fn test_email_batch_roundtrip() {
        let json = r#"{"emails": [{"id": "m1", "sender": "a@x.co", "subject": "hi", "date": "Mon, 1 Jan 2024", "body": "hello"}]}"#;
        let batch: EmailBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.emails.len(), 1);
        assert_eq!(batch.emails[0].id, "m1");
    }

    #[test]
    fn test_add_result_message() {
        let r = AddResult::success(2);
        assert_eq!(r.status, "success");
        assert_eq!(r.count, Some(2));
        assert!(r.message.contains("2 emails"));
    }
}
