//! Error taxonomy for the ingestion and retrieval pipeline.
//!
//! Every failure from a dependency is wrapped with the operation that
//! failed and propagated upward; nothing is swallowed, and no failure is
//! fatal to the process. Each call is independent — a failed search or
//! add must not corrupt state for subsequent calls.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied value failed validation at the pipeline boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An external service (mail provider, vector store, LLM) could not
    /// be reached or answered with an error status.
    #[error("{service} unavailable: {cause}")]
    UpstreamUnavailable {
        service: &'static str,
        cause: anyhow::Error,
    },

    /// Any failure during the search pipeline, wrapping the underlying cause.
    #[error("search failed: {cause}")]
    RetrievalFailure { cause: anyhow::Error },

    /// Any failure during batch ingestion, wrapping the underlying cause.
    #[error("ingestion failed: {cause}")]
    IngestionFailure { cause: anyhow::Error },
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn retrieval(cause: impl Into<anyhow::Error>) -> Self {
        Self::RetrievalFailure {
            cause: cause.into(),
        }
    }

    pub fn ingestion(cause: impl Into<anyhow::Error>) -> Self {
        Self::IngestionFailure {
            cause: cause.into(),
        }
    }

    pub fn upstream(service: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        Self::UpstreamUnavailable {
            service,
            cause: cause.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_operation() {
        let e = Error::retrieval(anyhow::anyhow!("connection refused"));
        let msg = e.to_string();
        assert!(msg.contains("search failed"));
        assert!(msg.contains("connection refused"));

        let e = Error::upstream("gmail", anyhow::anyhow!("timed out"));
        assert!(e.to_string().contains("gmail unavailable"));
    }
}
