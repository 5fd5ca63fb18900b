//! # Mailseek
//!
//! Retrieval-augmented search over your email.
//!
//! Mailseek fetches messages from a mail provider, normalizes and embeds
//! their bodies into a vector index, and answers natural-language questions
//! by retrieving the most similar emails and summarizing them with an LLM
//! chat-completion call.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌───────────┐
//! │  Gmail    │──▶│  Normalize   │──▶│  Vector   │
//! │  adapter  │   │  + Embed     │   │  store    │
//! └───────────┘   └──────────────┘   └────┬──────┘
//!                                         │ query
//!                      ┌──────────────────┤
//!                      ▼                  ▼
//!                 ┌──────────┐      ┌──────────┐
//!                 │   CLI    │      │   HTTP   │
//!                 │(mailseek)│      │  (axum)  │
//!                 └──────────┘      └──────────┘
//!                     summarize via LLM
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mailseek init                         # create the SQLite index
//! mailseek fetch --ingest               # pull messages from Gmail and index them
//! mailseek search "standup meeting"     # retrieve + summarize
//! mailseek serve                        # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Request/response data types |
//! | [`error`] | Error taxonomy for the pipeline |
//! | [`normalize`] | Body text cleanup before indexing |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store trait + backends |
//! | [`llm`] | Chat-completion client for summaries |
//! | [`pipeline`] | Ingestion and retrieval-and-summarization core |
//! | [`gmail`] | Mail provider adapter |
//! | [`server`] | HTTP API |

pub mod config;
pub mod embedding;
pub mod error;
pub mod gmail;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod server;
pub mod store;
