//! # citeseek
//!
//! Upload a document, ask questions about it, and get answers grounded
//! in the document's content with page-level citations.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌───────────┐   ┌──────────┐
//! │ Extract  │──▶│ Chunker │──▶│ Embedder  │──▶│  SQLite   │
//! │ (pages)  │   │         │   │           │   │  vectors  │
//! └──────────┘   └─────────┘   └───────────┘   └────┬─────┘
//!                                                   │
//! ┌──────────┐   ┌────────────┐   ┌───────────┐     │
//! │ Answer + │◀──│ Completion │◀──│ Retriever │◀────┘
//! │ citations│   │  service   │   │  (top-k)  │
//! └──────────┘   └────────────┘   └───────────┘
//! ```
//!
//! Ingestion runs once per document: each page is split into
//! overlapping, token-budgeted chunks, every chunk is embedded, and the
//! batch is persisted atomically. Answering runs once per question:
//! the question is embedded, the nearest chunks are retrieved, and the
//! completion service produces an answer constrained to that context,
//! with one citation per context chunk.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration |
//! | [`models`] | Core data types |
//! | [`error`] | Failure taxonomy |
//! | [`chunker`] | Overlapping token-budgeted chunking |
//! | [`extract`] | File bytes → page texts |
//! | [`embedding`] | Embedding service seam + vector utilities |
//! | [`completion`] | Completion service seam |
//! | [`store`] | Vector store seam (SQLite, in-memory) |
//! | [`ingest`] | Ingestion pipeline |
//! | [`retrieve`] | Top-k retrieval |
//! | [`answer`] | Context assembly, synthesis, citations |
//! | [`server`] | JSON HTTP API |

pub mod answer;
pub mod chunker;
pub mod completion;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod retrieve;
pub mod server;
pub mod store;
