//! Core data models for the document question-answering pipeline.
//!
//! These types flow between the ingestion pipeline, the vector store,
//! the retriever, and the answer synthesizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded document. Immutable after creation; deleted as a whole
/// (cascades to its chunks).
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub total_pages: i64,
    pub total_chunks: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// A page-scoped text segment with its embedding, the unit of retrieval.
///
/// `page_number` is 1-based; `chunk_index` is 0-based and strictly
/// increasing across all pages of a document in emission order.
/// Immutable once created.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub page_number: i64,
    pub chunk_index: i64,
    pub embedding: Vec<f32>,
}

/// A chunk returned from similarity search, with its score.
///
/// The stored embedding is not carried back out of the store.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub content: String,
    pub page_number: i64,
    pub chunk_index: i64,
    pub similarity: f32,
}

/// A `(page, excerpt)` pointer back to a chunk used to ground an answer.
///
/// The excerpt is a bounded-length prefix of the chunk content, a
/// display view rather than a stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub page: i64,
    pub text: String,
}

/// A synthesized answer with its citation list.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Who authored a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A transcript entry in an interactive session. Session-local and never
/// persisted; the pipeline is stateless across questions.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            citations: None,
        }
    }

    pub fn assistant(answer: Answer) -> Self {
        Self {
            role: Role::Assistant,
            content: answer.answer,
            citations: Some(answer.citations),
        }
    }
}

/// A document plus its chunk texts, for the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    pub chunks: Vec<ChunkRecord>,
}

/// A single chunk within a [`DocumentDetail`]. Embeddings stay in the store.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkRecord {
    pub chunk_index: i64,
    pub page_number: i64,
    pub content: String,
}
