//! Storage abstraction over documents, chunks, and similarity search.
//!
//! The [`VectorStore`] trait is the single source of truth for
//! similarity ranking; the pipeline holds no separate in-memory index
//! across requests. Implementations must be `Send + Sync` so one
//! injected handle can serve concurrent ingestions and questions.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::models::{Chunk, Document, DocumentDetail, RetrievedChunk};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Persistent store for documents, chunks, and their embeddings.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_document`](VectorStore::insert_document) | Persist a document with all its chunks, atomically |
/// | [`search`](VectorStore::search) | Top-k cosine similarity over stored chunks |
/// | [`get_document`](VectorStore::get_document) | Document plus ordered chunk texts |
/// | [`list_documents`](VectorStore::list_documents) | All documents, newest first |
/// | [`delete_document`](VectorStore::delete_document) | Remove a document and cascade to its chunks |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist a document together with its full chunk batch.
    ///
    /// Atomic: after a failure the document must not be queryable at
    /// all. There is no update path; documents are immutable.
    async fn insert_document(
        &self,
        document: &Document,
        chunks: &[Chunk],
    ) -> Result<(), PipelineError>;

    /// Return the `k` stored chunks nearest to `query_vec` by cosine
    /// similarity, descending. When `document_id` is set, chunks of
    /// other documents are excluded before ranking (a hard filter).
    /// `k <= 0` or an empty store yields an empty vec, not an error.
    async fn search(
        &self,
        query_vec: &[f32],
        k: i64,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>, PipelineError>;

    /// Fetch one document with its chunks in `chunk_index` order.
    async fn get_document(&self, id: &str) -> Result<Option<DocumentDetail>, PipelineError>;

    /// List all documents, most recently uploaded first.
    async fn list_documents(&self) -> Result<Vec<Document>, PipelineError>;

    /// Delete a document and all its chunks. Returns `false` when no
    /// such document exists.
    async fn delete_document(&self, id: &str) -> Result<bool, PipelineError>;
}
