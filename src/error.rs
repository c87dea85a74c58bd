//! Failure taxonomy for the question-answering pipeline.
//!
//! Every external-call failure aborts the current unit of work (one
//! ingestion or one question) and surfaces as a distinct variant. The
//! "no relevant information" fallback answer is a success outcome and
//! never maps to an error here.

use thiserror::Error;

/// Typed failures produced by the ingestion and answering pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or empty input, rejected before any external call.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// Extraction produced no usable page text.
    #[error("no usable page text: {0}")]
    ExtractionEmpty(String),

    /// The embedding service failed, at ingestion or query time.
    #[error("embedding request failed: {0}")]
    EmbeddingFailed(String),

    /// The vector store failed to execute a similarity query.
    #[error("vector search failed: {0}")]
    SearchFailed(String),

    /// A persistence operation failed. Ingestion guarantees no
    /// partially-visible document is left behind.
    #[error("storage operation failed: {0}")]
    StorageFailed(String),

    /// The completion service failed to produce an answer.
    #[error("completion request failed: {0}")]
    CompletionFailed(String),

    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Invalid or incomplete configuration detected at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        PipelineError::StorageFailed(e.to_string())
    }
}
