//! Retriever: embed a question and rank stored chunks against it.
//!
//! Runs once per question. One embedding request, one store query,
//! no state shared with other in-flight questions.

use tracing::debug;

use crate::embedding::Embedder;
use crate::error::PipelineError;
use crate::models::RetrievedChunk;
use crate::store::VectorStore;

/// Retrieve the `k` chunks most similar to `question`, descending.
///
/// `document_id`, when given, excludes other documents' chunks from
/// ranking entirely. An empty result is a valid outcome (the caller
/// answers "not found"), never an error.
pub async fn retrieve(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    question: &str,
    document_id: Option<&str>,
    k: i64,
) -> Result<Vec<RetrievedChunk>, PipelineError> {
    if question.trim().is_empty() {
        return Err(PipelineError::InputInvalid(
            "question must not be empty".to_string(),
        ));
    }

    let query_vec = embedder.embed(question).await?;
    let results = store.search(&query_vec, k, document_id).await?;

    debug!(
        k,
        document_id = document_id.unwrap_or("<any>"),
        results = results.len(),
        "retrieved chunks"
    );

    Ok(results)
}
