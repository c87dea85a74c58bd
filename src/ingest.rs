//! Ingestion pipeline: page texts → chunks → embeddings → storage.
//!
//! Runs once per uploaded document. Each page is chunked independently
//! (1-based page numbers, chunk indices strictly increasing across
//! pages), every chunk is embedded, and the document plus its full
//! chunk batch is persisted atomically. A failed embedding or storage
//! call aborts the whole ingestion and leaves nothing visible.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chunker::chunk_page;
use crate::config::ChunkingConfig;
use crate::embedding::Embedder;
use crate::error::PipelineError;
use crate::models::{Chunk, Document};
use crate::store::VectorStore;

/// Ingest one document from its extracted page texts.
///
/// Blank pages count toward `total_pages` but contribute no chunks;
/// a document whose pages are all blank is rejected. Embedding requests
/// fan out concurrently (bounded by `chunking.embed_concurrency`) and
/// join before persistence, first failure aborting the batch.
pub async fn ingest(
    store: &dyn VectorStore,
    embedder: Arc<dyn Embedder>,
    chunking: &ChunkingConfig,
    document_name: &str,
    page_texts: &[String],
) -> Result<Document, PipelineError> {
    if document_name.trim().is_empty() {
        return Err(PipelineError::InputInvalid(
            "document name must not be empty".to_string(),
        ));
    }
    if page_texts.is_empty() || page_texts.iter().all(|p| p.trim().is_empty()) {
        return Err(PipelineError::ExtractionEmpty(format!(
            "document '{}' contains no page text",
            document_name
        )));
    }

    let document_id = Uuid::new_v4().to_string();

    // Chunk every page; indices continue across page boundaries.
    let mut chunks: Vec<Chunk> = Vec::new();
    for (page_idx, page_text) in page_texts.iter().enumerate() {
        let page_number = page_idx as i64 + 1;
        for content in chunk_page(page_text, chunking.max_tokens, chunking.overlap_tokens) {
            chunks.push(Chunk {
                id: Uuid::new_v4().to_string(),
                document_id: document_id.clone(),
                content,
                page_number,
                chunk_index: chunks.len() as i64,
                embedding: Vec::new(),
            });
        }
    }

    debug!(
        document = document_name,
        pages = page_texts.len(),
        chunks = chunks.len(),
        "chunked document"
    );

    let embeddings = embed_all(embedder, &chunks, chunking.embed_concurrency).await?;
    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.embedding = embedding;
    }

    let document = Document {
        id: document_id,
        filename: document_name.to_string(),
        total_pages: page_texts.len() as i64,
        total_chunks: chunks.len() as i64,
        uploaded_at: Utc::now(),
    };

    store.insert_document(&document, &chunks).await?;

    info!(
        document = document_name,
        id = %document.id,
        pages = document.total_pages,
        chunks = document.total_chunks,
        "ingested document"
    );

    Ok(document)
}

/// Embed each chunk's content as a bounded fan-out task group.
///
/// Chunks are independent, so requests run concurrently; results are
/// reassembled in chunk order before returning. The first failure
/// aborts all outstanding requests.
async fn embed_all(
    embedder: Arc<dyn Embedder>,
    chunks: &[Chunk],
    concurrency: usize,
) -> Result<Vec<Vec<f32>>, PipelineError> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks: JoinSet<Result<(usize, Vec<f32>), PipelineError>> = JoinSet::new();

    for (idx, chunk) in chunks.iter().enumerate() {
        let embedder = embedder.clone();
        let semaphore = semaphore.clone();
        let content = chunk.content.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.map_err(|_| {
                PipelineError::EmbeddingFailed("embedding task group closed".to_string())
            })?;
            let vector = embedder.embed(&content).await?;
            Ok((idx, vector))
        });
    }

    let mut embeddings: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok((idx, vector))) => embeddings[idx] = Some(vector),
            Ok(Err(e)) => {
                tasks.abort_all();
                return Err(e);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(PipelineError::EmbeddingFailed(e.to_string()));
            }
        }
    }

    // Every task either filled its slot or we bailed above.
    embeddings
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| {
                PipelineError::EmbeddingFailed("missing embedding result".to_string())
            })
        })
        .collect()
}
