//! In-memory [`VectorStore`] for tests.
//!
//! `HashMap` behind `std::sync::RwLock`; vector search is brute-force
//! cosine similarity over all stored chunks, matching the SQLite
//! implementation's ranking exactly.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::error::PipelineError;
use crate::models::{Chunk, ChunkRecord, Document, DocumentDetail, RetrievedChunk};

use super::VectorStore;

struct StoredDocument {
    document: Document,
    chunks: Vec<Chunk>,
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, StoredDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn insert_document(
        &self,
        document: &Document,
        chunks: &[Chunk],
    ) -> Result<(), PipelineError> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| PipelineError::StorageFailed("store lock poisoned".to_string()))?;

        if docs.contains_key(&document.id) {
            return Err(PipelineError::StorageFailed(format!(
                "document {} already exists",
                document.id
            )));
        }

        docs.insert(
            document.id.clone(),
            StoredDocument {
                document: document.clone(),
                chunks: chunks.to_vec(),
            },
        );
        Ok(())
    }

    async fn search(
        &self,
        query_vec: &[f32],
        k: i64,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>, PipelineError> {
        if k <= 0 {
            return Ok(Vec::new());
        }

        let docs = self
            .docs
            .read()
            .map_err(|_| PipelineError::SearchFailed("store lock poisoned".to_string()))?;

        let mut candidates: Vec<RetrievedChunk> = docs
            .values()
            .filter(|stored| document_id.is_none_or(|id| stored.document.id == id))
            .flat_map(|stored| stored.chunks.iter())
            .map(|chunk| RetrievedChunk {
                chunk_id: chunk.id.clone(),
                document_id: chunk.document_id.clone(),
                content: chunk.content.clone(),
                page_number: chunk.page_number,
                chunk_index: chunk.chunk_index,
                similarity: cosine_similarity(query_vec, &chunk.embedding),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(k as usize);

        Ok(candidates)
    }

    async fn get_document(&self, id: &str) -> Result<Option<DocumentDetail>, PipelineError> {
        let docs = self
            .docs
            .read()
            .map_err(|_| PipelineError::StorageFailed("store lock poisoned".to_string()))?;

        Ok(docs.get(id).map(|stored| {
            let mut chunks: Vec<ChunkRecord> = stored
                .chunks
                .iter()
                .map(|c| ChunkRecord {
                    chunk_index: c.chunk_index,
                    page_number: c.page_number,
                    content: c.content.clone(),
                })
                .collect();
            chunks.sort_by_key(|c| c.chunk_index);
            DocumentDetail {
                document: stored.document.clone(),
                chunks,
            }
        }))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, PipelineError> {
        let docs = self
            .docs
            .read()
            .map_err(|_| PipelineError::StorageFailed("store lock poisoned".to_string()))?;

        let mut documents: Vec<Document> = docs.values().map(|s| s.document.clone()).collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(a.id.cmp(&b.id)));
        Ok(documents)
    }

    async fn delete_document(&self, id: &str) -> Result<bool, PipelineError> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| PipelineError::StorageFailed("store lock poisoned".to_string()))?;
        Ok(docs.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(id: &str, total_chunks: i64) -> Document {
        Document {
            id: id.to_string(),
            filename: format!("{}.pdf", id),
            total_pages: 1,
            total_chunks,
            uploaded_at: Utc::now(),
        }
    }

    fn chunk(doc_id: &str, index: i64, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: format!("{}-c{}", doc_id, index),
            document_id: doc_id.to_string(),
            content: format!("chunk {} of {}", index, doc_id),
            page_number: 1,
            chunk_index: index,
            embedding,
        }
    }

    #[tokio::test]
    async fn search_orders_by_descending_similarity() {
        let store = InMemoryStore::new();
        let chunks = vec![
            chunk("d1", 0, vec![1.0, 0.0]),
            chunk("d1", 1, vec![0.0, 1.0]),
            chunk("d1", 2, vec![0.7, 0.7]),
        ];
        store.insert_document(&doc("d1", 3), &chunks).await.unwrap();

        let results = store.search(&[1.0, 0.0], 3, None).await.unwrap();
        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        assert_eq!(results[0].chunk_index, 0);
    }

    #[tokio::test]
    async fn document_filter_is_hard() {
        let store = InMemoryStore::new();
        store
            .insert_document(&doc("d1", 1), &[chunk("d1", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .insert_document(&doc("d2", 1), &[chunk("d2", 0, vec![1.0, 0.0])])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10, Some("d2")).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.iter().all(|r| r.document_id == "d2"));
    }

    #[tokio::test]
    async fn zero_k_and_empty_store_yield_empty() {
        let store = InMemoryStore::new();
        assert!(store.search(&[1.0], 0, None).await.unwrap().is_empty());
        assert!(store.search(&[1.0], 5, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_to_chunks() {
        let store = InMemoryStore::new();
        store
            .insert_document(&doc("d1", 1), &[chunk("d1", 0, vec![1.0])])
            .await
            .unwrap();

        assert!(store.delete_document("d1").await.unwrap());
        assert!(!store.delete_document("d1").await.unwrap());
        assert!(store.search(&[1.0], 5, None).await.unwrap().is_empty());
        assert!(store.get_document("d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_rejected() {
        let store = InMemoryStore::new();
        store.insert_document(&doc("d1", 0), &[]).await.unwrap();
        let err = store.insert_document(&doc("d1", 0), &[]).await;
        assert!(matches!(err, Err(PipelineError::StorageFailed(_))));
    }
}
