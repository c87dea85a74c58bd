//! SQLite-backed [`VectorStore`].
//!
//! Embeddings are stored as little-endian f32 BLOBs; similarity search
//! loads candidate vectors and ranks them by cosine similarity in Rust.
//! Good for single-document corpora of thousands of chunks; an ANN
//! index lives behind the same trait if that ever stops being true.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::PipelineError;
use crate::models::{Chunk, ChunkRecord, Document, DocumentDetail, RetrievedChunk};

use super::VectorStore;

/// Store backed by a shared SQLite connection pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
    let uploaded_at: i64 = row.get("uploaded_at");
    Document {
        id: row.get("id"),
        filename: row.get("filename"),
        total_pages: row.get("total_pages"),
        total_chunks: row.get("total_chunks"),
        uploaded_at: chrono::DateTime::from_timestamp(uploaded_at, 0).unwrap_or_default(),
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn insert_document(
        &self,
        document: &Document,
        chunks: &[Chunk],
    ) -> Result<(), PipelineError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, filename, total_pages, total_chunks, uploaded_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&document.id)
        .bind(&document.filename)
        .bind(document.total_pages)
        .bind(document.total_chunks)
        .bind(document.uploaded_at.timestamp())
        .execute(&mut *tx)
        .await?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, document_id, content, page_number, chunk_index, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(&chunk.content)
            .bind(chunk.page_number)
            .bind(chunk.chunk_index)
            .bind(vec_to_blob(&chunk.embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
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

        // The document filter narrows candidates before ranking.
        let rows = match document_id {
            Some(doc_id) => {
                sqlx::query(
                    r#"
                    SELECT id, document_id, content, page_number, chunk_index, embedding
                    FROM chunks
                    WHERE document_id = ?
                    "#,
                )
                .bind(doc_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, document_id, content, page_number, chunk_index, embedding
                    FROM chunks
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| PipelineError::SearchFailed(e.to_string()))?;

        let mut candidates: Vec<RetrievedChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let similarity = cosine_similarity(query_vec, &blob_to_vec(&blob));
                RetrievedChunk {
                    chunk_id: row.get("id"),
                    document_id: row.get("document_id"),
                    content: row.get("content"),
                    page_number: row.get("page_number"),
                    chunk_index: row.get("chunk_index"),
                    similarity,
                }
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
        let doc_row = sqlx::query(
            "SELECT id, filename, total_pages, total_chunks, uploaded_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(doc_row) = doc_row else {
            return Ok(None);
        };

        let chunk_rows = sqlx::query(
            r#"
            SELECT content, page_number, chunk_index
            FROM chunks
            WHERE document_id = ?
            ORDER BY chunk_index
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let chunks = chunk_rows
            .iter()
            .map(|row| ChunkRecord {
                chunk_index: row.get("chunk_index"),
                page_number: row.get("page_number"),
                content: row.get("content"),
            })
            .collect();

        Ok(Some(DocumentDetail {
            document: row_to_document(&doc_row),
            chunks,
        }))
    }

    async fn list_documents(&self) -> Result<Vec<Document>, PipelineError> {
        let rows = sqlx::query(
            r#"
            SELECT id, filename, total_pages, total_chunks, uploaded_at
            FROM documents
            ORDER BY uploaded_at DESC, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_document).collect())
    }

    async fn delete_document(&self, id: &str) -> Result<bool, PipelineError> {
        let mut tx = self.pool.begin().await?;

        // Explicit cascade; also enforced by the schema's foreign key.
        sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
