//! Answer synthesis: assemble a grounded context window and derive
//! citations from it.
//!
//! Per question: embed, retrieve, then either fall back (nothing
//! retrieved) or synthesize. No retries here; each external failure is
//! terminal for the question. Citations reflect what was shown to the
//! model, not what its prose referenced.

use tracing::debug;

use crate::completion::{CompletionModel, SamplingConfig};
use crate::embedding::Embedder;
use crate::error::PipelineError;
use crate::models::{Answer, Citation, RetrievedChunk};
use crate::retrieve::retrieve;
use crate::store::VectorStore;

/// Returned when retrieval finds nothing; a success outcome, not an
/// error, and no completion call is made.
pub const FALLBACK_ANSWER: &str =
    "I couldn't find any relevant information to answer your question.";

/// Fixed grounding instruction for the completion service.
const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on the \
provided context from a document. Always cite the page numbers when referencing information. If \
the context doesn't contain enough information to answer the question, say so. Format your \
citations as [Page X] inline with your answer.";

/// Citation excerpts truncate chunk content to this many characters.
const EXCERPT_CHARS: usize = 150;

/// Synthesize an answer from retrieved chunks.
///
/// Chunks are concatenated in retrieval order (highest similarity
/// first), each tagged with its page number, and sent to the completion
/// service with the grounding instruction. The citation list contains
/// one entry per context chunk, in the same order.
pub async fn synthesize(
    completion: &dyn CompletionModel,
    sampling: SamplingConfig,
    question: &str,
    retrieved: &[RetrievedChunk],
) -> Result<Answer, PipelineError> {
    if retrieved.is_empty() {
        return Ok(Answer {
            answer: FALLBACK_ANSWER.to_string(),
            citations: Vec::new(),
        });
    }

    let context = build_context(retrieved);
    let user = format!(
        "Context from the document:\n\n{}\n\nQuestion: {}",
        context, question
    );

    debug!(
        chunks = retrieved.len(),
        context_bytes = context.len(),
        "invoking completion service"
    );

    let answer = completion.complete(SYSTEM_PROMPT, &user, sampling).await?;

    let citations = retrieved
        .iter()
        .map(|chunk| Citation {
            page: chunk.page_number,
            text: excerpt(&chunk.content),
        })
        .collect();

    Ok(Answer { answer, citations })
}

/// One question end to end: retrieve then synthesize.
#[allow(clippy::too_many_arguments)]
pub async fn ask(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    completion: &dyn CompletionModel,
    sampling: SamplingConfig,
    question: &str,
    document_id: Option<&str>,
    k: i64,
) -> Result<Answer, PipelineError> {
    let retrieved = retrieve(store, embedder, question, document_id, k).await?;
    synthesize(completion, sampling, question, &retrieved).await
}

/// Render retrieved chunks as a single context block, each tagged with
/// its source page and separated by blank lines.
fn build_context(retrieved: &[RetrievedChunk]) -> String {
    retrieved
        .iter()
        .map(|chunk| format!("[Page {}]: {}", chunk.page_number, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First 150 characters of the chunk content, with a truncation marker
/// when content was cut. Char-based, so multi-byte text stays intact.
fn excerpt(content: &str) -> String {
    let mut chars = content.char_indices();
    match chars.nth(EXCERPT_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCompletion {
        calls: AtomicUsize,
        reply: String,
    }

    impl CountingCompletion {
        fn new(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionModel for CountingCompletion {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _sampling: SamplingConfig,
        ) -> Result<String, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn sampling() -> SamplingConfig {
        SamplingConfig {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    fn retrieved(page: i64, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: format!("c-{}", page),
            document_id: "d1".to_string(),
            content: content.to_string(),
            page_number: page,
            chunk_index: page - 1,
            similarity: 0.9,
        }
    }

    #[tokio::test]
    async fn empty_retrieval_returns_fallback_without_completion_call() {
        let completion = CountingCompletion::new("unused");
        let answer = synthesize(&completion, sampling(), "what?", &[])
            .await
            .unwrap();

        assert_eq!(answer.answer, FALLBACK_ANSWER);
        assert!(answer.citations.is_empty());
        assert_eq!(completion.call_count(), 0);
    }

    #[tokio::test]
    async fn one_citation_per_chunk_in_retrieval_order() {
        let completion = CountingCompletion::new("Rust is great [Page 3].");
        let chunks = vec![
            retrieved(3, "most similar"),
            retrieved(1, "second"),
            retrieved(7, "third"),
        ];

        let answer = synthesize(&completion, sampling(), "tell me", &chunks)
            .await
            .unwrap();

        assert_eq!(completion.call_count(), 1);
        assert_eq!(answer.citations.len(), 3);
        let pages: Vec<i64> = answer.citations.iter().map(|c| c.page).collect();
        assert_eq!(pages, vec![3, 1, 7]);
    }

    #[tokio::test]
    async fn excerpts_are_bounded_and_marked() {
        let completion = CountingCompletion::new("ok");
        let long = "x".repeat(500);
        let chunks = vec![retrieved(1, &long), retrieved(2, "short one")];

        let answer = synthesize(&completion, sampling(), "q", &chunks)
            .await
            .unwrap();

        assert_eq!(answer.citations[0].text.chars().count(), 153);
        assert!(answer.citations[0].text.ends_with("..."));
        assert_eq!(answer.citations[1].text, "short one");
    }

    #[test]
    fn excerpt_respects_utf8_boundaries() {
        let text = "é".repeat(200);
        let cut = excerpt(&text);
        assert_eq!(cut.chars().count(), 153);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn context_tags_pages_and_separates_with_blank_lines() {
        let chunks = vec![retrieved(2, "alpha"), retrieved(5, "beta")];
        let context = build_context(&chunks);
        assert_eq!(context, "[Page 2]: alpha\n\n[Page 5]: beta");
    }
}
