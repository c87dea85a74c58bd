//! Overlapping, token-budgeted word chunker.
//!
//! Splits one page's text into chunks that respect a soft `max_tokens`
//! budget, seeding each new chunk with a trailing-word window from the
//! previous one. Page boundaries are hard splits: chunks never span
//! pages, so the overlap state resets per page. That trades some
//! cross-page context for precise page-level citation provenance.
//!
//! Token counts are estimated at roughly 4 characters per token,
//! applied per word. Chunking is deterministic: identical input always
//! produces identical chunk boundaries, which keeps re-ingestion
//! reproducible.

/// Approximate chars-per-token ratio for the word-level estimate.
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a piece of text: `ceil(len / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(CHARS_PER_TOKEN)
}

/// Split one page's text into overlapping, size-bounded chunks.
///
/// Words are whitespace-delimited. A chunk closes when adding the next
/// word would push its estimated token count over `max_tokens`; the next
/// chunk is seeded with trailing words of the closed chunk whose
/// cumulative estimate stays within `overlap_tokens`. A single word
/// whose estimate alone exceeds `max_tokens` is still placed whole into
/// its own chunk: the budget is soft, never mid-word.
///
/// Empty or all-whitespace input yields no chunks. Expects
/// `overlap_tokens < max_tokens` (enforced by config validation).
pub fn chunk_page(page_text: &str, max_tokens: usize, overlap_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0usize;

    for word in page_text.split_whitespace() {
        let word_tokens = estimate_tokens(word);

        if current_tokens + word_tokens > max_tokens && !current.is_empty() {
            chunks.push(current.join(" "));

            let (window, window_tokens) = overlap_window(&current, overlap_tokens);
            current = window;
            current_tokens = window_tokens;
        }

        current.push(word);
        current_tokens += word_tokens;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

/// Walk backward from the end of a closed chunk, collecting trailing
/// words until adding one more would exceed the overlap budget. The
/// returned window never exceeds `overlap_tokens` estimated tokens.
fn overlap_window<'a>(words: &[&'a str], overlap_tokens: usize) -> (Vec<&'a str>, usize) {
    let mut window: Vec<&str> = Vec::new();
    let mut window_tokens = 0usize;

    for word in words.iter().rev() {
        let word_tokens = estimate_tokens(word);
        if window_tokens + word_tokens > overlap_tokens {
            break;
        }
        window.push(word);
        window_tokens += word_tokens;
    }

    window.reverse();
    (window, window_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn empty_page_yields_no_chunks() {
        assert!(chunk_page("", 800, 100).is_empty());
        assert!(chunk_page("   \n\t  ", 800, 100).is_empty());
    }

    #[test]
    fn short_page_yields_single_chunk() {
        let chunks = chunk_page("hello there world", 800, 100);
        assert_eq!(chunks, vec!["hello there world".to_string()]);
    }

    #[test]
    fn chunks_are_never_empty() {
        let text = (0..500)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        for chunk in chunk_page(&text, 20, 5) {
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn long_page_splits_into_multiple_chunks() {
        // 2000 words of ~2 tokens each blows well past an 800-token budget.
        let text = (0..2000)
            .map(|i| format!("word{:04}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_page(&text, 800, 100);
        assert!(chunks.len() > 1, "expected multiple chunks");
    }

    #[test]
    fn deterministic_boundaries() {
        let text = (0..300)
            .map(|i| format!("token{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let a = chunk_page(&text, 50, 10);
        let b = chunk_page(&text, 50, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_word_placed_whole() {
        let giant = "x".repeat(400); // ~100 tokens, budget is 10
        let text = format!("small {} tail", giant);
        let chunks = chunk_page(&text, 10, 2);
        assert!(chunks.iter().any(|c| c.contains(&giant)));
        // No chunk ever splits a word.
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!(word == "small" || word == giant || word == "tail");
            }
        }
    }

    #[test]
    fn overlap_window_respects_budget() {
        let text = (0..400)
            .map(|i| format!("w{:03}", i)) // 4 chars = 1 token each
            .collect::<Vec<_>>()
            .join(" ");
        let overlap = 10;
        let chunks = chunk_page(&text, 50, overlap);
        assert!(chunks.len() > 2);

        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split_whitespace().collect();
            let next: Vec<&str> = pair[1].split_whitespace().collect();

            // The next chunk starts with a suffix of the previous one.
            let shared = (0..=next.len())
                .rev()
                .find(|&n| prev.ends_with(&next[..n]))
                .unwrap_or(0);
            assert!(shared > 0, "expected overlap between consecutive chunks");

            let shared_tokens: usize = next[..shared].iter().map(|w| estimate_tokens(w)).sum();
            assert!(
                shared_tokens <= overlap,
                "overlap window of {} tokens exceeds budget {}",
                shared_tokens,
                overlap
            );
        }
    }

    #[test]
    fn unique_words_reconstruct_original_sequence() {
        let original: Vec<String> = (0..250).map(|i| format!("item{:03}", i)).collect();
        let text = original.join(" ");
        let chunks = chunk_page(&text, 40, 8);
        assert!(chunks.len() > 1);

        // Rebuild the word sequence by dropping each chunk's overlap
        // prefix (the longest prefix matching a suffix of what has been
        // rebuilt so far).
        let mut rebuilt: Vec<&str> = Vec::new();
        for chunk in &chunks {
            let words: Vec<&str> = chunk.split_whitespace().collect();
            let shared = (0..=words.len().min(rebuilt.len()))
                .rev()
                .find(|&n| rebuilt.ends_with(&words[..n]))
                .unwrap_or(0);
            rebuilt.extend_from_slice(&words[shared..]);
        }

        let expected: Vec<&str> = original.iter().map(|s| s.as_str()).collect();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn fifty_words_fit_in_one_chunk_at_defaults() {
        let text = (0..50)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_page(&text, 800, 100);
        assert_eq!(chunks.len(), 1);
    }
}
