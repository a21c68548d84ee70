//! Overlapping, sentence-boundary-aware chunk splitting

use crate::config::{CHUNK_OVERLAP, CHUNK_SIZE};

/// Splits one page's normalized text into overlapping chunks.
pub struct Chunker {
    /// Target chunk size in characters
    target: usize,
    /// Characters shared between consecutive chunks
    overlap: usize,
}

impl Chunker {
    /// Create a chunker with explicit parameters.
    pub fn new(target: usize, overlap: usize) -> Self {
        // Snapping never shrinks a chunk below target/2, so this keeps the
        // cursor strictly advancing.
        debug_assert!(overlap < target / 2);
        Self { target, overlap }
    }

    /// Split page text into ordered chunk strings, dropping empty ones.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.spans(text)
            .into_iter()
            .filter_map(|(start, end)| {
                let piece = text[start..end].trim();
                (!piece.is_empty()).then(|| piece.to_string())
            })
            .collect()
    }

    /// Cursor walk producing the raw (start, end) byte spans before trimming.
    ///
    /// Mid-page boundaries snap to the nearest sentence-ending period in the
    /// back half of the window, and the next span starts `overlap` characters
    /// before the previous end. A boundary forced by the page's end gets
    /// neither treatment.
    fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        let len = text.len();
        let mut spans = Vec::new();
        let mut cursor = 0usize;

        while cursor < len {
            let mut end = cursor + self.target;
            if end >= len {
                spans.push((cursor, len));
                break;
            }
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            if let Some(cut) = sentence_cut(text, cursor, end) {
                end = cut;
            }
            spans.push((cursor, end));

            let mut next = end.saturating_sub(self.overlap);
            while next > 0 && !text.is_char_boundary(next) {
                next -= 1;
            }
            if next <= cursor {
                // Stall guard; unreachable with the default parameters.
                next = end;
            }
            cursor = next;
        }

        spans
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(CHUNK_SIZE, CHUNK_OVERLAP)
    }
}

/// Byte offset just past the last period in `[start, end)`, when that period
/// lies strictly in the back half of the window.
fn sentence_cut(text: &str, start: usize, end: usize) -> Option<usize> {
    let window = &text[start..end];
    let pos = window.rfind('.')?;
    (pos > window.len() / 2).then_some(start + pos + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(count: usize) -> String {
        (0..count)
            .map(|i| format!("Sentence number {i:04} describes one maintenance step."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_page_is_one_trimmed_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker.split("  Check the oil level weekly.  ");
        assert_eq!(chunks, vec!["Check the oil level weekly.".to_string()]);
    }

    #[test]
    fn test_whitespace_page_yields_nothing() {
        let chunker = Chunker::default();
        assert!(chunker.split("   \n ").is_empty());
    }

    #[test]
    fn test_boundaries_snap_to_sentence_end() {
        let chunker = Chunker::default();
        let text = sentences(60);
        let chunks = chunker.split(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.ends_with('.'), "mid-page chunk not on a sentence end: {chunk:?}");
        }
    }

    #[test]
    fn test_consecutive_spans_share_exactly_the_overlap() {
        let chunker = Chunker::default();
        let text = sentences(60);
        let spans = chunker.spans(&text);
        assert!(spans.len() > 2);
        for pair in spans.windows(2) {
            let (_, prev_end) = pair[0];
            let (next_start, _) = pair[1];
            // The implemented overlap, not merely the intended one.
            assert_eq!(next_start, prev_end - CHUNK_OVERLAP);
        }
    }

    #[test]
    fn test_spans_cover_the_page_without_gaps() {
        let chunker = Chunker::default();
        let text = sentences(60);
        let spans = chunker.spans(&text);
        assert_eq!(spans.first().unwrap().0, 0);
        assert_eq!(spans.last().unwrap().1, text.len());
        for pair in spans.windows(2) {
            assert!(pair[1].0 < pair[0].1, "gap between consecutive spans");
        }
    }

    #[test]
    fn test_no_snap_when_period_only_in_front_half() {
        let chunker = Chunker::new(100, 10);
        // Single period at offset 20, well inside the front half of the window.
        let text = format!("{}. {}", "a".repeat(19), "b".repeat(300));
        let spans = chunker.spans(&text);
        assert_eq!(spans[0], (0, 100));
    }

    #[test]
    fn test_multibyte_text_respects_char_boundaries() {
        let chunker = Chunker::new(100, 10);
        let text = "ü".repeat(300);
        for chunk in chunker.split(&text) {
            assert!(!chunk.is_empty());
        }
    }
}
