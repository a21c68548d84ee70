//! Deterministic filter funnel from broad recall to cited context
//!
//! A broad similarity search over-fetches candidates; this module narrows
//! them to a small, topically coherent context set. Each stage is a pure
//! transform over the candidate list, composed in a fixed order by
//! `select_context`.

use crate::config::{CITATION_CAP, CONTEXT_CAP, SCORE_FLOOR};
use crate::types::{Citation, SearchHit};

/// Near-synonymous terms for clearing a fogged windshield. A question using
/// any of them is matched against the whole group, since manuals rarely use
/// the same word the driver does.
const WINDSHIELD_SYNONYMS: [&str; 3] = ["defog", "defrost", "demist"];

/// Minimum length for a question token to count as a keyword.
const MIN_KEYWORD_LEN: usize = 4;

/// Narrow broad-recall candidates down to the context set.
///
/// Stage order: same-document gate, score floor, lexical gate, re-rank and
/// cap. When the gates eliminate every candidate, the single best broad-
/// recall hit is returned instead, so any non-empty candidate list yields
/// at least one context item.
pub fn select_context(question: &str, candidates: Vec<SearchHit>) -> Vec<SearchHit> {
    let Some(top) = candidates
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .cloned()
    else {
        return Vec::new();
    };

    let survivors = rank_and_cap(matches_keywords(
        question,
        above_score_floor(same_document_as_top(&top, candidates)),
    ));

    if survivors.is_empty() {
        vec![top]
    } else {
        survivors
    }
}

/// Keep only candidates from the same source document as the best hit.
/// The answer is assumed to live within a single manual; recall is traded
/// for coherence.
fn same_document_as_top(top: &SearchHit, mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    hits.retain(|hit| hit.filename == top.filename);
    hits
}

/// Drop candidates below the fixed similarity floor.
fn above_score_floor(mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    hits.retain(|hit| hit.score >= SCORE_FLOOR);
    hits
}

/// Keep candidates whose text mentions at least one question keyword.
/// An empty keyword set passes everything through.
fn matches_keywords(question: &str, mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let keywords = question_keywords(question);
    if keywords.is_empty() {
        return hits;
    }
    hits.retain(|hit| {
        let text = hit.text.to_lowercase();
        keywords.iter().any(|keyword| text.contains(keyword))
    });
    hits
}

/// Keywords derived from the question: lowercased alphanumeric tokens of
/// at least four characters. A question touching the windshield-clearing
/// concept is matched against the whole synonym group instead.
pub fn question_keywords(question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();
    if WINDSHIELD_SYNONYMS.iter().any(|s| lowered.contains(s)) {
        return WINDSHIELD_SYNONYMS.iter().map(|s| s.to_string()).collect();
    }

    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= MIN_KEYWORD_LEN)
        .map(str::to_string)
        .collect()
}

/// Order by score descending and cap to the context size.
fn rank_and_cap(mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(CONTEXT_CAP);
    hits
}

/// Deduplicated (filename, page) pairs from the surviving hits, in
/// first-seen order, at most three.
pub fn citations(hits: &[SearchHit]) -> Vec<Citation> {
    let mut seen = Vec::new();
    for hit in hits {
        let citation = Citation {
            filename: hit.filename.clone(),
            page: hit.page,
        };
        if !seen.contains(&citation) {
            seen.push(citation);
            if seen.len() == CITATION_CAP {
                break;
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(filename: &str, page: u32, text: &str, score: f32) -> SearchHit {
        SearchHit {
            doc_id: filename.trim_end_matches(".pdf").to_lowercase(),
            filename: filename.to_string(),
            page,
            text: text.to_string(),
            score,
        }
    }

    /// 12 hits from A.pdf with scores 0.9 down to 0.35 (even pages mention
    /// the coolant procedure, odd pages do not), then 12 from B.pdf.
    fn fixed_candidates() -> Vec<SearchHit> {
        let mut candidates = Vec::new();
        for i in 0..12u32 {
            let text = if i % 2 == 0 {
                "Open the coolant drain plug at the radiator base."
            } else {
                "Appendix: fuse box diagram."
            };
            candidates.push(hit("A.pdf", i + 1, text, 0.9 - i as f32 * 0.05));
        }
        for i in 0..12u32 {
            candidates.push(hit(
                "B.pdf",
                i + 1,
                "Open the coolant drain plug at the radiator base.",
                0.88 - i as f32 * 0.05,
            ));
        }
        candidates
    }

    #[test]
    fn test_funnel_is_deterministic_on_fixed_candidates() {
        let context = select_context("How do I drain the coolant?", fixed_candidates());

        // Family gate keeps A.pdf, the floor keeps scores >= 0.45, the
        // lexical gate keeps the even pages mentioning the procedure.
        let pages: Vec<u32> = context.iter().map(|h| h.page).collect();
        assert_eq!(pages, vec![1, 3, 5, 7, 9]);
        assert!(context.iter().all(|h| h.filename == "A.pdf"));
        assert!(context.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_context_capped_at_six() {
        let candidates: Vec<SearchHit> = (0..10u32)
            .map(|i| hit("A.pdf", i + 1, "coolant drain steps", 0.9 - i as f32 * 0.01))
            .collect();
        let context = select_context("How do I drain the coolant?", candidates);
        assert_eq!(context.len(), 6);
        assert_eq!(context[0].page, 1);
    }

    #[test]
    fn test_empty_candidates_yield_empty_context() {
        assert!(select_context("anything", Vec::new()).is_empty());
    }

    #[test]
    fn test_fallback_to_single_top_hit() {
        // Every candidate is below the floor, so the gates eliminate all of
        // them; the broad-recall best must come back alone.
        let candidates = vec![
            hit("A.pdf", 1, "coolant drain steps", 0.40),
            hit("A.pdf", 2, "coolant drain steps", 0.35),
        ];
        let context = select_context("How do I drain the coolant?", candidates);
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].page, 1);
    }

    #[test]
    fn test_other_documents_are_gated_out() {
        let candidates = vec![
            hit("A.pdf", 1, "coolant drain steps", 0.9),
            hit("B.pdf", 4, "coolant drain steps", 0.89),
        ];
        let context = select_context("How do I drain the coolant?", candidates);
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].filename, "A.pdf");
    }

    #[test]
    fn test_short_tokens_make_no_keywords() {
        assert!(question_keywords("how do I fix it?").is_empty());
        // and an empty keyword set passes everything through
        let candidates = vec![
            hit("A.pdf", 1, "totally unrelated text", 0.9),
            hit("A.pdf", 2, "also unrelated", 0.8),
        ];
        let context = select_context("how do I fix it?", candidates);
        assert_eq!(context.len(), 2);
    }

    #[test]
    fn test_synonym_group_replaces_keywords() {
        let keywords = question_keywords("How do I defog the windshield?");
        assert_eq!(keywords, vec!["defog", "defrost", "demist"]);
    }

    #[test]
    fn test_defog_question_retains_defrost_chunk() {
        // The only on-topic chunk says "defrost", never "defog"; the top hit
        // itself has no synonym at all.
        let candidates = vec![
            hit("car.pdf", 2, "Climate control overview.", 0.9),
            hit("car.pdf", 31, "Press the defrost button to clear the windshield.", 0.5),
            hit("car.pdf", 80, "Tire rotation schedule.", 0.48),
        ];
        let context = select_context("How do I defog the windshield?", candidates);
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].page, 31);

        let cited = citations(&context);
        assert!(!cited.is_empty());
        assert_eq!(cited[0].page, 31);
    }

    #[test]
    fn test_citations_deduplicate_in_first_seen_order() {
        let hits = vec![
            hit("A.pdf", 7, "x", 0.9),
            hit("A.pdf", 7, "y", 0.8),
            hit("A.pdf", 2, "z", 0.7),
        ];
        let cited = citations(&hits);
        assert_eq!(cited.len(), 2);
        assert_eq!((cited[0].filename.as_str(), cited[0].page), ("A.pdf", 7));
        assert_eq!((cited[1].filename.as_str(), cited[1].page), ("A.pdf", 2));
    }

    #[test]
    fn test_citations_capped_at_three() {
        let hits: Vec<SearchHit> = (1..=5u32)
            .map(|page| hit("A.pdf", page, "x", 0.9))
            .collect();
        assert_eq!(citations(&hits).len(), 3);
    }
}
