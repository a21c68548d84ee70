//! Prompt assembly for grounded and ungrounded answers

use serde::Serialize;

use crate::types::SearchHit;

/// A chat message for the completion backend.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// `system` or `user`
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Fixed instruction constraining the assistant to the supplied excerpts.
const SYSTEM_PROMPT: &str = "\
You answer questions about equipment manuals. Use only the numbered excerpts \
supplied in the user message; do not draw on outside knowledge. After each \
claim, cite its source in the form [filename p.X]. If no excerpts are \
supplied, or none of them answer the question, say that the indexed manuals \
do not cover it.";

/// Build the message sequence for one question, grounded in `context` when
/// it is non-empty.
pub fn build_messages(question: &str, context: &[SearchHit]) -> Vec<ChatMessage> {
    let user = if context.is_empty() {
        format!(
            "No relevant excerpts were found in the indexed manuals.\n\n\
             Question: {question}"
        )
    } else {
        let mut rendered = String::from("Excerpts:\n\n");
        for (i, hit) in context.iter().enumerate() {
            rendered.push_str(&format!(
                "[{}] {} p.{}:\n{}\n\n",
                i + 1,
                hit.filename,
                hit.page,
                hit.text
            ));
        }
        rendered.push_str(&format!("Question: {question}"));
        rendered
    };

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(page: u32, text: &str) -> SearchHit {
        SearchHit {
            doc_id: "manual".to_string(),
            filename: "manual.pdf".to_string(),
            page,
            text: text.to_string(),
            score: 0.8,
        }
    }

    #[test]
    fn test_grounded_prompt_numbers_and_labels_excerpts() {
        let context = vec![hit(3, "Check the oil."), hit(9, "Replace the filter.")];
        let messages = build_messages("How do I service it?", &context);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("[1] manual.pdf p.3:"));
        assert!(messages[1].content.contains("[2] manual.pdf p.9:"));
        assert!(messages[1].content.contains("Question: How do I service it?"));
    }

    #[test]
    fn test_ungrounded_prompt_states_absence() {
        let messages = build_messages("How do I service it?", &[]);
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("No relevant excerpts"));
        assert!(!messages[1].content.contains("[1]"));
    }

    #[test]
    fn test_system_prompt_demands_citations() {
        let messages = build_messages("q", &[]);
        assert!(messages[0].content.contains("[filename p.X]"));
    }
}
