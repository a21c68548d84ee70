//! Deterministic cleanup of extracted page text
//!
//! Scanned-manual text arrives with OCR artifacts: broken line wraps, `=`
//! padding from table rules, typographic dashes and quotes. `Normalizer`
//! maps raw text to a canonical form; applying it twice is a no-op.

use regex::Regex;

/// Idempotent text normalizer.
pub struct Normalizer {
    hyphen_wrap: Regex,
    trailing_ws: Regex,
    multi_newline: Regex,
    inline_ws: Regex,
    multi_ws: Regex,
}

impl Normalizer {
    /// Compile the rule set.
    pub fn new() -> Self {
        Self {
            hyphen_wrap: Regex::new(r"(\p{L})-[ \t]*\n[ \t]*(\p{L})").expect("Invalid regex"),
            trailing_ws: Regex::new(r"(?m)[ \t]+$").expect("Invalid regex"),
            multi_newline: Regex::new(r"\n{2,}").expect("Invalid regex"),
            inline_ws: Regex::new(r"[^\S\n]+").expect("Invalid regex"),
            multi_ws: Regex::new(r"\s{2,}").expect("Invalid regex"),
        }
    }

    /// Map raw page text to its canonical form.
    pub fn normalize(&self, text: &str) -> String {
        // Rules are ordered; later rules rely on earlier ones having run.
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let text = strip_equals_padding(&text);
        let text = text.replace(['\u{2013}', '\u{2014}'], "-");
        let text = self.hyphen_wrap.replace_all(&text, "${1}${2}");
        let text = self.trailing_ws.replace_all(&text, "");
        let text = self.multi_newline.replace_all(&text, "\n");
        let text = text
            .replace(['\u{2018}', '\u{2019}'], "'")
            .replace(['\u{201C}', '\u{201D}'], "\"");
        let text = self.inline_ws.replace_all(&text, " ");
        let text = self.multi_ws.replace_all(&text, |caps: &regex::Captures| {
            if caps[0].contains('\n') { "\n" } else { " " }
        });
        text.trim().to_string()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop whitespace-separated tokens made entirely of `=`.
fn strip_equals_padding(text: &str) -> String {
    let mut lines = Vec::new();
    for line in text.split('\n') {
        if line.contains('=') {
            let kept: Vec<&str> = line
                .split_whitespace()
                .filter(|token| !token.chars().all(|c| c == '='))
                .collect();
            lines.push(kept.join(" "));
        } else {
            lines.push(line.to_string());
        }
    }
    lines.join("\n")
}
