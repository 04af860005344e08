//! Syntax highlighting for fenced code blocks.
//!
//! The renderer talks to highlighters through the [`Highlighter`] trait so
//! the highlighting engine can be swapped (or stubbed in tests). The default
//! [`SyntectHighlighter`] emits `<span>` elements with `hljs-`-prefixed
//! classes.

use std::sync::LazyLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Error returned when a highlighter fails on a particular input.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    /// The language is not known to the highlighter.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    /// The highlighting engine failed while processing the code.
    #[error("highlighting failed: {0}")]
    Engine(String),
}

/// Source of highlighted markup for code blocks.
///
/// Implementations must be shareable across builds, hence the `Send + Sync`
/// bound.
pub trait Highlighter: Send + Sync {
    /// Whether `language` can be highlighted.
    fn is_language_known(&self, language: &str) -> bool;

    /// Highlight `code` as `language`, returning HTML markup.
    ///
    /// The returned markup must already be escaped where it contains source
    /// text; it is injected into the output verbatim.
    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError>;
}

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Highlighter backed by syntect's bundled syntax definitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
        let syntax_set: &'static SyntaxSet = &SYNTAX_SET;
        syntax_set
            .find_syntax_by_token(language)
            .or_else(|| syntax_set.find_syntax_by_token(&language.to_lowercase()))
    }
}

impl Highlighter for SyntectHighlighter {
    fn is_language_known(&self, language: &str) -> bool {
        !language.is_empty() && Self::find_syntax(language).is_some()
    }

    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError> {
        let syntax = Self::find_syntax(language)
            .ok_or_else(|| HighlightError::UnsupportedLanguage(language.to_owned()))?;

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &SYNTAX_SET,
            ClassStyle::SpacedPrefixed { prefix: "hljs-" },
        );
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|e| HighlightError::Engine(e.to_string()))?;
        }
        Ok(generator.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_languages() {
        let highlighter = SyntectHighlighter::new();
        assert!(highlighter.is_language_known("rust"));
        assert!(highlighter.is_language_known("rs"));
        assert!(highlighter.is_language_known("Python"));
        assert!(!highlighter.is_language_known("definitely-not-a-language"));
        assert!(!highlighter.is_language_known(""));
    }

    #[test]
    fn test_highlight_produces_prefixed_spans() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter.highlight("fn main() {}\n", "rust").unwrap();
        assert!(html.contains("<span class=\"hljs-"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_highlight_escapes_source_text() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter
            .highlight("let s = \"<b>\";\n", "rust")
            .unwrap();
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_highlight_unknown_language_errors() {
        let highlighter = SyntectHighlighter::new();
        let err = highlighter.highlight("x", "nope").unwrap_err();
        assert!(matches!(err, HighlightError::UnsupportedLanguage(lang) if lang == "nope"));
    }
}
