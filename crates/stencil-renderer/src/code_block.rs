//! Fenced code block rendering.

use std::fmt::Write;

use crate::escape::escape_html;
use crate::highlight::Highlighter;
use crate::registry::CODEBLOCK_KEY;
use crate::template::{RenderContext, TemplateEngine};

/// Language used when a block declares none or an unsupported one.
pub const FALLBACK_LANGUAGE: &str = "text";

/// Extract the language from a fence info string.
///
/// Only the first whitespace-delimited token is the language; anything after
/// it (attributes, titles) is ignored. Returns `None` for an empty info string.
#[must_use]
pub fn fence_language(info: &str) -> Option<&str> {
    info.split_whitespace().next()
}

/// Body of a code block after the highlighting attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CodeBody {
    language: String,
    markup: String,
    is_supported: bool,
}

/// Renders fenced code blocks through the `codeblock` template.
pub struct CodeBlockRenderer<'a> {
    engine: &'a TemplateEngine<'a>,
    highlighter: &'a dyn Highlighter,
    verbose: bool,
}

impl<'a> CodeBlockRenderer<'a> {
    #[must_use]
    pub fn new(
        engine: &'a TemplateEngine<'a>,
        highlighter: &'a dyn Highlighter,
        verbose: bool,
    ) -> Self {
        Self {
            engine,
            highlighter,
            verbose,
        }
    }

    /// Render one fenced block with info string `info` and content `code`.
    ///
    /// The template receives `lang` (escaped), `code` (raw: highlighted or
    /// escaped markup) and `raw` (the original code, escaped). Without a
    /// `codeblock` template the block is wrapped in
    /// `<pre><code class="hljs">`, with a `language-*` class only when the
    /// language was highlighted.
    #[must_use]
    pub fn render(&self, info: &str, code: &str) -> String {
        let body = self.highlight(fence_language(info), code);

        let ctx = RenderContext::new()
            .text("lang", body.language.as_str())
            .raw("code", body.markup.as_str())
            .text("raw", code);

        self.engine
            .apply_template_with_raw(CODEBLOCK_KEY, &ctx)
            .unwrap_or_else(|| default_code_block(&body))
    }

    fn highlight(&self, language: Option<&str>, code: &str) -> CodeBody {
        if let Some(language) = language
            && self.highlighter.is_language_known(language)
        {
            match self.highlighter.highlight(code, language) {
                Ok(markup) => {
                    return CodeBody {
                        language: language.to_owned(),
                        markup,
                        is_supported: true,
                    };
                }
                Err(e) if self.verbose => {
                    tracing::warn!(language, error = %e, "Highlighting failed, rendering plain code");
                }
                Err(e) => {
                    tracing::debug!(language, error = %e, "Highlighting failed, rendering plain code");
                }
            }
        }

        CodeBody {
            language: FALLBACK_LANGUAGE.to_owned(),
            markup: escape_html(code),
            is_supported: false,
        }
    }
}

fn default_code_block(body: &CodeBody) -> String {
    let mut out = String::from(r#"<pre><code class="hljs"#);
    if body.is_supported {
        write!(out, " language-{}", escape_html(&body.language)).unwrap();
    }
    write!(out, r#"">{}</code></pre>"#, body.markup).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::HighlightError;
    use crate::registry::TemplateRegistry;
    use pretty_assertions::assert_eq;

    /// Highlighter that knows `demo`, wraps code in `<mark>`, and fails on `broken`.
    struct StubHighlighter;

    impl Highlighter for StubHighlighter {
        fn is_language_known(&self, language: &str) -> bool {
            matches!(language, "demo" | "broken")
        }

        fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError> {
            if language == "broken" {
                return Err(HighlightError::Engine("boom".to_owned()));
            }
            Ok(format!("<mark>{}</mark>", escape_html(code)))
        }
    }

    fn render(registry: &TemplateRegistry, info: &str, code: &str) -> String {
        let engine = TemplateEngine::new(registry, false);
        CodeBlockRenderer::new(&engine, &StubHighlighter, false).render(info, code)
    }

    #[test]
    fn test_fence_language_takes_first_token() {
        assert_eq!(fence_language("rust"), Some("rust"));
        assert_eq!(fence_language("rust title=\"main.rs\" {.numbered}"), Some("rust"));
        assert_eq!(fence_language("  python  "), Some("python"));
        assert_eq!(fence_language(""), None);
        assert_eq!(fence_language("   "), None);
    }

    #[test]
    fn test_supported_language_default_wrapper() {
        let html = render(&TemplateRegistry::new(), "demo", "a < b");
        assert_eq!(
            html,
            r#"<pre><code class="hljs language-demo"><mark>a &lt; b</mark></code></pre>"#
        );
    }

    #[test]
    fn test_unsupported_language_falls_back_to_text() {
        let registry = TemplateRegistry::new().with_template("codeblock", "{{ lang }}");
        assert_eq!(render(&registry, "klingon", "x"), "text");

        let html = render(&TemplateRegistry::new(), "klingon", "<script>");
        assert_eq!(
            html,
            r#"<pre><code class="hljs">&lt;script&gt;</code></pre>"#
        );
    }

    #[test]
    fn test_missing_language_falls_back_to_text() {
        let html = render(&TemplateRegistry::new(), "", "<script>alert(1)</script>");
        assert_eq!(
            html,
            r#"<pre><code class="hljs">&lt;script&gt;alert(1)&lt;/script&gt;</code></pre>"#
        );
        assert!(!html.contains("language-"));
    }

    #[test]
    fn test_highlighter_error_degrades_to_escaped_code() {
        let html = render(&TemplateRegistry::new(), "broken", "<b>");
        assert_eq!(html, r#"<pre><code class="hljs">&lt;b&gt;</code></pre>"#);
    }

    #[test]
    fn test_template_gets_raw_code_and_escaped_source() {
        let registry = TemplateRegistry::new().with_template(
            "codeblock",
            r#"<figure data-lang="{{ lang }}">{{{ code }}}<textarea>{{ raw }}</textarea></figure>"#,
        );
        let html = render(&registry, "demo extra tokens", "x && y");
        assert_eq!(
            html,
            r#"<figure data-lang="demo"><mark>x &amp;&amp; y</mark><textarea>x &amp;&amp; y</textarea></figure>"#
        );
    }

    #[test]
    fn test_code_in_double_braces_is_escaped() {
        let registry = TemplateRegistry::new().with_template("codeblock", "{{ code }}");
        assert_eq!(
            render(&registry, "demo", "1"),
            "&lt;mark&gt;1&lt;/mark&gt;"
        );
    }
}
