//! Template-driven markdown to HTML renderer.
//!
//! Documents are tokenized with pulldown-cmark and walked block by block.
//! Headings, paragraphs and fenced code blocks are rendered through
//! user-supplied templates from a [`TemplateRegistry`]; everything else uses
//! pulldown-cmark's own HTML output.
//!
//! # Templates
//!
//! | Key | Values |
//! |-----|--------|
//! | `h1`…`h6` | `{{ hN }}` inline HTML, `{{ id }}` explicit `{#id}` or slug of the heading text, `{{ class }}` explicit `.class` names |
//! | `p` | `{{ p }}` inline HTML |
//! | `codeblock` | `{{ lang }}`, `{{{ code }}}` highlighted markup, `{{ raw }}` source |
//!
//! A missing template falls back to plain markup: `<hN>…</hN>` (with any
//! explicit attributes), `<p>…</p>` or
//! `<pre><code class="hljs language-…">…</code></pre>`.
//!
//! # Example
//!
//! ```
//! use stencil_renderer::{RenderOptions, SyntectHighlighter, TemplateRegistry, render};
//!
//! let registry = TemplateRegistry::new()
//!     .with_template("p", r#"<p class="lead">{{ p }}</p>"#);
//! let html = render("Hello **world**", &registry, &SyntectHighlighter, &RenderOptions::default());
//! assert_eq!(html, "<p class=\"lead\">Hello <strong>world</strong></p>\n");
//! ```

mod code_block;
mod escape;
mod footnote;
mod highlight;
mod registry;
mod renderer;
mod slug;
mod template;
mod token;

pub use code_block::{CodeBlockRenderer, FALLBACK_LANGUAGE, fence_language};
pub use escape::escape_html;
pub use highlight::{HighlightError, Highlighter, SyntectHighlighter};
pub use registry::{CODEBLOCK_KEY, TemplateRegistry};
pub use renderer::{BlockWalker, RenderOptions, parser_options, render};
pub use slug::slugify;
pub use template::{RenderContext, Substitution, TemplateEngine, substitute};
pub use token::{HeadingAttrs, Token, tokenize};
