//! Block dispatch over the token stream.

use std::collections::VecDeque;

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::code_block::CodeBlockRenderer;
use crate::footnote::FootnoteNumbers;
use crate::highlight::Highlighter;
use crate::registry::TemplateRegistry;
use crate::slug::slugify;
use crate::template::{RenderContext, TemplateEngine};
use crate::token::{HeadingAttrs, Token, tokenize};

/// Options controlling a single render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Log advisory diagnostics (missing placeholders, failed highlighting).
    pub verbose: bool,
    /// Pass raw HTML in the source through unchanged. When disabled, raw
    /// HTML is rendered as escaped text.
    pub allow_raw_html: bool,
}

/// Parser options for document tokenization.
#[must_use]
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// Render a markdown document to HTML using `registry` templates.
///
/// Output is deterministic: the same document, registry and options always
/// produce byte-identical HTML.
///
/// # Example
///
/// ```
/// use stencil_renderer::{RenderOptions, SyntectHighlighter, TemplateRegistry, render};
///
/// let registry = TemplateRegistry::new()
///     .with_template("h1", r#"<h1 id="{{ id }}">{{ h1 }}</h1>"#);
/// let html = render("# Hello", &registry, &SyntectHighlighter, &RenderOptions::default());
/// assert_eq!(html, "<h1 id=\"hello\">Hello</h1>\n");
/// ```
#[must_use]
pub fn render(
    markdown: &str,
    registry: &TemplateRegistry,
    highlighter: &dyn Highlighter,
    options: &RenderOptions,
) -> String {
    let allow_raw_html = options.allow_raw_html;
    let events = Parser::new_ext(markdown, parser_options()).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) if !allow_raw_html => Event::Text(html),
        other => other,
    });

    BlockWalker::new(registry, highlighter, *options).walk(tokenize(events))
}

/// Block kinds that are rendered through templates.
#[derive(Clone, Debug, PartialEq)]
enum TemplatedBlock<'a> {
    Heading(HeadingLevel, HeadingAttrs<'a>),
    Paragraph,
}

impl<'a> TemplatedBlock<'a> {
    fn open_token(self) -> Token<'a> {
        match self {
            Self::Heading(level, attrs) => Token::HeadingOpen(level, attrs),
            Self::Paragraph => Token::ParagraphOpen,
        }
    }

    fn closes(&self, token: &Token<'_>) -> bool {
        match (self, token) {
            (Self::Heading(level, _), Token::HeadingClose(close)) => level == close,
            (Self::Paragraph, Token::ParagraphClose) => true,
            _ => false,
        }
    }
}

/// Single left-to-right pass over block tokens.
///
/// Headings and paragraphs are consumed as `open, inline, close` triples and
/// rendered through templates; fences go to the code block renderer. Every
/// other token is handed to pulldown-cmark's HTML writer. Consecutive
/// pass-through tokens are written in one batch so multi-event constructs
/// such as tables render exactly as the tokenizer would render them.
/// Footnotes are numbered once for the whole walk.
///
/// An open token that is not followed by an inline token and its matching
/// close gets default rendering on its own, and the walk resumes with the
/// next token.
pub struct BlockWalker<'a> {
    registry: &'a TemplateRegistry,
    highlighter: &'a dyn Highlighter,
    options: RenderOptions,
}

impl<'a> BlockWalker<'a> {
    #[must_use]
    pub fn new(
        registry: &'a TemplateRegistry,
        highlighter: &'a dyn Highlighter,
        options: RenderOptions,
    ) -> Self {
        Self {
            registry,
            highlighter,
            options,
        }
    }

    /// Render `tokens` to HTML.
    #[must_use]
    pub fn walk(&self, tokens: Vec<Token<'_>>) -> String {
        let engine = TemplateEngine::new(self.registry, self.options.verbose);
        let code_blocks = CodeBlockRenderer::new(&engine, self.highlighter, self.options.verbose);
        let mut footnotes = FootnoteNumbers::default();

        let mut output = String::with_capacity(4096);
        let mut passthrough: Vec<Event<'_>> = Vec::new();
        let mut tokens: VecDeque<Token<'_>> = tokens.into();

        while let Some(token) = tokens.pop_front() {
            let block = match token {
                Token::HeadingOpen(level, attrs) => TemplatedBlock::Heading(level, attrs),
                Token::ParagraphOpen => TemplatedBlock::Paragraph,
                Token::Fence { info, content } => {
                    flush(&mut output, &mut passthrough);
                    push_block(&mut output, &code_blocks.render(&info, &content));
                    continue;
                }
                Token::Other(Event::Start(Tag::FootnoteDefinition(name))) => {
                    flush(&mut output, &mut passthrough);
                    if !output.is_empty() && !output.ends_with('\n') {
                        output.push('\n');
                    }
                    output.push_str(&footnotes.definition_open(&name));
                    continue;
                }
                other => {
                    passthrough.extend(other.into_events().into_iter().map(|e| footnotes.resolve(e)));
                    continue;
                }
            };

            let Some(inline) = take_inline(&mut tokens, &block) else {
                if self.options.verbose {
                    tracing::warn!(?block, "Malformed block, rendering open tag without template");
                }
                passthrough.extend(block.open_token().into_events());
                continue;
            };
            let inline: Vec<Event<'_>> = inline.into_iter().map(|e| footnotes.resolve(e)).collect();

            flush(&mut output, &mut passthrough);
            let fragment = match block {
                TemplatedBlock::Heading(level, attrs) => Self::heading(&engine, level, attrs, &inline),
                TemplatedBlock::Paragraph => engine.apply_template("p", &render_inline(&inline)),
            };
            push_block(&mut output, &fragment);
        }

        flush(&mut output, &mut passthrough);
        output
    }

    /// Render a heading with `hN` (inline HTML), `id` and `class` values.
    ///
    /// `id` is the explicit `{#id}` attribute when present, otherwise the slug
    /// of the heading text.
    fn heading(
        engine: &TemplateEngine<'_>,
        level: HeadingLevel,
        attrs: HeadingAttrs<'_>,
        inline: &[Event<'_>],
    ) -> String {
        let tag = format!("h{}", heading_level_to_num(level));
        let content = render_inline(inline);
        let id = attrs
            .id
            .as_deref()
            .map_or_else(|| slugify(&plain_text(inline)), str::to_owned);
        let ctx = RenderContext::new()
            .markup(&tag, content.as_str())
            .text("id", id)
            .text("class", class_list(&attrs.classes));

        engine
            .apply_template_with_raw(&tag, &ctx)
            .unwrap_or_else(|| default_heading(level, attrs, inline))
    }
}

fn class_list(classes: &[CowStr<'_>]) -> String {
    classes.iter().map(|class| class.as_ref()).collect::<Vec<&str>>().join(" ")
}

/// The tokenizer's own rendering of a heading, explicit attributes included.
fn default_heading(level: HeadingLevel, attrs: HeadingAttrs<'_>, inline: &[Event<'_>]) -> String {
    let events = Token::HeadingOpen(level, attrs)
        .into_events()
        .into_iter()
        .chain(inline.iter().cloned())
        .chain(std::iter::once(Event::End(TagEnd::Heading(level))));
    let mut html = String::new();
    html::push_html(&mut html, events);
    html.truncate(html.trim_end_matches('\n').len());
    html
}

/// Pop the inline and close tokens of `block` if the stream has that shape.
fn take_inline<'a>(tokens: &mut VecDeque<Token<'a>>, block: &TemplatedBlock<'_>) -> Option<Vec<Event<'a>>> {
    let well_formed = matches!(tokens.front(), Some(Token::Inline(_)))
        && tokens.get(1).is_some_and(|close| block.closes(close));
    if !well_formed {
        return None;
    }

    let Some(Token::Inline(inline)) = tokens.pop_front() else {
        return None;
    };
    tokens.pop_front();
    Some(inline)
}

/// Append a block fragment on its own line, as the default writer does.
fn push_block(output: &mut String, fragment: &str) {
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    output.push_str(fragment);
    output.push('\n');
}

fn flush(output: &mut String, passthrough: &mut Vec<Event<'_>>) {
    if passthrough.is_empty() {
        return;
    }
    // An empty text event puts the fresh writer mid-line when the output is.
    let resume = (!output.is_empty() && !output.ends_with('\n')).then(|| Event::Text(CowStr::Borrowed("")));
    html::push_html(output, resume.into_iter().chain(passthrough.drain(..)));
}

fn render_inline(events: &[Event<'_>]) -> String {
    let mut out = String::new();
    html::push_html(&mut out, events.iter().cloned());
    out
}

/// Text content of inline events, used for heading ids.
fn plain_text(events: &[Event<'_>]) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Text(text) | Event::Code(text) => Some(text.as_ref()),
            Event::SoftBreak | Event::HardBreak => Some(" "),
            _ => None,
        })
        .collect()
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
