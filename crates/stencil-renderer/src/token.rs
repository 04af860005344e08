//! Block-level token stream built from pulldown-cmark events.
//!
//! Headings and paragraphs become `open, inline, close` triples and fenced
//! code blocks collapse into a single [`Token::Fence`]. Everything else is
//! carried through unchanged as [`Token::Other`].

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Tag, TagEnd};

/// Explicit `{#id .class key=value}` attributes of a heading.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadingAttrs<'a> {
    pub id: Option<CowStr<'a>>,
    pub classes: Vec<CowStr<'a>>,
    pub attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
}

/// One block-level unit of a document.
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    HeadingOpen(HeadingLevel, HeadingAttrs<'a>),
    HeadingClose(HeadingLevel),
    ParagraphOpen,
    ParagraphClose,
    /// Inline content of the preceding heading or paragraph.
    Inline(Vec<Event<'a>>),
    /// Fenced code block with its info string and literal content.
    Fence { info: CowStr<'a>, content: String },
    /// Any other event, rendered by the tokenizer's default renderer.
    Other(Event<'a>),
}

impl<'a> Token<'a> {
    /// Convert back into the events the tokenizer produced for this token.
    pub fn into_events(self) -> Vec<Event<'a>> {
        match self {
            Token::HeadingOpen(level, HeadingAttrs { id, classes, attrs }) => {
                vec![Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                })]
            }
            Token::HeadingClose(level) => vec![Event::End(TagEnd::Heading(level))],
            Token::ParagraphOpen => vec![Event::Start(Tag::Paragraph)],
            Token::ParagraphClose => vec![Event::End(TagEnd::Paragraph)],
            Token::Inline(events) => events,
            Token::Fence { info, content } => vec![
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))),
                Event::Text(content.into()),
                Event::End(TagEnd::CodeBlock),
            ],
            Token::Other(event) => vec![event],
        }
    }
}

/// Group an event stream into block tokens.
pub fn tokenize<'a, I>(events: I) -> Vec<Token<'a>>
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut tokens = Vec::new();
    let mut events = events.into_iter();

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                tokens.push(Token::HeadingOpen(level, HeadingAttrs { id, classes, attrs }));
                let (inline, closed) =
                    collect_inline(&mut events, |end| matches!(end, TagEnd::Heading(_)));
                tokens.push(Token::Inline(inline));
                if closed {
                    tokens.push(Token::HeadingClose(level));
                }
            }
            Event::Start(Tag::Paragraph) => {
                tokens.push(Token::ParagraphOpen);
                let (inline, closed) =
                    collect_inline(&mut events, |end| matches!(end, TagEnd::Paragraph));
                tokens.push(Token::Inline(inline));
                if closed {
                    tokens.push(Token::ParagraphClose);
                }
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let mut content = String::new();
                for event in events.by_ref() {
                    match event {
                        Event::Text(text) => content.push_str(&text),
                        Event::End(TagEnd::CodeBlock) => break,
                        _ => {}
                    }
                }
                tokens.push(Token::Fence { info, content });
            }
            other => tokens.push(Token::Other(other)),
        }
    }

    tokens
}

/// Collect events up to the closing tag matched by `is_end`.
///
/// Returns the inline events and whether the closing tag was seen.
fn collect_inline<'a>(
    events: &mut impl Iterator<Item = Event<'a>>,
    is_end: impl Fn(&TagEnd) -> bool,
) -> (Vec<Event<'a>>, bool) {
    let mut inline = Vec::new();
    for event in events.by_ref() {
        if let Event::End(end) = &event
            && is_end(end)
        {
            return (inline, true);
        }
        inline.push(event);
    }
    (inline, false)
}
