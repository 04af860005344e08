//! Document-wide footnote numbering.
//!
//! pulldown-cmark numbers footnotes per HTML writer. The walker renders a
//! document through many writers, so numbers are assigned here instead and
//! footnote markup is emitted pre-rendered.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::{CowStr, Event};
use pulldown_cmark_escape::escape_html;

/// Footnote numbers in order of first appearance, by reference or definition.
#[derive(Debug, Default)]
pub(crate) struct FootnoteNumbers {
    numbers: HashMap<String, usize>,
}

impl FootnoteNumbers {
    fn number(&mut self, name: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(name.to_owned()).or_insert(next)
    }

    /// Replace a footnote reference with its numbered markup.
    ///
    /// Other events are returned unchanged.
    pub fn resolve<'a>(&mut self, event: Event<'a>) -> Event<'a> {
        let Event::FootnoteReference(name) = event else {
            return event;
        };
        let mut html = String::from(r##"<sup class="footnote-reference"><a href="#"##);
        escape_html(&mut html, &name).unwrap();
        write!(html, r#"">{}</a></sup>"#, self.number(&name)).unwrap();
        Event::InlineHtml(CowStr::from(html))
    }

    /// Opening markup of the definition of footnote `name`.
    pub fn definition_open(&mut self, name: &str) -> String {
        let mut html = String::from(r#"<div class="footnote-definition" id=""#);
        escape_html(&mut html, name).unwrap();
        write!(
            html,
            r#""><sup class="footnote-definition-label">{}</sup>"#,
            self.number(name)
        )
        .unwrap();
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numbers_follow_first_appearance() {
        let mut footnotes = FootnoteNumbers::default();
        assert_eq!(
            footnotes.resolve(Event::FootnoteReference("b".into())),
            Event::InlineHtml(
                r##"<sup class="footnote-reference"><a href="#b">1</a></sup>"##.into()
            )
        );
        assert_eq!(
            footnotes.definition_open("a"),
            r#"<div class="footnote-definition" id="a"><sup class="footnote-definition-label">2</sup>"#
        );
        assert_eq!(
            footnotes.definition_open("b"),
            r#"<div class="footnote-definition" id="b"><sup class="footnote-definition-label">1</sup>"#
        );
    }

    #[test]
    fn test_names_are_escaped() {
        let mut footnotes = FootnoteNumbers::default();
        let Event::InlineHtml(html) = footnotes.resolve(Event::FootnoteReference("a\"b".into()))
        else {
            panic!("expected inline html");
        };
        assert!(html.contains(r##"href="#a&quot;b""##));
    }

    #[test]
    fn test_other_events_unchanged() {
        let mut footnotes = FootnoteNumbers::default();
        assert_eq!(
            footnotes.resolve(Event::Text("x".into())),
            Event::Text("x".into())
        );
    }
}
