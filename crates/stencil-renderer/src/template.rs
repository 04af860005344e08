//! Placeholder substitution for element templates.
//!
//! Templates contain two placeholder forms:
//! - `{{ name }}` - replaced with the HTML-escaped value
//! - `{{{ name }}}` - replaced with the value verbatim, but only when the
//!   caller declared `name` raw in the [`RenderContext`]
//!
//! Rawness is decided at the call site, never by the template. A triple-brace
//! placeholder for a value that was not declared raw gets no special
//! treatment: its inner `{{ name }}` is substituted escaped and the outer
//! braces stay in the output.
//!
//! Substitution is a single left-to-right scan. Inserted values are never
//! scanned again, so a value containing `{{ other }}` is emitted literally.

use crate::escape::escape_html;
use crate::registry::TemplateRegistry;

/// How a context value is inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotKind {
    /// Plain text, escaped on insertion.
    Text,
    /// Markup whose text content was already escaped by the inline renderer.
    Markup,
    /// Declared raw: verbatim at `{{{ name }}}`, escaped at `{{ name }}`.
    Raw,
}

#[derive(Clone, Debug)]
struct Slot {
    name: String,
    value: String,
    kind: SlotKind,
}

/// Named values available to a single template render.
///
/// Built per block instance and discarded afterwards.
#[derive(Clone, Debug, Default)]
pub struct RenderContext {
    slots: Vec<Slot>,
}

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain-text value, escaped wherever it is inserted.
    #[must_use]
    pub fn text(self, name: &str, value: impl Into<String>) -> Self {
        self.with_slot(name, value.into(), SlotKind::Text)
    }

    /// Add an inline HTML fragment produced by the inline renderer.
    ///
    /// The fragment's text is already escaped, so it is inserted at
    /// `{{ name }}` without escaping it a second time.
    #[must_use]
    pub fn markup(self, name: &str, value: impl Into<String>) -> Self {
        self.with_slot(name, value.into(), SlotKind::Markup)
    }

    /// Add a value declared raw for this render.
    #[must_use]
    pub fn raw(self, name: &str, value: impl Into<String>) -> Self {
        self.with_slot(name, value.into(), SlotKind::Raw)
    }

    fn with_slot(mut self, name: &str, value: String, kind: SlotKind) -> Self {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.name == name) {
            slot.value = value;
            slot.kind = kind;
        } else {
            self.slots.push(Slot {
                name: name.to_owned(),
                value,
                kind,
            });
        }
        self
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }
}

/// Result of substituting a context into a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    /// Template with placeholders replaced.
    pub html: String,
    /// Context names that never matched a placeholder.
    pub missing: Vec<String>,
}

/// Substitute context values into `template`.
///
/// Unknown placeholders are left as-is. Values whose placeholder does not
/// appear in the template are reported in [`Substitution::missing`].
#[must_use]
pub fn substitute(template: &str, ctx: &RenderContext) -> Substitution {
    let mut html = String::with_capacity(template.len());
    let mut used = vec![false; ctx.slots.len()];
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        html.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some((len, index, replacement)) = match_placeholder(tail, ctx) {
            used[index] = true;
            html.push_str(&replacement);
            rest = &tail[len..];
        } else {
            // Not a placeholder we own; keep one brace and rescan after it.
            html.push('{');
            rest = &tail[1..];
        }
    }
    html.push_str(rest);

    let missing = ctx
        .slots
        .iter()
        .zip(used)
        .filter(|(_, used)| !used)
        .map(|(slot, _)| slot.name.clone())
        .collect();

    Substitution { html, missing }
}

/// Match a placeholder at the start of `tail`.
///
/// Returns the consumed length, the slot index and the replacement text.
fn match_placeholder(tail: &str, ctx: &RenderContext) -> Option<(usize, usize, String)> {
    if let Some(inner) = tail.strip_prefix("{{{") {
        let close = inner.find("}}}")?;
        let index = ctx.position(placeholder_name(&inner[..close])?)?;
        let slot = &ctx.slots[index];
        // Triple braces only inject values the caller declared raw.
        return (slot.kind == SlotKind::Raw).then(|| (close + 6, index, slot.value.clone()));
    }

    let inner = tail.strip_prefix("{{")?;
    let close = inner.find("}}")?;
    let index = ctx.position(placeholder_name(&inner[..close])?)?;
    let slot = &ctx.slots[index];
    let replacement = match slot.kind {
        SlotKind::Markup => slot.value.clone(),
        SlotKind::Text | SlotKind::Raw => escape_html(&slot.value),
    };
    Some((close + 4, index, replacement))
}

/// Validate the text between braces as a placeholder name.
fn placeholder_name(inner: &str) -> Option<&str> {
    let name = inner.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(name)
}

/// Applies registry templates to element content.
pub struct TemplateEngine<'a> {
    registry: &'a TemplateRegistry,
    verbose: bool,
}

impl<'a> TemplateEngine<'a> {
    /// Create an engine over `registry`.
    ///
    /// With `verbose` set, templates that lack a placeholder for a supplied
    /// value produce a warning. Output is the same either way.
    #[must_use]
    pub fn new(registry: &'a TemplateRegistry, verbose: bool) -> Self {
        Self { registry, verbose }
    }

    /// Render `content` through the template registered for `tag`.
    ///
    /// `content` is an inline HTML fragment whose text is already escaped.
    /// It replaces `{{ tag }}`. Without a template the result is
    /// `<tag>content</tag>`.
    #[must_use]
    pub fn apply_template(&self, tag: &str, content: &str) -> String {
        let ctx = RenderContext::new().markup(tag, content);
        self.apply_template_with_raw(tag, &ctx)
            .unwrap_or_else(|| format!("<{tag}>{content}</{tag}>"))
    }

    /// Render `ctx` through the template registered for `key`.
    ///
    /// Returns `None` when no template is registered; the fallback markup
    /// depends on the element, so the caller provides it.
    #[must_use]
    pub fn apply_template_with_raw(&self, key: &str, ctx: &RenderContext) -> Option<String> {
        let template = self.registry.get(key)?;
        let Substitution { html, missing } = substitute(template, ctx);

        if self.verbose {
            for name in &missing {
                tracing::warn!(template = key, placeholder = %name, "Template has no placeholder for value");
            }
        }

        Some(html)
    }
}
