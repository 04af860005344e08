//! Template registry.

use std::collections::HashMap;

/// Key of the fenced code block template.
pub const CODEBLOCK_KEY: &str = "codeblock";

/// Read-only mapping from a lowercase element key to a template string.
///
/// Keys are element names such as `h1`…`h6`, `p` or [`CODEBLOCK_KEY`].
/// A registry is built once and then shared immutably (typically behind an
/// `Arc`); reloading templates produces a new registry rather than mutating
/// the current one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateRegistry {
    templates: HashMap<String, String>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, normalizing the key to lowercase.
    ///
    /// A later template for the same key replaces the earlier one.
    #[must_use]
    pub fn with_template(mut self, key: &str, template: impl Into<String>) -> Self {
        self.templates.insert(key.to_lowercase(), template.into());
        self
    }

    /// Look up the template for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no templates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterate over registered keys in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for TemplateRegistry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |registry, (key, template)| {
                registry.with_template(key.as_ref(), template)
            })
    }
}
