//! Loading the template registry from disk.
//!
//! A template file is named `<key>.template.<ext>`, for example
//! `h1.template.html` or `codeblock.template.htm`. The key is lowercased.
//! Only the top level of the template directory is read.

use std::fs;
use std::path::Path;

use stencil_renderer::TemplateRegistry;

use crate::error::TemplateLoadError;

/// Marker between key and extension in template file names.
const TEMPLATE_MARKER: &str = ".template.";

/// Extract the registry key from a template file name.
///
/// Returns `None` for names that do not follow `<key>.template.<ext>`.
#[must_use]
pub fn template_key(file_name: &str) -> Option<String> {
    let (key, ext) = file_name.split_once(TEMPLATE_MARKER)?;
    if key.is_empty() || ext.is_empty() || key.starts_with('.') {
        return None;
    }
    Some(key.to_lowercase())
}

/// Whether `path` names a template file.
#[must_use]
pub fn is_template_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(template_key)
        .is_some()
}

/// Load all templates directly inside `dir`.
///
/// A missing directory yields an empty registry, so every element uses its
/// default markup.
///
/// # Errors
///
/// Returns an error if the directory or a template file cannot be read.
pub fn load_templates(dir: &Path) -> Result<TemplateRegistry, TemplateLoadError> {
    let io_error = |source| TemplateLoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "Template directory not found, using defaults");
        return Ok(TemplateRegistry::new());
    }

    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(io_error)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| {
            let key = template_key(entry.file_name().to_str()?)?;
            Some((key, entry.path()))
        })
        .collect();
    // Stable order so duplicate keys resolve the same way on every load
    entries.sort_by(|a, b| a.1.cmp(&b.1));

    let mut registry = TemplateRegistry::new();
    for (key, path) in entries {
        let template = fs::read_to_string(&path)
            .map_err(|source| TemplateLoadError::Io { path, source })?;
        registry = registry.with_template(&key, template);
    }

    let mut keys: Vec<&str> = registry.keys().collect();
    keys.sort_unstable();
    tracing::debug!(dir = %dir.display(), count = registry.len(), ?keys, "Loaded templates");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_template_key() {
        assert_eq!(template_key("h1.template.html"), Some("h1".to_owned()));
        assert_eq!(template_key("CodeBlock.template.htm"), Some("codeblock".to_owned()));
        assert_eq!(template_key("p.template.html.bak"), Some("p".to_owned()));
        assert_eq!(template_key("h1.html"), None);
        assert_eq!(template_key(".template.html"), None);
        assert_eq!(template_key("h1.template."), None);
        assert_eq!(template_key(".h1.template.html"), None);
    }

    #[test]
    fn test_is_template_file() {
        assert!(is_template_file(Path::new("/t/h2.template.html")));
        assert!(!is_template_file(Path::new("/t/readme.md")));
    }

    #[test]
    fn test_load_templates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("H1.template.html"), "<h1>{{ h1 }}</h1>").unwrap();
        fs::write(dir.path().join("p.template.html"), "<p>{{ p }}</p>").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/h2.template.html"), "ignored").unwrap();

        let registry = load_templates(dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("h1"), Some("<h1>{{ h1 }}</h1>"));
        assert_eq!(registry.get("p"), Some("<p>{{ p }}</p>"));
        assert_eq!(registry.get("h2"), None);

        let mut keys: Vec<&str> = registry.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["h1", "p"]);
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load_templates(&dir.path().join("missing")).unwrap();
        assert!(registry.is_empty());
    }
}
