//! Heading id generation.

use std::sync::LazyLock;

use regex::Regex;

/// Runs of characters that are neither ASCII word characters nor CJK ideographs.
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\x{4e00}-\x{9fa5}]+").expect("valid regex"));

/// Convert text to a URL-safe slug.
///
/// Lowercases and trims the input, then replaces every run of characters
/// outside `[A-Za-z0-9_]` and the CJK Unified Ideographs range with a single
/// hyphen. Leading and trailing hyphens are stripped.
///
/// The result is stable under repeated application. Identical input text
/// always yields the identical slug; callers that need unique ids must
/// de-duplicate themselves.
///
/// # Examples
///
/// ```
/// use stencil_renderer::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("安装 Guide"), "安装-guide");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced = SEPARATOR_RUN.replace_all(lowered.trim(), "-");
    replaced.trim_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "what-s-new");
        assert_eq!(slugify("  Spaces  "), "spaces");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("kebab--case"), "kebab-case");
        assert_eq!(slugify("snake_case"), "snake_case");
    }

    #[test]
    fn test_slugify_preserves_cjk() {
        assert_eq!(slugify("快速 开始"), "快速-开始");
        assert_eq!(slugify("第1章：简介"), "第1章-简介");
    }

    #[test]
    fn test_slugify_strips_edge_separators() {
        assert_eq!(slugify("--Intro--"), "intro");
        assert_eq!(slugify("¿Qué?"), "qu");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_idempotent() {
        for input in [
            "Hello World",
            "  Mixed CASE & symbols!! ",
            "快速 开始 Guide",
            "a--b__c",
            "Ünïcödé Tëxt",
        ] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input: {input:?}");
        }
    }
}
