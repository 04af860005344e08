//! `stencil init` command implementation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Args;
use stencil_config::CONFIG_FILENAME;

use crate::error::CliError;
use crate::output::Output;

const DEFAULT_CONFIG: &str = r#"[build]
source_dir = "docs"
output_dir = "site"
template_dir = "templates"
extensions = ["md", "markdown"]

[render]
allow_raw_html = false

[watch]
debounce_ms = 100
ignore = []
"#;

const DEFAULT_INDEX: &str = "# Welcome

This page was rendered through the templates in `templates/`.

```rust
fn main() {
    println!(\"Hello, Stencil!\");
}
```
";

const PARAGRAPH_TEMPLATE: &str = "<p>{{ p }}</p>\n";

const CODEBLOCK_TEMPLATE: &str = r#"<pre data-lang="{{ lang }}"><code class="hljs">{{{ code }}}</code></pre>
"#;

/// Arguments for the init command.
#[derive(Args)]
pub(crate) struct InitArgs {
    /// Project directory (default: current directory).
    #[arg(default_value = ".")]
    dir: PathBuf,
}

impl InitArgs {
    /// Execute the init command.
    ///
    /// # Errors
    ///
    /// Returns an error if a file or directory can't be created.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let report = scaffold(&self.dir)?;

        for path in &report.created {
            output.info(&format!("Created {}", path.display()));
        }
        for path in &report.skipped {
            output.warning(&format!("Skipped {} (already exists)", path.display()));
        }
        output.success(&format!("Initialized project in {}", self.dir.display()));
        Ok(())
    }
}

/// Files written and left alone by [`scaffold`].
#[derive(Debug, Default)]
pub(crate) struct ScaffoldReport {
    pub created: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

/// Write a starter project into `dir`. Existing files are never overwritten.
pub(crate) fn scaffold(dir: &Path) -> io::Result<ScaffoldReport> {
    let mut files = vec![
        (PathBuf::from(CONFIG_FILENAME), DEFAULT_CONFIG.to_owned()),
        (PathBuf::from("docs/index.md"), DEFAULT_INDEX.to_owned()),
        (
            PathBuf::from("templates/p.template.html"),
            PARAGRAPH_TEMPLATE.to_owned(),
        ),
        (
            PathBuf::from("templates/codeblock.template.html"),
            CODEBLOCK_TEMPLATE.to_owned(),
        ),
    ];
    for level in 1..=6 {
        files.push((
            PathBuf::from(format!("templates/h{level}.template.html")),
            format!("<h{level} id=\"{{{{ id }}}}\">{{{{ h{level} }}}}</h{level}>\n"),
        ));
    }

    let mut report = ScaffoldReport::default();
    for (relative, contents) in files {
        let path = dir.join(relative);
        if path.exists() {
            report.skipped.push(path);
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        report.created.push(path);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scaffold_creates_project() {
        let dir = tempfile::tempdir().unwrap();
        let report = scaffold(dir.path()).unwrap();

        assert_eq!(report.created.len(), 10);
        assert!(report.skipped.is_empty());
        assert!(dir.path().join("stencil.toml").is_file());
        assert!(dir.path().join("docs/index.md").is_file());
        assert_eq!(
            fs::read_to_string(dir.path().join("templates/h2.template.html")).unwrap(),
            "<h2 id=\"{{ id }}\">{{ h2 }}</h2>\n"
        );
    }

    #[test]
    fn test_scaffold_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.md"), "mine").unwrap();

        let report = scaffold(dir.path()).unwrap();

        assert_eq!(report.skipped, vec![dir.path().join("docs/index.md")]);
        assert_eq!(
            fs::read_to_string(dir.path().join("docs/index.md")).unwrap(),
            "mine"
        );
    }

    #[test]
    fn test_scaffolded_config_loads() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path()).unwrap();

        let config =
            stencil_config::Config::load(Some(&dir.path().join(CONFIG_FILENAME)), None).unwrap();
        assert_eq!(config.build_resolved.source_dir, dir.path().join("docs"));
        assert_eq!(config.watch.debounce_ms, 100);
    }

    #[test]
    fn test_scaffolded_codeblock_template_renders_fallback_language() {
        let dir = tempfile::tempdir().unwrap();
        scaffold(dir.path()).unwrap();

        let registry = stencil_build::load_templates(&dir.path().join("templates")).unwrap();
        let html = stencil_renderer::render(
            "```klingon\nx\n```",
            &registry,
            &stencil_renderer::SyntectHighlighter,
            &stencil_renderer::RenderOptions::default(),
        );
        assert!(html.starts_with(r#"<pre data-lang="text"><code class="hljs">x"#));
        assert!(!html.contains("language-"));
    }
}
