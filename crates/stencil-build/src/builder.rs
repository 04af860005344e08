//! Batch site builds.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use stencil_config::Config;
use stencil_renderer::{Highlighter, RenderOptions, TemplateRegistry, render};

use crate::discover::{DocumentScanner, output_path};
use crate::error::DocumentError;

/// Resolved inputs for a build.
#[derive(Clone, Debug)]
pub struct BuildSettings {
    /// Directory holding markdown sources.
    pub source_dir: PathBuf,
    /// Directory receiving rendered HTML.
    pub output_dir: PathBuf,
    /// Directory holding `<key>.template.<ext>` files.
    pub template_dir: PathBuf,
    /// Document extensions without leading dot.
    pub extensions: Vec<String>,
    /// Options forwarded to the renderer.
    pub render: RenderOptions,
}

impl BuildSettings {
    /// Build settings from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config, verbose: bool) -> Self {
        let build = &config.build_resolved;
        Self {
            source_dir: build.source_dir.clone(),
            output_dir: build.output_dir.clone(),
            template_dir: build.template_dir.clone(),
            extensions: build.extensions.clone(),
            render: RenderOptions {
                verbose,
                allow_raw_html: config.render.allow_raw_html,
            },
        }
    }
}

/// Outcome of one build pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Documents rendered and written.
    pub succeeded: usize,
    /// Documents that failed to read, render or write.
    pub failed: usize,
    /// Every document the pass attempted, in build order.
    pub documents: Vec<PathBuf>,
}

impl BuildReport {
    /// Whether every document built.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Renders every document under the source directory.
///
/// Cheap to clone; clones share settings and highlighter.
#[derive(Clone)]
pub struct SiteBuilder {
    settings: Arc<BuildSettings>,
    highlighter: Arc<dyn Highlighter>,
}

impl SiteBuilder {
    #[must_use]
    pub fn new(settings: BuildSettings, highlighter: Arc<dyn Highlighter>) -> Self {
        Self {
            settings: Arc::new(settings),
            highlighter,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Documents the next build would process.
    #[must_use]
    pub fn discover(&self) -> Vec<PathBuf> {
        let settings = &self.settings;
        DocumentScanner::new(settings.source_dir.clone(), settings.extensions.clone())
            .exclude(settings.output_dir.clone())
            .exclude(settings.template_dir.clone())
            .scan()
    }

    /// Build all documents with `registry`.
    ///
    /// Per-document failures are logged and counted; they never stop the
    /// remaining documents from building.
    pub async fn build(self, registry: Arc<TemplateRegistry>) -> BuildReport {
        let start = Instant::now();
        let scanner = self.clone();
        let documents = tokio::task::spawn_blocking(move || scanner.discover())
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Document discovery failed");
                Vec::new()
            });
        let mut report = BuildReport::default();

        for path in documents {
            match self.build_document(&path, &registry).await {
                Ok(target) => {
                    report.succeeded += 1;
                    tracing::debug!(source = %path.display(), target = %target.display(), "Built document");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(error = %e, "Failed to build document");
                }
            }
            report.documents.push(path);
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Build finished"
        );
        report
    }

    /// Render one document and write it to its mirrored output path.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the source can't be read, lies outside
    /// the source directory, or the output can't be written.
    pub async fn build_document(
        &self,
        path: &Path,
        registry: &TemplateRegistry,
    ) -> Result<PathBuf, DocumentError> {
        let settings = &self.settings;
        let target = output_path(&settings.source_dir, &settings.output_dir, path)
            .ok_or_else(|| DocumentError::OutsideSource(path.to_path_buf()))?;

        let markdown =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| DocumentError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let html = render(
            &markdown,
            registry,
            self.highlighter.as_ref(),
            &settings.render,
        );

        let write_error = |source| DocumentError::Write {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&target, html).await.map_err(write_error)?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use stencil_renderer::SyntectHighlighter;

    fn settings(root: &Path) -> BuildSettings {
        BuildSettings {
            source_dir: root.join("docs"),
            output_dir: root.join("site"),
            template_dir: root.join("templates"),
            extensions: vec!["md".to_owned()],
            render: RenderOptions::default(),
        }
    }

    fn builder(root: &Path) -> SiteBuilder {
        SiteBuilder::new(settings(root), Arc::new(SyntectHighlighter))
    }

    #[tokio::test]
    async fn test_build_mirrors_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs/guide")).unwrap();
        fs::write(root.join("docs/index.md"), "# Home").unwrap();
        fs::write(root.join("docs/guide/intro.md"), "Hello").unwrap();

        let registry =
            Arc::new(TemplateRegistry::new().with_template("h1", r#"<h1 id="{{ id }}">{{ h1 }}</h1>"#));
        let report = builder(root).build(registry).await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert!(report.is_success());
        assert_eq!(
            fs::read_to_string(root.join("site/index.html")).unwrap(),
            "<h1 id=\"home\">Home</h1>\n"
        );
        assert_eq!(
            fs::read_to_string(root.join("site/guide/intro.html")).unwrap(),
            "<p>Hello</p>\n"
        );
    }

    #[tokio::test]
    async fn test_build_counts_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/a.md"), "a").unwrap();
        fs::write(root.join("docs/b.md"), b"\xff\xfe\x00").unwrap();
        fs::write(root.join("docs/c.md"), "c").unwrap();

        let report = builder(root).build(Arc::new(TemplateRegistry::new())).await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.documents.len(), 3);
        assert!(root.join("site/a.html").exists());
        assert!(!root.join("site/b.html").exists());
        assert!(root.join("site/c.html").exists());
    }

    #[tokio::test]
    async fn test_build_document_outside_source() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let err = builder(root)
            .build_document(&root.join("elsewhere.md"), &TemplateRegistry::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::OutsideSource(_)));
    }

    #[tokio::test]
    async fn test_build_empty_source() {
        let dir = tempfile::tempdir().unwrap();
        let report = builder(dir.path())
            .build(Arc::new(TemplateRegistry::new()))
            .await;
        assert_eq!(report, BuildReport::default());
    }
}
