//! Document discovery and output path mirroring.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Whether `path` has one of the document `extensions` (case-insensitive).
#[must_use]
pub fn has_document_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Finds source documents under a directory.
///
/// Hidden files and paths excluded by `.gitignore`/`.ignore` files are
/// skipped, as are any excluded subtrees (typically the output and template
/// directories when they live inside the source directory).
pub struct DocumentScanner {
    source_dir: PathBuf,
    extensions: Vec<String>,
    excluded: Vec<PathBuf>,
}

impl DocumentScanner {
    #[must_use]
    pub fn new(source_dir: PathBuf, extensions: Vec<String>) -> Self {
        Self {
            source_dir,
            extensions,
            excluded: Vec::new(),
        }
    }

    /// Skip everything under `dir`.
    #[must_use]
    pub fn exclude(mut self, dir: PathBuf) -> Self {
        self.excluded.push(dir);
        self
    }

    /// Return all documents, sorted by path.
    ///
    /// Returns an empty Vec if the source directory doesn't exist.
    pub fn scan(&self) -> Vec<PathBuf> {
        if !self.source_dir.is_dir() {
            tracing::warn!(dir = %self.source_dir.display(), "Source directory not found");
            return Vec::new();
        }

        let excluded = self.excluded.clone();
        let walker = WalkBuilder::new(&self.source_dir)
            .require_git(false)
            .filter_entry(move |entry| !excluded.iter().any(|dir| entry.path().starts_with(dir)))
            .build();

        let mut documents: Vec<PathBuf> = walker
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable path");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(ignore::DirEntry::into_path)
            .filter(|path| has_document_extension(path, &self.extensions))
            .collect();

        documents.sort();
        documents
    }
}

/// Mirror a source document path into the output directory as `.html`.
///
/// `docs/guide/intro.md` with source `docs` and output `site` becomes
/// `site/guide/intro.html`. Returns `None` if `document` is not under
/// `source_dir`.
#[must_use]
pub fn output_path(source_dir: &Path, output_dir: &Path, document: &Path) -> Option<PathBuf> {
    let relative = document.strip_prefix(source_dir).ok()?;
    Some(output_dir.join(relative).with_extension("html"))
}
