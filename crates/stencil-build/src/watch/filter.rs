//! Decides which filesystem changes trigger a rebuild.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::builder::BuildSettings;
use crate::discover::has_document_extension;
use crate::error::WatchError;
use crate::templates::is_template_file;

/// Qualifying-path predicate for watch events.
///
/// A change qualifies when it is a document under the source directory or a
/// template file directly inside the template directory. Hidden paths, the
/// output directory and source paths matching an ignore glob never qualify.
#[derive(Clone, Debug)]
pub(crate) struct ChangeFilter {
    source_dir: PathBuf,
    template_dir: PathBuf,
    output_dir: PathBuf,
    extensions: Vec<String>,
    ignore: Vec<Pattern>,
}

impl ChangeFilter {
    pub fn new(settings: &BuildSettings, ignore: &[String]) -> Result<Self, WatchError> {
        let ignore = ignore
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| WatchError::IgnorePattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source_dir: canonical(&settings.source_dir),
            template_dir: canonical(&settings.template_dir),
            output_dir: canonical(&settings.output_dir),
            extensions: settings.extensions.clone(),
            ignore,
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Whether the template directory needs its own watch.
    pub fn template_dir_outside_source(&self) -> bool {
        !self.template_dir.starts_with(&self.source_dir)
    }

    pub fn qualifies(&self, path: &Path) -> bool {
        if path.starts_with(&self.output_dir) {
            return false;
        }

        if let Ok(rel_path) = path.strip_prefix(&self.template_dir)
            && rel_path.components().count() == 1
            && !is_hidden(rel_path)
            && is_template_file(path)
        {
            return true;
        }

        let Ok(rel_path) = path.strip_prefix(&self.source_dir) else {
            return false;
        };
        if is_hidden(rel_path) || self.ignore.iter().any(|p| p.matches_path(rel_path)) {
            return false;
        }
        has_document_extension(path, &self.extensions)
    }
}

fn is_hidden(rel_path: &Path) -> bool {
    rel_path.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.')),
        _ => false,
    })
}

/// Resolve symlinks so paths compare equal to what the watcher reports.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
