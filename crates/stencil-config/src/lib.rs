//! Configuration management for Stencil.
//!
//! Parses `stencil.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Directory settings in `[build]` support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override source document directory.
    pub source_dir: Option<PathBuf>,
    /// Override HTML output directory.
    pub output_dir: Option<PathBuf>,
    /// Override template directory.
    pub template_dir: Option<PathBuf>,
    /// Override raw HTML pass-through.
    pub allow_raw_html: Option<bool>,
    /// Override watch debounce interval.
    pub debounce_ms: Option<u64>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "stencil.toml";

/// Default watch debounce interval in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Upper bound on the debounce interval.
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Rendering configuration.
    pub render: RenderConfig,
    /// Watch configuration.
    pub watch: WatchConfig,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    template_dir: Option<String>,
    extensions: Option<Vec<String>>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Directory containing source documents.
    pub source_dir: PathBuf,
    /// Directory receiving rendered HTML.
    pub output_dir: PathBuf,
    /// Directory containing `<key>.template.<ext>` files.
    pub template_dir: PathBuf,
    /// Document file extensions, without leading dot.
    pub extensions: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::with_base(Path::new("."))
    }
}

impl BuildConfig {
    fn with_base(base: &Path) -> Self {
        Self {
            source_dir: base.join("docs"),
            output_dir: base.join("site"),
            template_dir: base.join("templates"),
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_owned(), "markdown".to_owned()]
}

/// Rendering configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pass raw HTML in documents through unchanged.
    pub allow_raw_html: bool,
}

/// Watch configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a burst of changes triggers a rebuild.
    pub debounce_ms: u64,
    /// Glob patterns (relative to the watched directory) to ignore.
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            ignore: Vec::new(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`build.source_dir`").
        field: String,
        /// Error message (e.g., "${`DOCS_DIR`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `stencil.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(template_dir) = &settings.template_dir {
            self.build_resolved.template_dir.clone_from(template_dir);
        }
        if let Some(allow_raw_html) = settings.allow_raw_html {
            self.render.allow_raw_html = allow_raw_html;
        }
        if let Some(debounce_ms) = settings.debounce_ms {
            self.watch.debounce_ms = debounce_ms;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        Self {
            build: BuildConfigRaw::default(),
            render: RenderConfig::default(),
            watch: WatchConfig::default(),
            build_resolved: BuildConfig::with_base(base),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called by [`Config::load`] after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_build()?;
        self.validate_watch()?;
        Ok(())
    }

    fn validate_build(&self) -> Result<(), ConfigError> {
        let build = &self.build_resolved;

        if build.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "build.extensions cannot be empty".to_owned(),
            ));
        }
        if build.extensions.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "build.extensions cannot contain empty entries".to_owned(),
            ));
        }

        // Rendering into the source tree would feed output back into the watcher
        if build.output_dir == build.source_dir {
            return Err(ConfigError::Validation(
                "build.output_dir must differ from build.source_dir".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_watch(&self) -> Result<(), ConfigError> {
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be greater than 0".to_owned(),
            ));
        }
        if self.watch.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "watch.debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let build = &mut self.build;
        for (value, field) in [
            (&mut build.source_dir, "build.source_dir"),
            (&mut build.output_dir, "build.output_dir"),
            (&mut build.template_dir, "build.template_dir"),
        ] {
            if let Some(raw) = value.as_deref() {
                *value = Some(expand::expand_env(raw, field)?);
            }
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        let extensions = self.build.extensions.as_ref().map_or_else(default_extensions, |exts| {
            exts.iter()
                .map(|ext| ext.trim_start_matches('.').to_owned())
                .collect()
        });

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), "docs"),
            output_dir: resolve(self.build.output_dir.as_deref(), "site"),
            template_dir: resolve(self.build.template_dir.as_deref(), "templates"),
            extensions,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.build_resolved.source_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/test/site"));
        assert_eq!(
            config.build_resolved.template_dir,
            PathBuf::from("/test/templates")
        );
        assert_eq!(config.build_resolved.extensions, vec!["md", "markdown"]);
        assert!(!config.render.allow_raw_html);
        assert_eq!(config.watch.debounce_ms, 100);
        assert!(config.watch.ignore.is_empty());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.watch.debounce_ms, 100);
        assert!(!config.render.allow_raw_html);
    }

    #[test]
    fn test_parse_render_and_watch_config() {
        let toml = r#"
[render]
allow_raw_html = true

[watch]
debounce_ms = 250
ignore = ["drafts/**", "*.tmp"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.render.allow_raw_html);
        assert_eq!(config.watch.debounce_ms, 250);
        assert_eq!(config.watch.ignore, vec!["drafts/**", "*.tmp"]);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[build]
source_dir = "content"
output_dir = "public"
extensions = [".md", "mdx"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.build_resolved,
            BuildConfig {
                source_dir: PathBuf::from("/project/content"),
                output_dir: PathBuf::from("/project/public"),
                template_dir: PathBuf::from("/project/templates"),
                extensions: vec!["md".to_owned(), "mdx".to_owned()],
            }
        );
    }

    #[test]
    fn test_load_from_file_resolves_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[build]\ntemplate_dir = \"layout\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.build_resolved.template_dir, dir.path().join("layout"));
        assert_eq!(config.build_resolved.source_dir, dir.path().join("docs"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/stencil.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_cli_settings_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[watch]\ndebounce_ms = 500\n").unwrap();

        let settings = CliSettings {
            output_dir: Some(PathBuf::from("/elsewhere")),
            allow_raw_html: Some(true),
            debounce_ms: Some(50),
            ..CliSettings::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();
        assert_eq!(config.build_resolved.output_dir, PathBuf::from("/elsewhere"));
        assert!(config.render.allow_raw_html);
        assert_eq!(config.watch.debounce_ms, 50);
    }

    #[test]
    fn test_validate_rejects_zero_debounce() {
        let mut config = Config::default_with_base(Path::new("/p"));
        config.watch.debounce_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("debounce_ms"));
    }

    #[test]
    fn test_validate_rejects_output_in_source() {
        let mut config = Config::default_with_base(Path::new("/p"));
        config.build_resolved.output_dir = config.build_resolved.source_dir.clone();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_extensions() {
        let mut config = Config::default_with_base(Path::new("/p"));
        config.build_resolved.extensions.clear();
        assert!(config.validate().is_err());
    }
}
