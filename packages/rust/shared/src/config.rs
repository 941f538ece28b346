//! Application configuration for nbcontent.
//!
//! User config lives at `~/.nbcontent/nbcontent.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NbContentError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nbcontent.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nbcontent";

/// Default bound on element nesting in compiled subtrees.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 512;

// ---------------------------------------------------------------------------
// Config structs (matching nbcontent.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Markdown dialect and compiler limits.
    #[serde(default)]
    pub markdown: MarkdownConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Output format for `nbcontent parse`: "json" or "html".
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_format: default_output_format(),
            pretty: true,
        }
    }
}

fn default_output_format() -> String {
    "json".into()
}

/// `[markdown]` section.
///
/// Plain CommonMark plus frontmatter by default; GFM extensions are opt-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Lift a leading `---` YAML block into frontmatter.
    #[serde(default = "default_true")]
    pub frontmatter: bool,

    #[serde(default)]
    pub tables: bool,

    #[serde(default)]
    pub strikethrough: bool,

    #[serde(default)]
    pub tasklists: bool,

    #[serde(default)]
    pub footnotes: bool,

    /// `# Heading {#id .class}` syntax.
    #[serde(default)]
    pub heading_attributes: bool,

    /// Maximum element nesting before a cell or output degrades to empty.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            frontmatter: true,
            tables: false,
            strikethrough: false,
            tasklists: false,
            footnotes: false,
            heading_attributes: false,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

// ---------------------------------------------------------------------------
// Compile options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime options for the prose and fragment compilers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub frontmatter: bool,
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnotes: bool,
    pub heading_attributes: bool,
    pub max_nesting_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CompileOptions {
    fn from(config: &AppConfig) -> Self {
        let md = &config.markdown;
        Self {
            frontmatter: md.frontmatter,
            tables: md.tables,
            strikethrough: md.strikethrough,
            tasklists: md.tasklists,
            footnotes: md.footnotes,
            heading_attributes: md.heading_attributes,
            max_nesting_depth: md.max_nesting_depth,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nbcontent/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NbContentError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nbcontent/nbcontent.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NbContentError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NbContentError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NbContentError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NbContentError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NbContentError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject option values the compilers cannot work with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.defaults.output_format.as_str() {
        "json" | "html" => {}
        other => {
            return Err(NbContentError::validation(format!(
                "unknown output_format '{other}' (expected \"json\" or \"html\")"
            )));
        }
    }

    if config.markdown.max_nesting_depth == 0 {
        return Err(NbContentError::validation(
            "max_nesting_depth must be at least 1",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_format"));
        assert!(toml_str.contains("max_nesting_depth"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.output_format, "json");
        assert!(parsed.markdown.frontmatter);
        assert_eq!(parsed.markdown.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[markdown]
tables = true
footnotes = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.markdown.tables);
        assert!(config.markdown.footnotes);
        assert!(!config.markdown.strikethrough);
        assert!(config.markdown.frontmatter);
        assert!(config.defaults.pretty);
    }

    #[test]
    fn compile_options_from_app_config() {
        let mut app = AppConfig::default();
        app.markdown.tasklists = true;
        app.markdown.max_nesting_depth = 64;

        let opts = CompileOptions::from(&app);
        assert!(opts.tasklists);
        assert!(opts.frontmatter);
        assert_eq!(opts.max_nesting_depth, 64);
        assert_eq!(CompileOptions::default().max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(validate_config(&config).is_ok());

        config.defaults.output_format = "yaml".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("unknown output_format 'yaml'"));

        config.defaults.output_format = "html".into();
        config.markdown.max_nesting_depth = 0;
        assert!(validate_config(&config).is_err());
    }
}
