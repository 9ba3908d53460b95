//! Application configuration for reviewpress.
//!
//! User config lives at `~/.reviewpress/reviewpress.toml`, or wherever
//! `--config` points. CLI flags override config file values, which override
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReviewPressError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "reviewpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".reviewpress";

// ---------------------------------------------------------------------------
// Config structs (matching reviewpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site-wide presentation settings.
    #[serde(default)]
    pub site: SiteSection,

    /// Template and asset locations.
    #[serde(default)]
    pub paths: PathsSection,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    /// Title shown on the index page and in article headers.
    #[serde(default = "default_site_title")]
    pub title: String,

    /// Prefix prepended to image paths in generated pages (e.g. `/images/`).
    #[serde(default)]
    pub image_base_url: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            image_base_url: String::new(),
        }
    }
}

fn default_site_title() -> String {
    "Reviews".into()
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsSection {
    /// Directory holding `article.html.hbs` / `index.html.hbs` overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,

    /// Directory holding `styles.css`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Site config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime presentation settings, merged from the config file and CLI flags.
#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    pub title: String,
    pub image_base_url: String,
    pub templates_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
}

impl From<&AppConfig> for SiteConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            title: config.site.title.clone(),
            image_base_url: config.site.image_base_url.clone(),
            templates_dir: config.paths.templates_dir.clone(),
            assets_dir: config.paths.assets_dir.clone(),
        }
    }
}

impl SiteConfig {
    /// Apply CLI overrides; `None` keeps the configured value.
    pub fn with_overrides(
        mut self,
        templates_dir: Option<PathBuf>,
        assets_dir: Option<PathBuf>,
    ) -> Self {
        if templates_dir.is_some() {
            self.templates_dir = templates_dir;
        }
        if assets_dir.is_some() {
            self.assets_dir = assets_dir;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.reviewpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReviewPressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.reviewpress/reviewpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = match config_file_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(error = %e, "no home directory, using default config");
            return Ok(AppConfig::default());
        }
    };

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReviewPressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ReviewPressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}
