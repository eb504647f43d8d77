//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/seoplan/config.toml)
//! 3. Project config (.seoplan/config.toml)
//! 4. Environment variables (SEOPLAN_* prefix)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, SeoError};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        let config: Config = figment
            .merge(Self::env_provider())
            .extract()
            .map_err(|e| SeoError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| SeoError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// `SEOPLAN_<SECTION>_<FIELD>`: only the first `_` nests, so
    /// `SEOPLAN_AI_TIMEOUT_SECS` maps to `ai.timeout_secs`
    fn env_provider() -> Env {
        Env::prefixed("SEOPLAN_")
            .map(|key| key.as_str().replacen('_', ".", 1).into())
            .lowercase(true)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/seoplan/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("seoplan"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".seoplan")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration as toml, json or yaml
    pub fn render(config: &Config, format: &str) -> Result<String> {
        match format {
            "json" => Ok(serde_json::to_string_pretty(config)?),
            "yaml" => Ok(serde_yaml::to_string(config)?),
            "toml" | "text" => {
                toml::to_string_pretty(config).map_err(|e| SeoError::Config(e.to_string()))
            }
            other => Err(SeoError::Config(format!(
                "Unknown format: {}. Valid values: text, toml, json, yaml",
                other
            ))),
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            SeoError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    /// Initialize project configuration in `root`
    pub fn init_project(root: &Path, force: bool) -> Result<PathBuf> {
        let project_dir = root.join(Self::project_dir());
        fs::create_dir_all(project_dir.join("reports"))?;

        let config_path = project_dir.join("config.toml");
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(());
        }
        fs::write(path, Self::default_config())?;
        info!("Created config: {}", path.display());
        Ok(())
    }

    /// Default config content (TOML)
    fn default_config() -> String {
        r#"# seoplan configuration
# Project settings in .seoplan/config.toml override ~/.config/seoplan/config.toml.
# Any value can be overridden with SEOPLAN_<SECTION>_<FIELD>, e.g. SEOPLAN_AI_BACKEND.

version = "1.0"

[ai]
# gemini | openai | openrouter | anthropic
backend = "gemini"
# Leave empty for the backend default. List several under `models` to race them.
model = ""
timeout_secs = 300
detail_max_tokens = 8192

[retry]
max_attempts = 5
base_delay_ms = 2000
max_jitter_ms = 1000

[pipeline]
detail_concurrency = 5
batch_concurrency = 5
batch_size = 15
max_urls = 200

[output]
directory = ".seoplan/reports"
pretty = true
# Older report snapshots are pruned on save
keep_reports = 10
"#
        .to_string()
    }
}
