//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables (`REGISTRYUI_*`)
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::format::ColorChoice;
use libregview::{Result, Settings};
use std::path::{Path, PathBuf};

/// Verbosity taken from the repeated `-v` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    Normal,
    Verbose,
    VeryVerbose,
    Trace,
}

impl VerbosityLevel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::VeryVerbose,
            _ => VerbosityLevel::Trace,
        }
    }
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved settings
    pub settings: Settings,
    pub color: ColorChoice,
    pub verbosity: VerbosityLevel,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    pub fn build(
        config_path: Option<&Path>,
        registry: Option<&str>,
        color: ColorChoice,
        verbosity: VerbosityLevel,
    ) -> Result<Self> {
        // Fall back to the per-user file only when it exists
        let default_path = default_config_path().filter(|p| p.exists());
        let path = config_path.or(default_path.as_deref());

        let mut settings = Settings::load(path)?;

        if let Some(registry) = registry {
            settings.hub_uri = Some(registry.to_string());
        }

        Ok(Self {
            settings,
            color,
            verbosity,
        })
    }
}

/// `$XDG_CONFIG_HOME/regview/config.yaml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("regview").join("config.yaml"))
}
