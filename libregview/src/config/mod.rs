//! Application configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file,
//! then `REGISTRYUI_*` environment variables.

use crate::auth::Credentials;
use crate::client::ClientConfig;
use crate::error::{Result, RegistryError};
use config::{Config as ConfigRs, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;


/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "REGISTRYUI";

/// Resolved settings for the catalog reader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Registry host or URL (required)
    #[serde(default)]
    pub hub_uri: Option<String>,

    /// Shown to the renderer; user management itself is not handled here
    #[serde(default)]
    pub account_mgmt_enabled: bool,

    /// Account configuration file; required when account management is on
    #[serde(default)]
    pub account_mgmt_config: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_tls_skip_verify")]
    pub tls_skip_verify: bool,

    #[serde(default = "default_disable_compression")]
    pub disable_compression: bool,

    /// Request timeout in seconds; none by default
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hub_uri: None,
            account_mgmt_enabled: false,
            account_mgmt_config: None,
            username: None,
            password: None,
            tls_skip_verify: default_tls_skip_verify(),
            disable_compression: default_disable_compression(),
            timeout: None,
        }
    }
}

fn default_tls_skip_verify() -> bool {
    true
}

fn default_disable_compression() -> bool {
    true
}

impl Settings {
    /// Parses `Settings` from a YAML string, ignoring the environment.
    ///
    /// This function is primarily used for testing.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Settings::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder)
    }

    /// Loads settings from an optional YAML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Loads settings using `env` in place of the process environment.
    ///
    /// Keys of `env` are full variable names, e.g. `REGISTRYUI_HUB_URI`.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = ConfigRs::builder().add_source(ConfigRs::try_from(&Settings::default())?);

        if let Some(p) = path {
            if !p.exists() {
                return Err(RegistryError::config(
                    "Configuration file does not exist".to_string(),
                    Some(p.display().to_string()),
                ));
            }
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        Self::from_builder(builder)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                RegistryError::config_with_source(
                    "Failed to deserialize configuration",
                    None::<&str>,
                    e,
                )
            })
    }

    /// Checks the conditions that must hold before contacting a registry.
    pub fn validate(&self) -> Result<()> {
        self.registry_uri()?;

        if self.account_mgmt_enabled
            && self
                .account_mgmt_config
                .as_deref()
                .is_none_or(|p| p.trim().is_empty())
        {
            return Err(RegistryError::config(
                "account management enabled but no config file",
                None,
            ));
        }

        Ok(())
    }

    /// Returns the configured registry URI.
    pub fn registry_uri(&self) -> Result<&str> {
        self.hub_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| RegistryError::config("no registry uri provided", None))
    }

    /// Credentials used to answer registry challenges.
    ///
    /// A username with no password is treated as an empty password.
    pub fn credentials(&self) -> Credentials {
        match &self.username {
            Some(username) if !username.is_empty() => Credentials::basic(
                username.clone(),
                self.password.clone().unwrap_or_default(),
            ),
            _ => Credentials::anonymous(),
        }
    }

    /// Transport settings for the registry client.
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new()
            .with_insecure_skip_verify(self.tls_skip_verify)
            .with_disable_compression(self.disable_compression);

        match self.timeout {
            Some(seconds) => config.with_timeout(seconds),
            None => config,
        }
    }
}
