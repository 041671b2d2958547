//! High-level API for reading a registry catalog.
//!
//! # Examples
//!
//! ```no_run
//! use libregview::{Settings, Viewer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(None)?;
//!     let viewer = Viewer::from_settings(&settings)?;
//!
//!     let catalog = viewer.fetch_catalog().await?;
//!     for (namespace, images) in &catalog.repositories {
//!         println!("{} [{}]", namespace, images.len());
//!     }
//!     Ok(())
//! }
//! ```

use crate::auth::{Credentials, CredentialsAuthenticator};
use crate::catalog::{Catalog, CatalogAggregator};
use crate::client::{Client, ClientConfig};
use crate::config::Settings;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
#[path = "viewer_tests.rs"]
mod tests;

/// Entry point that wires the client, authenticator and aggregator together.
#[derive(Debug, Clone)]
pub struct Viewer {
    aggregator: CatalogAggregator,
}

impl Viewer {
    /// Connects to `registry_url` with default transport settings.
    ///
    /// Challenges are answered anonymously, which is enough for registries
    /// that hand out anonymous pull tokens.
    pub fn connect(registry_url: &str) -> Result<Self> {
        Self::builder().registry_url(registry_url).build()
    }

    /// Builds a viewer from resolved [`Settings`].
    ///
    /// Fails if the settings do not pass [`Settings::validate`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;

        Self::builder()
            .registry_url(settings.registry_uri()?)
            .client_config(settings.client_config())
            .credentials(settings.credentials())
            .account_management(settings.account_mgmt_enabled)
            .build()
    }

    /// Creates a builder for advanced configuration.
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Returns the normalized registry URL.
    pub fn registry_url(&self) -> &str {
        self.aggregator.client().registry_url()
    }

    /// Fetches the grouped catalog. See [`CatalogAggregator::fetch_catalog`].
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        self.aggregator.fetch_catalog().await
    }
}

/// Builder for [`Viewer`].
#[derive(Debug, Default)]
pub struct ViewerBuilder {
    registry_url: Option<String>,
    client_config: ClientConfig,
    credentials: Credentials,
    account_management: bool,
}

impl ViewerBuilder {
    /// Creates a builder with default transport settings and no credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the registry URL (required).
    pub fn registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = Some(url.into());
        self
    }

    /// Sets transport configuration.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Sets the credentials used to answer challenges.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the account-management flag stamped on every catalog.
    pub fn account_management(mut self, enabled: bool) -> Self {
        self.account_management = enabled;
        self
    }

    /// Builds the viewer.
    pub fn build(self) -> Result<Viewer> {
        let registry_url = self.registry_url.unwrap_or_default();

        let authenticator = CredentialsAuthenticator::new(
            self.credentials,
            self.client_config.build_http_client()?,
        );
        let client =
            Client::with_authenticator(&registry_url, self.client_config, Arc::new(authenticator))?;
        debug!(registry = client.registry_url(), "Built registry client");

        Ok(Viewer {
            aggregator: CatalogAggregator::new(client, self.account_management),
        })
    }
}
