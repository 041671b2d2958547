//! regview - Registry Catalog Library
//!
//! libregview reads the catalog of a container registry over the
//! distribution HTTP API, resolves every repository's tags and groups the
//! result by top-level namespace for display.
//!
//! # Quick Start
//!
//! ```no_run
//! use libregview::Viewer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let viewer = Viewer::connect("http://localhost:5000")?;
//!
//!     let catalog = viewer.fetch_catalog().await?;
//!     for (namespace, images) in &catalog.repositories {
//!         for image in images {
//!             println!("{} {} {:?}", namespace, image.name, image.tags);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`Viewer`] - Main entry point, built from [`Settings`] or a builder
//! - [`Catalog`] / [`Image`] - The grouped result
//! - [`Authenticator`] - Capability that answers 401 challenges
//! - [`RegistryError`] - Typed failures; nothing here exits the process
//!
//! # Architecture
//!
//! - [`client`] - GET with a single challenge-driven retry
//! - [`catalog`] - Repository listing, tag resolution and grouping
//! - [`auth`] - Credentials, challenge parsing, the stock authenticator
//! - [`config`] - Layered settings (defaults, YAML file, environment)

#![warn(clippy::all)]

/// Returns the libregview crate version.
///
/// # Examples
///
/// ```
/// let version = libregview::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

mod viewer;
pub use viewer::{Viewer, ViewerBuilder};

pub use auth::{Authenticator, Credentials};
pub use catalog::{Catalog, CatalogAggregator, Image};
pub use client::{Client, ClientConfig};
pub use config::Settings;
pub use error::{RegistryError, Result};

pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
