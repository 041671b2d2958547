//! Catalog aggregation.
//!
//! Turns the registry's flat repository list into a tree grouped by
//! top-level namespace: `library/nginx` lands under `library`, a bare
//! `standalone` lands under [`STANDALONE_KEY`].

use crate::client::Client;
use crate::error::{Result, RegistryError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};


/// Namespace key for repositories without a `/` in their name.
pub const STANDALONE_KEY: &str = "-";

/// Response from the catalog endpoint.
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

/// Response from the tags endpoint. Registries send `"tags": null` for
/// repositories without tags.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// A repository and its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Fully-qualified repository name, never empty
    pub name: String,
    /// Tags in registry order; empty when nothing was pushed
    pub tags: Vec<String>,
}

/// Repositories grouped by namespace, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Passed through from configuration
    pub account_management_enabled: bool,
    /// Registry endpoint the catalog was read from
    pub registry: String,
    /// Namespace key to images, in the order the registry listed them
    pub repositories: BTreeMap<String, Vec<Image>>,
}

impl Catalog {
    /// Total number of images across all namespaces.
    pub fn image_count(&self) -> usize {
        self.repositories.values().map(Vec::len).sum()
    }
}

/// Returns the namespace key of a repository name.
///
/// # Examples
///
/// ```
/// use libregview::catalog::namespace_key;
///
/// assert_eq!(namespace_key("library/nginx"), "library");
/// assert_eq!(namespace_key("team/app/api"), "team");
/// assert_eq!(namespace_key("standalone"), "-");
/// ```
pub fn namespace_key(repository: &str) -> &str {
    match repository.split_once('/') {
        Some((namespace, _)) => namespace,
        None => STANDALONE_KEY,
    }
}

/// Groups images by namespace key, keeping input order within each key.
pub fn group_images(images: Vec<Image>) -> BTreeMap<String, Vec<Image>> {
    let mut grouped: BTreeMap<String, Vec<Image>> = BTreeMap::new();
    for image in images {
        grouped
            .entry(namespace_key(&image.name).to_string())
            .or_default()
            .push(image);
    }
    grouped
}

/// Builds a [`Catalog`] from sequential registry calls.
///
/// One call lists the repositories (following pagination), then one call per
/// repository resolves its tags. The first failure aborts the whole fetch.
#[derive(Debug, Clone)]
pub struct CatalogAggregator {
    client: Client,
    account_management_enabled: bool,
}

impl CatalogAggregator {
    /// Creates an aggregator over `client`.
    ///
    /// `account_management_enabled` is copied verbatim into every catalog.
    pub fn new(client: Client, account_management_enabled: bool) -> Self {
        Self {
            client,
            account_management_enabled,
        }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches every repository and its tags and groups them by namespace.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use libregview::catalog::CatalogAggregator;
    /// use libregview::client::Client;
    ///
    /// # async fn example() -> libregview::error::Result<()> {
    /// let client = Client::new("http://localhost:5000")?;
    /// let catalog = CatalogAggregator::new(client, false).fetch_catalog().await?;
    /// for (namespace, images) in &catalog.repositories {
    ///     println!("{} [{}]", namespace, images.len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Any error from listing repositories or from any tag lookup, including
    /// [`RegistryError::Decode`] for unexpected JSON. No partial catalog is
    /// ever returned.
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let repositories = self.list_repositories().await?;
        debug!(count = repositories.len(), "Resolving tags");

        let mut images = Vec::with_capacity(repositories.len());
        for repository in &repositories {
            images.push(self.fetch_image(repository).await?);
        }

        let catalog = Catalog {
            account_management_enabled: self.account_management_enabled,
            registry: self.client.registry_url().to_string(),
            repositories: group_images(images),
        };
        info!(
            registry = %catalog.registry,
            namespaces = catalog.repositories.len(),
            images = catalog.image_count(),
            "Fetched catalog"
        );

        Ok(catalog)
    }

    /// Lists all repository names, concatenating paginated responses.
    pub async fn list_repositories(&self) -> Result<Vec<String>> {
        let mut repositories = Vec::new();
        let mut path = String::from("/v2/_catalog");
        let mut seen = HashSet::from([path.clone()]);

        loop {
            let page = self.client.get_page(&path).await?;
            let catalog: CatalogResponse = serde_json::from_slice(&page.body).map_err(|e| {
                RegistryError::decode_with_source("Failed to decode catalog response", e)
            })?;
            let batch = catalog.repositories.ok_or_else(|| {
                RegistryError::decode("Catalog response has no 'repositories' field")
            })?;

            if let Some(name) = batch.iter().find(|name| name.is_empty()) {
                return Err(RegistryError::decode(format!(
                    "Catalog response contains an empty repository name: {:?}",
                    name
                )));
            }
            repositories.extend(batch);

            let Some(next) = page.next else {
                break;
            };
            let next_path = next_page_path(self.client.registry_url(), &path, &next)?;
            if !seen.insert(next_path.clone()) {
                return Err(RegistryError::decode(format!(
                    "Catalog pagination repeats page '{}'",
                    next_path
                )));
            }
            debug!(next = %next_path, "Following catalog page");
            path = next_path;
        }

        Ok(repositories)
    }

    /// Resolves the tags of one repository.
    pub async fn fetch_image(&self, repository: &str) -> Result<Image> {
        let path = format!("/v2/{}/tags/list", repository);
        let body = self.client.get(&path).await?;

        let response: TagsResponse = serde_json::from_slice(&body).map_err(|e| {
            RegistryError::decode_with_source(
                format!("Failed to decode tags response for '{}'", repository),
                e,
            )
        })?;

        if let Some(name) = response.name.as_deref()
            && name != repository
        {
            warn!(
                expected = repository,
                returned = name,
                "Registry returned tags under a different name"
            );
        }

        Ok(Image {
            name: repository.to_string(),
            tags: response.tags.unwrap_or_default(),
        })
    }
}

/// Resolves a `Link` target against the page it came from and returns the
/// path and query to request next. Absolute links keep only their path, so a
/// registry that spells its own host differently still paginates.
fn next_page_path(registry_url: &str, current: &str, next: &str) -> Result<String> {
    let base = Url::parse(&format!("{}{}", registry_url, current)).map_err(|e| {
        RegistryError::validation(format!("Invalid catalog URL '{}': {}", current, e))
    })?;
    let target = base.join(next).map_err(|e| {
        RegistryError::decode(format!("Invalid pagination link '{}': {}", next, e))
    })?;

    Ok(match target.query() {
        Some(query) => format!("{}?{}", target.path(), query),
        None => target.path().to_string(),
    })
}
