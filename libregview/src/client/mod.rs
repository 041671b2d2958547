//! HTTP client for registry communication.
//!
//! This module provides a thin HTTP client built on reqwest. Every request
//! goes through the same cycle: send, and on a first 401 let the configured
//! [`Authenticator`] annotate the request, then send it exactly once more.

use crate::auth::{Authenticator, ChallengeResponse};
use crate::error::{Result, RegistryError};
use reqwest::{Client as ReqwestClient, Request, Response, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

#[cfg(test)]
mod tests;

/// Transport configuration for the HTTP client.
///
/// These settings are fixed when the client is built; nothing is changed on
/// a process-wide default client.
///
/// # Examples
///
/// ```
/// use libregview::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_insecure_skip_verify(true)
///     .with_disable_compression(true)
///     .with_timeout(60);
/// assert_eq!(config.timeout_seconds, Some(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Accept invalid TLS certificates and hostnames (default: false)
    pub insecure_skip_verify: bool,
    /// Do not negotiate gzip response compression (default: false)
    pub disable_compression: bool,
    /// Optional request timeout in seconds (default: none)
    pub timeout_seconds: Option<u64>,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            insecure_skip_verify: false,
            disable_compression: false,
            timeout_seconds: None,
            max_idle_per_host: 10,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips TLS certificate verification.
    pub fn with_insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    /// Disables response compression.
    pub fn with_disable_compression(mut self, disable: bool) -> Self {
        self.disable_compression = disable;
        self
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Builds a reqwest client honouring this configuration.
    ///
    /// Also used for token requests so they share the TLS posture of the
    /// registry client.
    pub fn build_http_client(&self) -> Result<ReqwestClient> {
        let mut builder = ReqwestClient::builder()
            .pool_max_idle_per_host(self.max_idle_per_host)
            .danger_accept_invalid_certs(self.insecure_skip_verify);

        if self.disable_compression {
            builder = builder.no_gzip();
        }
        if let Some(seconds) = self.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        builder
            .build()
            .map_err(|e| RegistryError::network_with_source("Failed to create HTTP client", e))
    }
}

/// A successful response body plus the pagination link, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Full response body
    pub body: Vec<u8>,
    /// Path of the next page from a `Link: <...>; rel="next"` header
    pub next: Option<String>,
}

/// HTTP client for registry operations.
#[derive(Clone)]
pub struct Client {
    /// The underlying HTTP client
    http_client: ReqwestClient,
    /// Base registry URL (e.g., "https://registry.example.com")
    registry_url: String,
    /// Answers 401 challenges; without one a 401 is an authentication error
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("registry_url", &self.registry_url)
            .field("authenticator", &self.authenticator.is_some())
            .finish()
    }
}

impl Client {
    /// Creates a new client for the specified registry URL with default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::client::Client;
    ///
    /// let client = Client::new("localhost:5000").unwrap();
    /// assert_eq!(client.registry_url(), "http://localhost:5000");
    /// ```
    pub fn new(registry_url: &str) -> Result<Self> {
        Self::with_config(registry_url, ClientConfig::default())
    }

    /// Creates a new client with custom transport configuration and no authenticator.
    pub fn with_config(registry_url: &str, config: ClientConfig) -> Result<Self> {
        let normalized_url = Self::normalize_url(registry_url)?;
        let http_client = config.build_http_client()?;

        Ok(Self {
            http_client,
            registry_url: normalized_url,
            authenticator: None,
        })
    }

    /// Creates a new client that answers 401 challenges with `authenticator`.
    pub fn with_authenticator(
        registry_url: &str,
        config: ClientConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let mut client = Self::with_config(registry_url, config)?;
        client.authenticator = Some(authenticator);
        Ok(client)
    }

    /// Normalizes a registry URL by ensuring it has a scheme and removing trailing slashes.
    fn normalize_url(url: &str) -> Result<String> {
        let url = url.trim();

        if url.is_empty() {
            return Err(RegistryError::validation("Registry URL cannot be empty"));
        }

        let url = if !url.starts_with("http://") && !url.starts_with("https://") {
            format!("http://{}", url)
        } else {
            url.to_string()
        };

        let url = url.trim_end_matches('/').to_string();

        Url::parse(&url).map_err(|e| {
            RegistryError::validation(format!("Invalid registry URL '{}': {}", url, e))
        })?;

        Ok(url)
    }

    /// Returns the base registry URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Returns true if 401 challenges will be answered.
    pub fn has_authenticator(&self) -> bool {
        self.authenticator.is_some()
    }

    /// Resolves `path` against the registry URL, rejecting malformed input.
    fn resolve(&self, path: &str) -> Result<Url> {
        if path.is_empty() {
            return Err(RegistryError::validation("Request path cannot be empty"));
        }
        if !path.starts_with('/') {
            return Err(RegistryError::validation(format!(
                "Request path '{}' must start with '/'",
                path
            )));
        }
        if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(RegistryError::validation(format!(
                "Request path '{}' contains whitespace or control characters",
                path.escape_debug()
            )));
        }

        let full = format!("{}{}", self.registry_url, path);
        Url::parse(&full)
            .map_err(|e| RegistryError::validation(format!("Invalid request URL '{}': {}", full, e)))
    }

    /// Performs a GET against `path` and returns the full response body.
    ///
    /// A first 401 is handed to the authenticator and the request is sent
    /// once more with credentials attached. A second 401 is returned as
    /// [`RegistryError::Http`] with status 401.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use libregview::client::Client;
    ///
    /// # async fn example() -> libregview::error::Result<()> {
    /// let client = Client::new("http://localhost:5000")?;
    /// let body = client.get("/v2/_catalog").await?;
    /// println!("{}", String::from_utf8_lossy(&body));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Validation`] for a malformed path, before any I/O
    /// - [`RegistryError::Network`] when the transport fails
    /// - [`RegistryError::Authentication`] when the challenge cannot be answered
    /// - [`RegistryError::Http`] for any other non-2xx status
    pub async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.get_page(path).await.map(|page| page.body)
    }

    /// Same as [`Client::get`], also returning the `rel="next"` pagination link.
    pub async fn get_page(&self, path: &str) -> Result<Page> {
        let url = self.resolve(path)?;
        let request = self
            .http_client
            .get(url)
            .build()
            .map_err(|e| RegistryError::validation(format!("Failed to build request: {}", e)))?;

        let response = self.execute(request).await?;
        let next = Self::extract_next_link(response.headers());
        let response = Self::check_response_status(response).await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::network_with_source("Failed to read response body", e))?;
        trace!(path, bytes = body.len(), "Read response body");

        Ok(Page {
            body: body.to_vec(),
            next,
        })
    }

    /// Sends `request`, answering at most one 401 challenge.
    async fn execute(&self, request: Request) -> Result<Response> {
        let retry = request.try_clone();
        debug!(method = %request.method(), url = %request.url(), "Sending request");

        let response = self.send(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = ChallengeResponse::from_response(&response);
        let Some(authenticator) = &self.authenticator else {
            return Err(RegistryError::authentication(
                format!("Authentication required for {}", challenge.url),
                Some(StatusCode::UNAUTHORIZED.as_u16()),
            ));
        };
        let mut retry = retry.ok_or_else(|| {
            RegistryError::validation(format!("Request to {} cannot be retried", challenge.url))
        })?;

        debug!(url = %challenge.url, "Received 401, authenticating");
        authenticator.authenticate(&challenge, &mut retry).await?;

        debug!(url = %retry.url(), "Retrying with credentials");
        self.send(retry).await
    }

    async fn send(&self, request: Request) -> Result<Response> {
        self.http_client
            .execute(request)
            .await
            .map_err(|e| Self::translate_reqwest_error(e, &self.registry_url))
    }

    /// Extracts the next page path from the Link header.
    ///
    /// Format: `</v2/_catalog?n=100&last=repo99>; rel="next"`
    fn extract_next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
        let link_str = headers.get(reqwest::header::LINK)?.to_str().ok()?;

        for link_part in link_str.split(',') {
            let link_part = link_part.trim();

            if link_part.contains("rel=\"next\"") || link_part.contains("rel='next'") {
                if let Some(start) = link_part.find('<')
                    && let Some(end) = link_part.find('>')
                    && start < end
                {
                    return Some(link_part[start + 1..end].to_string());
                }
            }
        }

        None
    }

    /// Translates a reqwest error into a RegistryError.
    fn translate_reqwest_error(error: reqwest::Error, registry_url: &str) -> RegistryError {
        if error.is_timeout() {
            RegistryError::network_with_source(
                format!("Request to {} timed out", registry_url),
                error,
            )
        } else if error.is_connect() {
            RegistryError::network_with_source(
                format!("Failed to connect to registry at {}", registry_url),
                error,
            )
        } else {
            RegistryError::network_with_source(
                format!("Network error communicating with {}", registry_url),
                error,
            )
        }
    }

    /// Turns any non-2xx status into [`RegistryError::Http`].
    async fn check_response_status(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("(unable to read response body)"));

        debug!(status = status.as_u16(), %url, "Request failed");
        Err(RegistryError::http(status.as_u16(), url, error_body.trim()))
    }
}
