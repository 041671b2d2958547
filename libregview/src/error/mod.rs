//! Error types for regview
//!
//! Every failure of the registry-access layer is surfaced as a
//! [`RegistryError`]. Nothing here terminates the process; callers decide
//! what is fatal.

use thiserror::Error;


/// Main error type for registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Transport-level failures (DNS, connect, TLS, reading the body)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A challenge was received but could not be answered
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// Non-2xx response left after the single authentication retry
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    /// Response body is not the expected JSON shape
    #[error("Decode error: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed input caught before any network I/O
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::error::RegistryError;
    ///
    /// let err = RegistryError::network("connection refused");
    /// assert!(matches!(err, RegistryError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new authentication error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::error::RegistryError;
    ///
    /// let err = RegistryError::authentication("token endpoint refused", Some(401));
    /// assert!(matches!(err, RegistryError::Authentication { .. }));
    /// ```
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new HTTP status error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::error::RegistryError;
    ///
    /// let err = RegistryError::http(404, "http://localhost:5000/v2/nope/tags/list", "not found");
    /// assert_eq!(err.status(), Some(404));
    /// ```
    pub fn http<U, S>(status: u16, url: U, message: S) -> Self
    where
        U: Into<String>,
        S: Into<String>,
    {
        Self::Http {
            status,
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new decode error.
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new decode error with a source error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::error::RegistryError;
    ///
    /// let json_err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
    /// let err = RegistryError::decode_with_source("invalid catalog", json_err);
    /// assert!(matches!(err, RegistryError::Decode { .. }));
    /// ```
    pub fn decode_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::error::RegistryError;
    ///
    /// let err = RegistryError::config("no registry uri provided", None);
    /// assert!(matches!(err, RegistryError::Config { .. }));
    /// ```
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Authentication { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl From<config::ConfigError> for RegistryError {
    fn from(err: config::ConfigError) -> Self {
        RegistryError::config_with_source("Failed to build configuration", None, err)
    }
}
