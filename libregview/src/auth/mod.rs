//! Authentication handling for registry requests.
//!
//! The HTTP client never negotiates credentials itself. When a registry
//! answers 401 it hands the challenge and the outgoing request to an
//! [`Authenticator`], which annotates the request so it can be sent again.
//! [`CredentialsAuthenticator`] is the stock implementation, covering the
//! Basic scheme and the Bearer token flow of the distribution API.

use crate::error::{Result, RegistryError};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, WWW_AUTHENTICATE};
use reqwest::{Request, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;


/// Credentials for registry authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// No credentials; anonymous tokens may still be issued
    #[default]
    Anonymous,

    /// HTTP Basic authentication with username and password
    Basic {
        /// Username for authentication
        username: String,
        /// Password for authentication
        password: String,
    },

    /// A pre-issued bearer token
    Bearer {
        /// The bearer token
        token: String,
    },
}

impl Credentials {
    /// Creates anonymous credentials.
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates Basic authentication credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::auth::Credentials;
    ///
    /// let creds = Credentials::basic("username", "password");
    /// assert!(creds.to_header_value().unwrap().starts_with("Basic "));
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates Bearer token credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Returns the Authorization header value for these credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::auth::Credentials;
    ///
    /// assert_eq!(Credentials::anonymous().to_header_value(), None);
    /// assert_eq!(
    ///     Credentials::bearer("abc").to_header_value(),
    ///     Some("Bearer abc".to_string())
    /// );
    /// ```
    pub fn to_header_value(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => {
                use base64::{Engine as _, engine::general_purpose};
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials);
                Some(format!("Basic {}", encoded))
            }
            Self::Bearer { token } => Some(format!("Bearer {}", token)),
        }
    }
}

/// Information parsed from a WWW-Authenticate header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// The authentication scheme (e.g., "Bearer")
    pub scheme: String,

    /// The authentication realm; the token endpoint for Bearer challenges
    pub realm: Option<String>,

    /// The service identifier
    pub service: Option<String>,

    /// The scope being requested
    pub scope: Option<String>,
}

impl AuthChallenge {
    /// Parses a WWW-Authenticate header value.
    ///
    /// Quoted values may contain commas, as in
    /// `scope="repository:library/nginx:pull,push"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libregview::auth::AuthChallenge;
    ///
    /// let header = r#"Bearer realm="https://auth.example.com/token",service="registry""#;
    /// let challenge = AuthChallenge::parse(header).unwrap();
    /// assert_eq!(challenge.scheme, "Bearer");
    /// assert_eq!(challenge.service.as_deref(), Some("registry"));
    /// ```
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();
        if header.is_empty() {
            return Err(RegistryError::authentication(
                "Empty WWW-Authenticate header",
                Some(401),
            ));
        }

        let (scheme, params) = match header.split_once(char::is_whitespace) {
            Some((scheme, params)) => (scheme, params.trim()),
            None => (header, ""),
        };

        let mut challenge = Self {
            scheme: scheme.to_string(),
            realm: None,
            service: None,
            scope: None,
        };

        for (key, value) in split_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => challenge.realm = Some(value),
                "service" => challenge.service = Some(value),
                "scope" => challenge.scope = Some(value),
                _ => {}
            }
        }

        Ok(challenge)
    }

    /// Returns true if the scheme matches `scheme`, ignoring case.
    pub fn is_scheme(&self, scheme: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme)
    }
}

/// Splits `key="value", key2=value2` pairs, honouring quotes.
fn split_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = params.trim();

    while !rest.is_empty() {
        let Some((key, after_key)) = rest.split_once('=') else {
            break;
        };
        let key = key.trim().trim_start_matches(',').trim().to_string();
        let after_key = after_key.trim_start();

        let (value, remainder) = if let Some(quoted) = after_key.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (quoted[..end].to_string(), &quoted[end + 1..]),
                None => (quoted.to_string(), ""),
            }
        } else {
            match after_key.find(',') {
                Some(end) => (after_key[..end].trim().to_string(), &after_key[end..]),
                None => (after_key.trim().to_string(), ""),
            }
        };

        pairs.push((key, value));
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    pairs
}

/// The parts of a 401 response an [`Authenticator`] may inspect.
///
/// The body has already been discarded; only status, URL and headers are kept.
#[derive(Debug, Clone)]
pub struct ChallengeResponse {
    /// Response status, normally 401
    pub status: StatusCode,
    /// URL that produced the challenge
    pub url: Url,
    /// Response headers, including `WWW-Authenticate`
    pub headers: HeaderMap,
}

impl ChallengeResponse {
    /// Captures status, URL and headers from a response.
    pub fn from_response(response: &reqwest::Response) -> Self {
        Self {
            status: response.status(),
            url: response.url().clone(),
            headers: response.headers().clone(),
        }
    }

    /// Parses the `WWW-Authenticate` header of this response.
    pub fn challenge(&self) -> Result<AuthChallenge> {
        let header = self
            .headers
            .get(WWW_AUTHENTICATE)
            .ok_or_else(|| {
                RegistryError::authentication(
                    format!("{} answered 401 without a WWW-Authenticate header", self.url),
                    Some(self.status.as_u16()),
                )
            })?
            .to_str()
            .map_err(|_| {
                RegistryError::authentication(
                    "WWW-Authenticate header is not valid text",
                    Some(self.status.as_u16()),
                )
            })?;

        AuthChallenge::parse(header)
    }
}

/// Answers a registry authentication challenge.
///
/// Implementations must attach whatever the registry needs to `request`
/// (usually an `Authorization` header) or fail with
/// [`RegistryError::Authentication`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Annotates `request` with credentials for the challenge in `response`.
    async fn authenticate(
        &self,
        response: &ChallengeResponse,
        request: &mut Request,
    ) -> Result<()>;
}

/// Token endpoint response. Registries use either field name.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Authenticator backed by static [`Credentials`].
///
/// - `Basic` challenges are answered with the Basic header.
/// - `Bearer` challenges trigger a token request against the challenge realm,
///   sending Basic credentials when available.
/// - Pre-issued `Bearer` credentials are attached as-is.
#[derive(Debug, Clone)]
pub struct CredentialsAuthenticator {
    credentials: Credentials,
    http_client: reqwest::Client,
}

impl CredentialsAuthenticator {
    /// Creates an authenticator that uses `http_client` for token requests.
    pub fn new(credentials: Credentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            http_client,
        }
    }

    /// Returns the configured credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn fetch_token(&self, challenge: &AuthChallenge) -> Result<String> {
        let realm = challenge.realm.as_deref().ok_or_else(|| {
            RegistryError::authentication("Bearer challenge missing 'realm' parameter", Some(401))
        })?;

        let mut query = Vec::new();
        if let Some(service) = &challenge.service {
            query.push(("service", service.as_str()));
        }
        if let Some(scope) = &challenge.scope {
            query.push(("scope", scope.as_str()));
        }

        debug!(realm, ?query, "Requesting bearer token");

        let mut request = self.http_client.get(realm).query(&query);
        if let Credentials::Basic { username, password } = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            RegistryError::authentication(
                format!("Failed to reach token endpoint {}: {}", realm, e),
                None,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::authentication(
                format!("Token endpoint {} returned {}", realm, status),
                Some(status.as_u16()),
            ));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            RegistryError::authentication(
                format!("Failed to parse token response from {}: {}", realm, e),
                Some(status.as_u16()),
            )
        })?;

        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                RegistryError::authentication(
                    format!("Token endpoint {} returned no token", realm),
                    Some(status.as_u16()),
                )
            })
    }
}

#[async_trait]
impl Authenticator for CredentialsAuthenticator {
    async fn authenticate(
        &self,
        response: &ChallengeResponse,
        request: &mut Request,
    ) -> Result<()> {
        if let Credentials::Bearer { .. } = &self.credentials {
            return attach_authorization(request, &self.credentials.to_header_value());
        }

        let challenge = response.challenge()?;
        debug!(scheme = %challenge.scheme, url = %response.url, "Answering challenge");

        if challenge.is_scheme("Basic") {
            if self.credentials == Credentials::Anonymous {
                return Err(RegistryError::authentication(
                    format!("{} requires Basic credentials", response.url),
                    Some(response.status.as_u16()),
                ));
            }
            return attach_authorization(request, &self.credentials.to_header_value());
        }

        if challenge.is_scheme("Bearer") {
            let token = self.fetch_token(&challenge).await?;
            return attach_authorization(request, &Some(format!("Bearer {}", token)));
        }

        Err(RegistryError::authentication(
            format!("Unsupported authentication scheme '{}'", challenge.scheme),
            Some(response.status.as_u16()),
        ))
    }
}

fn attach_authorization(request: &mut Request, value: &Option<String>) -> Result<()> {
    let value = value
        .as_deref()
        .ok_or_else(|| RegistryError::authentication("No credentials to attach", None))?;

    let mut header = HeaderValue::from_str(value).map_err(|_| {
        RegistryError::authentication("Credentials contain invalid header characters", None)
    })?;
    header.set_sensitive(true);

    request.headers_mut().insert(AUTHORIZATION, header);
    Ok(())
}
