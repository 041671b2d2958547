use super::*;
use async_trait::async_trait;
use mockito::Matcher;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Attaches a fixed bearer token and counts invocations.
struct StaticTokenAuthenticator {
    token: &'static str,
    calls: AtomicUsize,
}

impl StaticTokenAuthenticator {
    fn new(token: &'static str) -> Arc<Self> {
        Arc::new(Self {
            token,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(
        &self,
        _response: &ChallengeResponse,
        request: &mut Request,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token)).unwrap();
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Always refuses to authenticate.
struct RefusingAuthenticator;

#[async_trait]
impl Authenticator for RefusingAuthenticator {
    async fn authenticate(
        &self,
        _response: &ChallengeResponse,
        _request: &mut Request,
    ) -> Result<()> {
        Err(RegistryError::authentication("credentials rejected", Some(401)))
    }
}

fn client_with(url: &str, authenticator: Arc<dyn Authenticator>) -> Client {
    Client::with_authenticator(url, ClientConfig::default(), authenticator).unwrap()
}

#[test]
fn test_client_new_with_valid_url() {
    let client = Client::new("http://localhost:5000");
    assert!(client.is_ok());
}

#[test]
fn test_client_normalizes_url_without_scheme() {
    let client = Client::new("localhost:5000").unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn test_client_keeps_https_scheme() {
    let client = Client::new("https://registry.example.com").unwrap();
    assert_eq!(client.registry_url(), "https://registry.example.com");
}

#[test]
fn test_client_removes_multiple_trailing_slashes() {
    let client = Client::new("http://localhost:5000///").unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn test_client_new_with_empty_url_fails() {
    let client = Client::new("   ");
    assert!(matches!(
        client.unwrap_err(),
        RegistryError::Validation { .. }
    ));
}

#[test]
fn test_client_without_authenticator() {
    let client = Client::new("localhost:5000").unwrap();
    assert!(!client.has_authenticator());

    let client = client_with("localhost:5000", StaticTokenAuthenticator::new("t"));
    assert!(client.has_authenticator());
}

#[test]
fn test_client_config_default() {
    let config = ClientConfig::new();
    assert!(!config.insecure_skip_verify);
    assert!(!config.disable_compression);
    assert_eq!(config.timeout_seconds, None);
    assert_eq!(config.max_idle_per_host, 10);
}

#[test]
fn test_client_config_builder_chaining() {
    let config = ClientConfig::new()
        .with_insecure_skip_verify(true)
        .with_disable_compression(true)
        .with_timeout(120)
        .with_max_idle_per_host(50);

    assert!(config.insecure_skip_verify);
    assert!(config.disable_compression);
    assert_eq!(config.timeout_seconds, Some(120));
    assert_eq!(config.max_idle_per_host, 50);

    let client = Client::with_config("localhost:5000", config);
    assert!(client.is_ok());
}

#[test]
fn test_extract_next_link() {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::LINK,
        HeaderValue::from_static("</v2/_catalog?last=b&n=2>; rel=\"next\""),
    );

    assert_eq!(
        Client::extract_next_link(&headers),
        Some("/v2/_catalog?last=b&n=2".to_string())
    );
}

#[test]
fn test_extract_next_link_absent() {
    let headers = reqwest::header::HeaderMap::new();
    assert_eq!(Client::extract_next_link(&headers), None);
}

#[tokio::test]
async fn test_get_rejects_malformed_paths_before_io() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();

    for path in ["", "v2/_catalog", "/v2/with space/tags/list", "/v2/\n"] {
        let result = client.get(path).await;
        assert!(
            matches!(result, Err(RegistryError::Validation { .. })),
            "path {:?} should be rejected",
            path
        );
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_success_returns_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_body(r#"{"repositories":["alpine"]}"#)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let body = client.get("/v2/_catalog").await.unwrap();

    mock.assert_async().await;
    assert_eq!(body, br#"{"repositories":["alpine"]}"#.to_vec());
}

#[tokio::test]
async fn test_get_page_returns_next_link() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_header("Link", "</v2/_catalog?last=alpine&n=1>; rel=\"next\"")
        .with_body(r#"{"repositories":["alpine"]}"#)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let page = client.get_page("/v2/_catalog").await.unwrap();

    assert_eq!(page.next.as_deref(), Some("/v2/_catalog?last=alpine&n=1"));
}

#[tokio::test]
async fn test_get_retries_once_after_challenge() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("GET", "/v2/_catalog")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("WWW-Authenticate", r#"Bearer realm="http://auth/token""#)
        .expect(1)
        .create_async()
        .await;
    let authorized = server
        .mock("GET", "/v2/_catalog")
        .match_header("authorization", "Bearer good-token")
        .with_status(200)
        .with_body(r#"{"repositories":["alpine"]}"#)
        .expect(1)
        .create_async()
        .await;

    let authenticator = StaticTokenAuthenticator::new("good-token");
    let client = client_with(&server.url(), authenticator.clone());

    let body = client.get("/v2/_catalog").await.unwrap();

    challenge.assert_async().await;
    authorized.assert_async().await;
    assert_eq!(authenticator.calls(), 1);
    assert_eq!(body, br#"{"repositories":["alpine"]}"#.to_vec());
}

#[tokio::test]
async fn test_retry_is_transparent() {
    let body = r#"{"name":"alpine","tags":["3.19","latest"]}"#;

    let mut direct_server = mockito::Server::new_async().await;
    let _direct = direct_server
        .mock("GET", "/v2/alpine/tags/list")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let mut challenged_server = mockito::Server::new_async().await;
    let _challenge = challenged_server
        .mock("GET", "/v2/alpine/tags/list")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .create_async()
        .await;
    let _authorized = challenged_server
        .mock("GET", "/v2/alpine/tags/list")
        .match_header("authorization", "Bearer t")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let direct = Client::new(&direct_server.url())
        .unwrap()
        .get("/v2/alpine/tags/list")
        .await
        .unwrap();
    let retried = client_with(&challenged_server.url(), StaticTokenAuthenticator::new("t"))
        .get("/v2/alpine/tags/list")
        .await
        .unwrap();

    assert_eq!(direct, retried);
}

#[tokio::test]
async fn test_second_401_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let anonymous = server
        .mock("GET", "/v2/_catalog")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let rejected = server
        .mock("GET", "/v2/_catalog")
        .match_header("authorization", "Bearer stale-token")
        .with_status(401)
        .with_body("token expired")
        .expect(1)
        .create_async()
        .await;

    let authenticator = StaticTokenAuthenticator::new("stale-token");
    let client = client_with(&server.url(), authenticator.clone());

    let result = client.get("/v2/_catalog").await;

    anonymous.assert_async().await;
    rejected.assert_async().await;
    assert_eq!(authenticator.calls(), 1);
    match result {
        Err(RegistryError::Http { status, message, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "token expired");
        }
        other => panic!("Expected Http 401, got {:?}", other),
    }
}

#[tokio::test]
async fn test_authenticator_failure_is_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("GET", "/v2/_catalog")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let client = client_with(&server.url(), Arc::new(RefusingAuthenticator));
    let result = client.get("/v2/_catalog").await;

    challenge.assert_async().await;
    assert!(matches!(result, Err(RegistryError::Authentication { .. })));
}

#[tokio::test]
async fn test_401_without_authenticator_is_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("GET", "/v2/_catalog")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let client = Client::new(&server.url()).unwrap();
    let result = client.get("/v2/_catalog").await;

    challenge.assert_async().await;
    assert!(matches!(
        result,
        Err(RegistryError::Authentication {
            status_code: Some(401),
            ..
        })
    ));
}

#[tokio::test]
async fn test_non_success_status_is_http_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/missing/tags/list")
        .with_status(404)
        .with_body(r#"{"errors":[{"code":"NAME_UNKNOWN"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let authenticator = StaticTokenAuthenticator::new("unused");
    let client = client_with(&server.url(), authenticator.clone());
    let result = client.get("/v2/missing/tags/list").await;

    mock.assert_async().await;
    assert_eq!(authenticator.calls(), 0);
    match result {
        Err(RegistryError::Http { status, url, .. }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/v2/missing/tags/list"));
        }
        other => panic!("Expected Http 404, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_after_retry_is_http_error() {
    let mut server = mockito::Server::new_async().await;
    let _challenge = server
        .mock("GET", "/v2/_catalog")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/v2/_catalog")
        .match_header("authorization", "Bearer t")
        .with_status(503)
        .create_async()
        .await;

    let client = client_with(&server.url(), StaticTokenAuthenticator::new("t"));
    let result = client.get("/v2/_catalog").await;

    assert_eq!(result.unwrap_err().status(), Some(503));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::new(&format!("http://{}", addr)).unwrap();
    let result = client.get("/v2/_catalog").await;

    assert!(matches!(result, Err(RegistryError::Network { .. })));
}
