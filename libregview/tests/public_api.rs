use libregview::catalog::{STANDALONE_KEY, namespace_key};
use libregview::{ClientConfig, Credentials, RegistryError, Settings, Viewer};

#[test]
fn test_viewer_builder_accepts_full_configuration() {
    let viewer = Viewer::builder()
        .registry_url("registry.example.com")
        .client_config(ClientConfig::new().with_disable_compression(true))
        .credentials(Credentials::basic("user", "pass"))
        .account_management(true)
        .build()
        .unwrap();

    assert_eq!(viewer.registry_url(), "http://registry.example.com");
}

#[test]
fn test_namespace_key_is_public() {
    assert_eq!(namespace_key("library/nginx"), "library");
    assert_eq!(namespace_key("standalone"), STANDALONE_KEY);
}

#[test]
fn test_settings_validation_surfaces_config_error() {
    let err = Viewer::from_settings(&Settings::default()).unwrap_err();
    assert!(matches!(err, RegistryError::Config { .. }));
    assert!(err.to_string().contains("no registry uri provided"));
}

#[test]
fn test_version_is_reported() {
    assert_eq!(libregview::version(), env!("CARGO_PKG_VERSION"));
}
