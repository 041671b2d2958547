use super::*;

#[test]
fn test_version_contains_package_name() {
    let output = get_version_string();
    assert!(output.starts_with("regview "));
}

#[test]
fn test_version_contains_version_number() {
    let output = get_version_string();
    assert!(output.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_contains_library_version() {
    let output = get_version_string();
    assert!(output.contains(&format!("libregview {}", libregview::version())));
}
