/// Get the version string for regview and libregview
pub fn get_version_string() -> String {
    format!(
        "regview {}\nlibregview {}",
        env!("CARGO_PKG_VERSION"),
        libregview::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
