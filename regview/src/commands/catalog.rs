use crate::context::AppContext;
use crate::format::{self, OutputFormat};
use libregview::{Catalog, Settings, Viewer};
use tracing::{debug, info};

/// Fetch the catalog described by `settings`
pub async fn fetch_catalog(settings: &Settings) -> libregview::Result<Catalog> {
    let viewer = Viewer::from_settings(settings)?;
    info!(registry = viewer.registry_url(), "Fetching catalog");
    viewer.fetch_catalog().await
}

/// Render a fetched catalog in the requested format
pub fn render_catalog(catalog: &Catalog, format: OutputFormat) -> Result<String, String> {
    format::format_output(catalog, format)
}

/// Handle the catalog command
pub fn handle_catalog(ctx: &AppContext, format: OutputFormat) {
    debug!(verbosity = ?ctx.verbosity, ?format, "Running catalog command");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            format::error(ctx.color, &format!("Failed to start runtime: {}", e));
            std::process::exit(1);
        }
    };

    let catalog = match runtime.block_on(fetch_catalog(&ctx.settings)) {
        Ok(catalog) => catalog,
        Err(e) => {
            format::error(ctx.color, &format!("Failed to fetch catalog: {}", e));
            std::process::exit(1);
        }
    };

    match render_catalog(&catalog, format) {
        Ok(output) if format == OutputFormat::Json => println!("{}", output),
        Ok(output) => print!("{}", output),
        Err(e) => {
            format::error(ctx.color, &e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
