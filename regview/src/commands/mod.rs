/// Catalog command handlers
pub mod catalog;

/// Version command handlers
pub mod version;
