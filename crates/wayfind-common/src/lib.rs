pub mod formatter;
pub mod protocol;
pub mod strategy;

pub mod catalog {
    pub mod definition;
    pub mod loader;
    pub mod registry;

    pub use definition::{ActionKind, IntentDefinition, MetadataSelector};
    pub use loader::{CatalogError, CatalogLoader};
    pub use registry::IntentCatalog;
}
