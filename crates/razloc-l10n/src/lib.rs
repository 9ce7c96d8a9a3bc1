//! Resource keys, the in-memory resource catalog and its on-disk stores.

pub mod catalog;
pub mod keys;
pub mod lang;
pub mod store;

pub use catalog::ResourceCatalog;
pub use keys::{LOCALIZER, humanize, is_valid_key, synthesize};
pub use store::{CatalogStore, ResxStore};
