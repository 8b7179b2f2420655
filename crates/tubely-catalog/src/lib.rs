//! Video catalog.
//!
//! This crate provides:
//! - The [`VideoCatalog`] interface the upload pipeline reads and updates records through
//! - [`MemoryCatalog`], an in-process catalog optionally seeded from a JSON file

pub mod error;
pub mod memory;
pub mod repo;

pub use error::{CatalogError, CatalogResult};
pub use memory::MemoryCatalog;
pub use repo::VideoCatalog;
