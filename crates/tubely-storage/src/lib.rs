//! Object storage for published assets.
//!
//! This crate provides:
//! - Asset key generation (`{prefix}/{random}.{ext}`)
//! - The [`ObjectPublisher`] trait with S3 and local-filesystem backends
//! - Public URL templating over a configured host
//!
//! A deployment picks exactly one backend at startup via [`create_publisher`].

pub mod client;
pub mod error;
pub mod factory;
pub mod keys;
pub mod local;
pub mod publisher;

pub use client::{S3Config, S3Publisher};
pub use error::{StorageError, StorageResult};
pub use factory::{create_publisher, StorageBackend};
pub use keys::{extension_for, AssetKey};
pub use local::LocalPublisher;
pub use publisher::{ObjectPublisher, UrlTemplate};
