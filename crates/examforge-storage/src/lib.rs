//! examforge-storage: Durable storage for test documents.
//!
//! Inline binary payloads are offloaded to a [`BlobStore`] on save and the
//! document itself goes to a [`DocumentStore`]. In-memory and filesystem
//! backends are provided.

pub mod config;
pub mod data_uri;
pub mod error;
pub mod fs;
pub mod memory;
pub mod paths;
pub mod service;
pub mod traits;

pub use config::StorageConfig;
pub use error::StorageError;
pub use service::TestStorage;
pub use traits::{BlobStore, DocumentStore};
