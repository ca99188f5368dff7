//! examforge-providers: Hosted model integrations and content flows.
//!
//! Implements the `ModelProvider` trait for OpenAI-compatible APIs (plus a
//! mock for tests) and builds the passage, question, image, and speech
//! flows on top of it.

pub mod audio;
pub mod config;
pub mod flows;
pub mod mock;
pub mod openai;

pub use config::{create_provider, ModelsConfig, ProviderConfig};
pub use flows::ContentFlows;
