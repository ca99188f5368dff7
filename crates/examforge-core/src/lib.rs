//! examforge-core: Test document model, tree editing, and scoring.
//!
//! This crate defines the test document data model and its consistency
//! rules, the curriculum knowledge base, and the contracts the content
//! generation flows are written against.

pub mod editor;
pub mod error;
pub mod flows;
pub mod ids;
pub mod knowledge;
pub mod model;
pub mod parser;
pub mod statistics;
pub mod traits;
pub mod validate;
pub mod words;
