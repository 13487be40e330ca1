//! Core type definitions for deployment-configuration documents
//!
//! This crate holds the resolved document schema (vendor, family, model,
//! hardware, named configuration), the construction-time invariants those
//! types enforce, the whole-document validator, and the shared error type.
//! It sits at the bottom of the workspace and depends on no other member.

pub mod errors;
pub mod scalar;
pub mod schema;
pub mod validation;

pub use errors::*;
pub use schema::*;
pub use validation::*;

/// Result type used throughout deployconf
pub type Result<T> = std::result::Result<T, DeployConfError>;
