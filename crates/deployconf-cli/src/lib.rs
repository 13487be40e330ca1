//! # deployconf CLI library
//!
//! Command-line front end for deployment-configuration tooling.
//!
//! ## Commands
//!
//! - `compile`: Expand model-family sources into resolved documents
//! - `optimal`: Compile optimal-config sources to JSON
//! - `validate`: Check resolved documents
//! - `diff`: Summarize changes between two resolved documents
//! - `config`: Show, validate or generate `deployconf.toml`

pub mod commands;
pub mod config;
pub mod output;
pub mod utils;

// Re-exports
pub use config::CliConfig;
