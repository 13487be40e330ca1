//! Validated in-memory editing of resolved deployment-configuration documents
//!
//! An [`EditSession`] owns one vendor document. Mutations are checked and
//! rolled back on failure; `save` validates and writes the file in one step
//! and reports what changed.

pub mod freeform;
pub mod session;
pub mod store;
pub mod summary;

pub use freeform::{configuration_edit_template, parse_configuration_yaml};
pub use session::{ConfigTarget, EditSession};
pub use store::{
    list_vendor_files, load_document, load_raw_document, sanitize_vendor_name, save_document,
    vendor_file_path,
};
pub use summary::{generate_change_summary, ChangeSummary};
