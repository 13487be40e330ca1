//! Single-document compilation

use crate::expander::Expander;
use crate::resolver::SchemaLayout;
use crate::source::{SourceConventions, SourceDocument};
use crate::vendors::VendorRegistry;
use deployconf_types::{validate_document, Result, VendorConfig};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub layout: SchemaLayout,
    pub conventions: SourceConventions,
}

/// Expand a source document into a resolved, validated document
pub fn compile_config(
    source: &SourceDocument,
    vendors: &VendorRegistry,
    options: &CompileOptions,
) -> Result<VendorConfig> {
    let vendor_id = source.vendor_id()?;
    let org = vendors.resolve_org(vendor_id);
    let expander = Expander::new(&org, &source.defaults, options);

    let families = source
        .families
        .iter()
        .map(|family| expander.build_family(family))
        .collect::<Result<Vec<_>>>()?;

    let document = VendorConfig {
        vendor: vendor_id.to_string(),
        families,
    };
    debug!(vendor = %document.vendor, models = document.model_count(), "compiled document");

    let report = validate_document(&document);
    for issue in report.warnings() {
        warn!("{}", issue);
    }
    report.into_result(false)?;

    Ok(document)
}
