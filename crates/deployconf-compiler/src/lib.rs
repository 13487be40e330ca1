//! # deployconf compiler
//!
//! Expands compact model-family source documents into resolved deployment
//! configuration documents, and compiles optimal-config documents to JSON.

pub mod attributes;
pub mod batch;
pub mod compiler;
pub mod expander;
pub mod fragment;
pub mod io;
pub mod optimal;
pub mod resolver;
pub mod source;
pub mod vendors;

pub use attributes::{build_model_attributes, ResolvedAttributes};
pub use batch::{
    discover_files, run_batch, BatchJob, BatchReport, DocumentCompiler, FileOutcome, FileResult,
    ModelCompiler,
};
pub use compiler::{compile_config, CompileOptions};
pub use expander::Expander;
pub use fragment::{EngineFragment, HardwareFragment, Patch};
pub use optimal::{add_metadata, validate_optimal_config, yaml_to_json, OptimalCompiler};
pub use resolver::{
    build_engine_config, build_hardware_config, build_named_configuration, merge_hardware_config,
    MergedHardware, SchemaLayout,
};
pub use source::{
    CapabilitySuffixKey, ExplicitModelDef, FamilySource, HardwareDefaults, ModelDef,
    QuantOverrideKey, SourceConventions, SourceDocument, VariantModelDef,
};
pub use vendors::VendorRegistry;
