//! Schema acquisition and fact extraction.
//!
//! The schema is read-only input: a JSON document with a `$defs` map plus a
//! companion constants file. This crate is *tolerant* the same way the rest
//! of the pipeline expects its inputs to be: unmatched constant lines
//! contribute no codes and malformed definitions are skipped, but a missing
//! schema file is fatal and the error names the expected path.

mod extract;
mod source;

pub use extract::{
    extract_capabilities, extract_deprecated, extract_enums, extract_error_codes, extract_facts,
    extract_methods, extract_notifications, extract_types, method_const, union_members,
};
pub use source::{
    AcquireOptions, SchemaError, acquire_spec, load_schema, schema_path, DEFAULT_SPEC_REPO_URL,
};
