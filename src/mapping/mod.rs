//! Property-path migration: rewrite legacy member accesses to new paths.
//!
//! Rules are ranked by how much context they carry. For each access the
//! engine rebuilds the qualifier chain from the syntax tree, picks the most
//! specific agreeing rule and replaces the member name with the rule's
//! target path.

pub mod context;
pub mod detector;
pub mod engine;
pub mod errors;
pub mod rule;
pub mod validate;

pub use context::AccessContext;
pub use detector::MappingDetector;
pub use engine::{MappingEngine, MappingMode, MappingOptions, MappingOutcome};
pub use errors::MappingError;
pub use rule::MappingRule;
pub use validate::{types_compatible, validate_rules, ValidationIssue};
