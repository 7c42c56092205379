pub mod loader;
pub mod runner;
pub mod schema;

pub use loader::{load_from_path, load_from_str, load_json_from_str, ConfigError};
pub use runner::{output_path, run_on_file, run_on_text, FileReport, RunError};
pub use schema::{
    MappingSection, Metadata, RefactorConfig, Transformation, ValidationError, ValidationIssue,
};
