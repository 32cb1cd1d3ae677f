//! Generator configuration contract and validation.

pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{ConfigError, IssueSeverity, Result, ValidationIssue, ValidationReport};
pub use model::{CONFIG_VERSION, CountRange, FillRates, GeneratorConfig, Naming};
pub use schema::config_json_schema;
pub use validate::{load_config, parse_config_json, validate_config, validate_config_json};
