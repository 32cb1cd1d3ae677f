use std::fs;
use std::path::Path;

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::errors::{ConfigError, Result, ValidationIssue, ValidationReport};
use crate::model::{CONFIG_VERSION, CountRange, GeneratorConfig};
use crate::schema::config_json_schema;

/// Validate a config JSON document against the config JSON Schema.
pub fn validate_config_json(config_json: &Value) -> Result<ValidationReport> {
    let schema = serde_json::to_value(config_json_schema())?;
    let compiled = JSONSchema::compile(&schema).map_err(|err| ConfigError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(config_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Check value ranges and cross-field consistency of a parsed config.
pub fn validate_config(config: &GeneratorConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.config_version != CONFIG_VERSION {
        report.push(ValidationIssue::warning(
            "config_version_mismatch",
            "/config_version",
            format!(
                "config_version '{}' differs from supported '{CONFIG_VERSION}'",
                config.config_version
            ),
        ));
    }

    validate_count(&mut report, "/entity_count", config.entity_count);
    validate_count(&mut report, "/base_entity_count", config.base_entity_count);
    validate_range(&mut report, "/basic_fields", config.basic_fields);
    validate_range(&mut report, "/reference_fields", config.reference_fields);

    for (level, rate) in config.fill_rates.levels() {
        validate_probability(&mut report, &format!("/fill_rates/level{level}"), rate);
    }
    validate_probability(&mut report, "/group_probability", config.group_probability);
    validate_probability(
        &mut report,
        "/valid_value_probability",
        config.valid_value_probability,
    );
    validate_probability(
        &mut report,
        "/inheritance_probability",
        config.inheritance_probability,
    );

    if config.group_count == 0 && config.group_probability > 0.0 {
        report.push(ValidationIssue::error(
            "missing_groups",
            "/group_count",
            "group_probability is positive but no groups are configured",
            Some("set group_count >= 1 or group_probability = 0".to_string()),
        ));
    }

    let naming = &config.naming;
    for (path, value) in [
        ("/naming/beans_package", &naming.beans_package),
        ("/naming/groups_package", &naming.groups_package),
        ("/naming/base_package", &naming.base_package),
    ] {
        if value.trim().is_empty() {
            report.push(ValidationIssue::error(
                "empty_package",
                path,
                "package name must not be empty",
                None,
            ));
        }
    }

    if config.fill_rates.level0 == 0.0
        && (config.fill_rates.level1 > 0.0 || config.fill_rates.level2 > 0.0)
    {
        report.push(ValidationIssue::warning(
            "unreachable_fill_rate",
            "/fill_rates",
            "level0 fill rate is zero; deeper levels are never reached",
        ));
    }

    report
}

/// Parse a JSON config, checking it against the schema first.
pub fn parse_config_json(config_json: Value) -> Result<GeneratorConfig> {
    let structural = validate_config_json(&config_json)?;
    if !structural.is_ok() {
        return Err(ConfigError::Invalid(structural));
    }
    Ok(serde_json::from_value(config_json)?)
}

/// Load and validate a config from a `.toml` or `.json` file.
pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    let contents = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let config = match extension.as_deref() {
        Some("toml") => toml::from_str::<GeneratorConfig>(&contents)?,
        Some("json") => parse_config_json(serde_json::from_str(&contents)?)?,
        other => {
            return Err(ConfigError::Format(
                other.unwrap_or("<none>").to_string(),
            ));
        }
    };

    let report = validate_config(&config);
    if !report.is_ok() {
        return Err(ConfigError::Invalid(report));
    }
    Ok(config)
}

fn validate_count(report: &mut ValidationReport, path: &str, value: u32) {
    if value == 0 {
        report.push(ValidationIssue::error(
            "non_positive_count",
            path,
            "count must be positive",
            None,
        ));
    }
}

fn validate_range(report: &mut ValidationReport, path: &str, range: CountRange) {
    if range.max == 0 {
        report.push(ValidationIssue::error(
            "non_positive_range",
            format!("{path}/max"),
            "range max must be positive",
            None,
        ));
    }
    if range.min > range.max {
        report.push(ValidationIssue::error(
            "invalid_range",
            path,
            format!("min {} exceeds max {}", range.min, range.max),
            Some("ranges are [min, max); use min == max to pin a count".to_string()),
        ));
    }
}

fn validate_probability(report: &mut ValidationReport, path: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        report.push(ValidationIssue::error(
            "probability_out_of_range",
            path,
            format!("probability {value} is outside [0, 1]"),
            None,
        ));
    }
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FillRates;

    #[test]
    fn default_config_is_valid() {
        let report = validate_config(&GeneratorConfig::default());
        assert!(report.is_ok(), "{}", report.summary());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn reports_inverted_range_and_zero_counts() {
        let config = GeneratorConfig {
            entity_count: 0,
            basic_fields: CountRange::new(5, 2),
            ..GeneratorConfig::default()
        };
        let report = validate_config(&config);
        assert!(report.has_code("non_positive_count"));
        assert!(report.has_code("invalid_range"));
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn nan_probability_is_rejected() {
        let config = GeneratorConfig {
            fill_rates: FillRates::uniform(f64::NAN),
            ..GeneratorConfig::default()
        };
        let report = validate_config(&config);
        assert_eq!(
            report
                .errors
                .iter()
                .filter(|issue| issue.code == "probability_out_of_range")
                .count(),
            3
        );
    }

    #[test]
    fn groups_required_when_tagging_is_possible() {
        let config = GeneratorConfig {
            group_count: 0,
            group_probability: 0.5,
            ..GeneratorConfig::default()
        };
        assert!(validate_config(&config).has_code("missing_groups"));

        let config = GeneratorConfig {
            group_count: 0,
            group_probability: 0.0,
            ..GeneratorConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
