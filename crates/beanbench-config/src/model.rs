use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Contract version for generator config files.
pub const CONFIG_VERSION: &str = "0.1";

/// Half-open count range `[min, max)`; `min == max` pins the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(count: u32) -> Self {
        Self {
            min: count,
            max: count,
        }
    }
}

/// Probability of filling a reference field at each nesting level.
///
/// Nesting stops unconditionally at level 3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct FillRates {
    pub level0: f64,
    pub level1: f64,
    pub level2: f64,
}

impl FillRates {
    pub const fn uniform(rate: f64) -> Self {
        Self {
            level0: rate,
            level1: rate,
            level2: rate,
        }
    }

    pub fn for_level(&self, level: u32) -> Option<f64> {
        match level {
            0 => Some(self.level0),
            1 => Some(self.level1),
            2 => Some(self.level2),
            _ => None,
        }
    }

    pub fn levels(&self) -> [(u32, f64); 3] {
        [(0, self.level0), (1, self.level1), (2, self.level2)]
    }
}

impl Default for FillRates {
    fn default() -> Self {
        Self {
            level0: 0.8,
            level1: 0.5,
            level2: 0.25,
        }
    }
}

/// Package names used to qualify generated types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Naming {
    pub beans_package: String,
    pub groups_package: String,
    pub base_package: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            beans_package: "bench.generated.beans".to_string(),
            groups_package: "bench.generated.groups".to_string(),
            base_package: "bench.generated".to_string(),
        }
    }
}

/// Canonical generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Contract version for the config format.
    pub config_version: String,
    /// Seed for reproducibility.
    pub seed: u64,
    /// Number of primary entities.
    pub entity_count: u32,
    /// Number of base entities used as inheritance roots.
    pub base_entity_count: u32,
    /// Basic fields per entity.
    pub basic_fields: CountRange,
    /// Reference fields per primary entity.
    pub reference_fields: CountRange,
    /// Number of validation groups available to the annotator.
    pub group_count: u32,
    /// Nested-instance fill rate per level.
    pub fill_rates: FillRates,
    /// Probability that an entity's field constraints are tagged with groups.
    pub group_probability: f64,
    /// Probability that a basic field starts with a valid value.
    pub valid_value_probability: f64,
    /// Probability that a primary entity extends a base entity.
    pub inheritance_probability: f64,
    pub naming: Naming,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION.to_string(),
            seed: 1,
            entity_count: 30,
            base_entity_count: 5,
            basic_fields: CountRange::new(2, 8),
            reference_fields: CountRange::new(1, 4),
            group_count: 4,
            fill_rates: FillRates::default(),
            group_probability: 0.3,
            valid_value_probability: 0.8,
            inheritance_probability: 0.25,
            naming: Naming::default(),
        }
    }
}
