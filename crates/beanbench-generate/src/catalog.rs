use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use beanbench_config::Naming;
use beanbench_core::{
    ConstraintDefinition, ConstraintDescriptor, ConstraintKind, ParamValue, SampleValue,
    ValueType,
};

use crate::errors::GenerationError;

const MESSAGE_PARAM: &str = "message";

/// Descriptors applied together to a basic field, with sample values that
/// satisfy and violate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorBundle {
    pub descriptors: Vec<ConstraintDescriptor>,
    pub valid_values: Vec<SampleValue>,
    pub invalid_values: Vec<SampleValue>,
}

impl DescriptorBundle {
    pub fn new(
        descriptors: Vec<ConstraintDescriptor>,
        valid_values: Vec<SampleValue>,
        invalid_values: Vec<SampleValue>,
    ) -> Self {
        Self {
            descriptors,
            valid_values,
            invalid_values,
        }
    }
}

/// Constraint catalog consulted by the annotator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Candidate bundles per basic value type.
    pub basic: BTreeMap<ValueType, Vec<DescriptorBundle>>,
    /// Presence descriptors for reference fields; one is picked per field.
    pub reference: Vec<ConstraintDescriptor>,
    /// Cascade marker attached to every reference field.
    pub cascade: ConstraintDescriptor,
    /// Class-level descriptor attached to every entity.
    pub entity: ConstraintDescriptor,
    /// Composite constraint types referenced by the descriptors above.
    pub definitions: Vec<ConstraintDefinition>,
}

impl Catalog {
    /// The stock catalog: text and integer bundles, presence descriptors
    /// for references and the always-valid class marker.
    pub fn builtin(naming: &Naming) -> Self {
        let good_code = ConstraintKind::composed("GoodCode");
        let ranged_int = ConstraintKind::composed("RangedInt");
        let always_valid = ConstraintKind::composed("AlwaysValid");

        let not_null = || {
            ConstraintDescriptor::new(ConstraintKind::NotNull)
                .with_param(MESSAGE_PARAM, ParamValue::text("cannot be null"))
        };
        let bounded = DescriptorBundle::new(
            vec![
                ConstraintDescriptor::new(ConstraintKind::Min)
                    .with_param(MESSAGE_PARAM, ParamValue::text("must be bigger than {value}"))
                    .with_param("value", ParamValue::Int(100)),
                ConstraintDescriptor::new(ConstraintKind::Max)
                    .with_param(MESSAGE_PARAM, ParamValue::text("must be less than {value}"))
                    .with_param("value", ParamValue::Int(200)),
            ],
            vec![SampleValue::Int(155)],
            vec![SampleValue::Int(-100), SampleValue::Int(4000)],
        );
        let ranged = DescriptorBundle::new(
            vec![ConstraintDescriptor::new(ranged_int.clone())],
            vec![SampleValue::Int(2500), SampleValue::Int(3000)],
            vec![SampleValue::Int(-20), SampleValue::Int(40_000_000)],
        );

        let text = vec![
            DescriptorBundle::new(
                vec![not_null()],
                vec![SampleValue::text("good")],
                vec![SampleValue::Null],
            ),
            DescriptorBundle::new(
                vec![
                    not_null(),
                    ConstraintDescriptor::new(ConstraintKind::Size)
                        .with_param("min", ParamValue::Int(6))
                        .with_param("max", ParamValue::Int(12)),
                ],
                vec![SampleValue::text("goodgood")],
                vec![SampleValue::Null, SampleValue::text("bad")],
            ),
            DescriptorBundle::new(
                vec![ConstraintDescriptor::new(good_code)],
                vec![SampleValue::text("goodcode"), SampleValue::text("1234123")],
                vec![
                    SampleValue::Null,
                    SampleValue::text("bad"),
                    SampleValue::text("acodetoolong"),
                ],
            ),
        ];
        let integer = vec![
            DescriptorBundle::new(
                vec![not_null()],
                vec![SampleValue::Int(3)],
                vec![SampleValue::Null],
            ),
            bounded.clone(),
            ranged.clone(),
        ];
        // Primitive ints cannot hold null, so only the bounded bundles apply.
        let int = vec![bounded, ranged];

        let basic = BTreeMap::from([
            (ValueType::Text, text),
            (ValueType::Integer, integer),
            (ValueType::Int, int),
        ]);

        Self {
            basic,
            reference: vec![
                ConstraintDescriptor::new(ConstraintKind::NotNull),
                ConstraintDescriptor::new(ConstraintKind::Null),
            ],
            cascade: ConstraintDescriptor::new(ConstraintKind::Valid),
            entity: ConstraintDescriptor::new(always_valid),
            definitions: builtin_definitions(naming),
        }
    }

    /// Bundles available for a value type.
    pub fn bundles_for(&self, value_type: ValueType) -> Result<&[DescriptorBundle], GenerationError> {
        self.basic
            .get(&value_type)
            .map(Vec::as_slice)
            .filter(|bundles| !bundles.is_empty())
            .ok_or_else(|| {
                GenerationError::Configuration(format!(
                    "catalog has no descriptor bundles for type {value_type}"
                ))
            })
    }

    pub fn definition(&self, kind: &ConstraintKind) -> Option<&ConstraintDefinition> {
        self.definitions
            .iter()
            .find(|definition| &definition.kind() == kind)
    }

    /// Check that the catalog can annotate any graph the builder produces.
    pub fn validate(&self) -> Result<(), GenerationError> {
        for value_type in ValueType::ALL {
            for (index, bundle) in self.bundles_for(value_type)?.iter().enumerate() {
                let location = format!("{value_type} bundle {index}");
                if bundle.descriptors.is_empty() {
                    return Err(GenerationError::Configuration(format!(
                        "{location} has no descriptors"
                    )));
                }
                if bundle.valid_values.is_empty() || bundle.invalid_values.is_empty() {
                    return Err(GenerationError::Configuration(format!(
                        "{location} needs both valid and invalid sample values"
                    )));
                }
                if let Some(value) = bundle
                    .valid_values
                    .iter()
                    .find(|value| bundle.invalid_values.contains(value))
                {
                    return Err(GenerationError::Configuration(format!(
                        "{location} lists {value} as both valid and invalid"
                    )));
                }
                if let Some(value) = bundle
                    .valid_values
                    .iter()
                    .chain(bundle.invalid_values.iter())
                    .find(|value| !value.fits(value_type))
                {
                    return Err(GenerationError::Configuration(format!(
                        "{location} sample {value} does not fit type {value_type}"
                    )));
                }
            }
        }

        if self.reference.is_empty() {
            return Err(GenerationError::Configuration(
                "catalog has no reference descriptors".to_string(),
            ));
        }
        if let Some(descriptor) = self
            .reference
            .iter()
            .find(|descriptor| !matches!(descriptor.kind, ConstraintKind::NotNull | ConstraintKind::Null))
        {
            return Err(GenerationError::Configuration(format!(
                "reference descriptor {} is not a presence constraint",
                descriptor.kind
            )));
        }
        if self.cascade.kind != ConstraintKind::Valid {
            return Err(GenerationError::Configuration(format!(
                "cascade descriptor must be Valid, got {}",
                self.cascade.kind
            )));
        }
        if !self.entity.kind.is_composed() {
            return Err(GenerationError::Configuration(format!(
                "class-level descriptor {} is not a composed constraint",
                self.entity.kind
            )));
        }

        let composed = self
            .basic
            .values()
            .flatten()
            .flat_map(|bundle| bundle.descriptors.iter())
            .chain(std::iter::once(&self.entity))
            .map(|descriptor| &descriptor.kind)
            .filter(|kind| kind.is_composed());
        for kind in composed {
            if self.definition(kind).is_none() {
                return Err(GenerationError::Configuration(format!(
                    "composed constraint {kind} has no definition"
                )));
            }
        }

        Ok(())
    }
}

fn builtin_definitions(naming: &Naming) -> Vec<ConstraintDefinition> {
    let qualified = |name: &str| format!("{}.annot.{name}", naming.base_package);

    vec![
        ConstraintDefinition {
            name: "GoodCode".to_string(),
            qualified_name: qualified("GoodCode"),
            composed_of: vec![
                ConstraintDescriptor::new(ConstraintKind::Pattern)
                    .with_param("regexp", ParamValue::text(".*")),
                ConstraintDescriptor::new(ConstraintKind::Size).with_param("min", ParamValue::Int(5)),
                ConstraintDescriptor::new(ConstraintKind::Size).with_param("max", ParamValue::Int(8)),
                ConstraintDescriptor::new(ConstraintKind::NotNull),
            ],
            report_as_single_violation: false,
            validated_by: Vec::new(),
        },
        ConstraintDefinition {
            name: "RangedInt".to_string(),
            qualified_name: qualified("RangedInt"),
            composed_of: vec![
                ConstraintDescriptor::new(ConstraintKind::Max).with_param("value", ParamValue::Int(3000)),
                ConstraintDescriptor::new(ConstraintKind::Min).with_param("value", ParamValue::Int(1000)),
            ],
            report_as_single_violation: true,
            validated_by: Vec::new(),
        },
        ConstraintDefinition {
            name: "AlwaysValid".to_string(),
            qualified_name: qualified("AlwaysValid"),
            composed_of: Vec::new(),
            report_as_single_violation: false,
            validated_by: vec![format!("{}.AlwaysValidValidator", qualified("AlwaysValid"))],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        Catalog::builtin(&Naming::default())
            .validate()
            .expect("builtin catalog");
    }

    #[test]
    fn primitive_ints_never_sample_null() {
        let catalog = Catalog::builtin(&Naming::default());
        let bundles = catalog.bundles_for(ValueType::Int).unwrap();
        assert_eq!(bundles.len(), 2);
        assert!(
            bundles
                .iter()
                .flat_map(|bundle| bundle.valid_values.iter().chain(&bundle.invalid_values))
                .all(|value| !value.is_null())
        );
    }

    #[test]
    fn definitions_are_qualified_under_base_package() {
        let naming = Naming {
            base_package: "org.example".to_string(),
            ..Naming::default()
        };
        let catalog = Catalog::builtin(&naming);
        let ranged = catalog
            .definition(&ConstraintKind::composed("RangedInt"))
            .expect("RangedInt definition");
        assert_eq!(ranged.qualified_name, "org.example.annot.RangedInt");
        assert!(ranged.report_as_single_violation);
    }

    #[test]
    fn rejects_bundle_with_overlapping_samples() {
        let mut catalog = Catalog::builtin(&Naming::default());
        if let Some(bundles) = catalog.basic.get_mut(&ValueType::Text) {
            bundles[0].invalid_values.push(SampleValue::text("good"));
        }
        assert!(matches!(
            catalog.validate(),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_missing_definition() {
        let mut catalog = Catalog::builtin(&Naming::default());
        catalog.definitions.retain(|definition| definition.name != "GoodCode");
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn rejects_null_sample_for_primitive_int() {
        let mut catalog = Catalog::builtin(&Naming::default());
        if let Some(bundles) = catalog.basic.get_mut(&ValueType::Int) {
            bundles[0].invalid_values.push(SampleValue::Null);
        }
        assert!(catalog.validate().is_err());
    }
}
