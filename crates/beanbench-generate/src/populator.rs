use beanbench_config::FillRates;
use beanbench_core::{EntityGraph, EntityId, Holder, Instance};

use crate::errors::GenerationError;
use crate::random::RandomEngine;

/// Assigns initial field values and builds the instance tree.
#[derive(Debug, Clone, Copy)]
pub struct InstancePopulator {
    fill_rates: FillRates,
    valid_value_probability: f64,
}

impl InstancePopulator {
    pub fn new(fill_rates: FillRates, valid_value_probability: f64) -> Self {
        Self {
            fill_rates,
            valid_value_probability,
        }
    }

    /// Populate every primary entity into the holder, then assign initial
    /// values to base entities.
    pub fn populate(
        &self,
        graph: &mut EntityGraph,
        random: &mut RandomEngine,
    ) -> Result<Holder, GenerationError> {
        let mut holder = Holder::new();

        for id in graph.primary_ids().to_vec() {
            self.assign_initial_values(graph, id, random)?;
            holder.push(self.instantiate(graph, id, 0, random)?);
        }
        for id in graph.base_ids().to_vec() {
            self.assign_initial_values(graph, id, random)?;
        }

        Ok(holder)
    }

    fn assign_initial_values(
        &self,
        graph: &mut EntityGraph,
        id: EntityId,
        random: &mut RandomEngine,
    ) -> Result<(), GenerationError> {
        let entity = graph.require_mut(id)?;
        let qualified_name = entity.qualified_name.clone();

        for field in entity.basic_fields_mut() {
            if field.initial_value.is_some() {
                return Err(GenerationError::InvariantViolation(format!(
                    "{qualified_name}.{} already has an initial value",
                    field.name
                )));
            }
            let pool = if random.chance(self.valid_value_probability) {
                &field.valid_values
            } else {
                &field.invalid_values
            };
            let value = random.pick(pool)?.clone();
            field.initial_value = Some(value);
        }
        Ok(())
    }

    fn instantiate(
        &self,
        graph: &EntityGraph,
        id: EntityId,
        level: u32,
        random: &mut RandomEngine,
    ) -> Result<Instance, GenerationError> {
        let entity = graph.require(id)?;
        let variable = format!("lvl{level}{}_{}", entity.name, random.next_unique_id());
        let mut instance = Instance::new(id, variable, level);

        for field in entity.reference_fields() {
            let nested = if random.should_nest(&self.fill_rates, level) {
                Some(self.instantiate(graph, field.target, level + 1, random)?)
            } else {
                None
            };
            instance.link(field.name.clone(), nested);
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use beanbench_config::{CountRange, GeneratorConfig};

    use super::*;
    use crate::annotator::ConstraintAnnotator;
    use crate::builder::EntityGraphBuilder;
    use crate::catalog::Catalog;

    fn annotated(config: &GeneratorConfig) -> (EntityGraph, RandomEngine) {
        let mut random = RandomEngine::new(config.seed);
        let mut graph = EntityGraphBuilder::new(config).build(&mut random).unwrap();
        let catalog = Catalog::builtin(&config.naming);
        ConstraintAnnotator::new(&catalog, config)
            .annotate_graph(&mut graph, &mut random)
            .unwrap();
        (graph, random)
    }

    fn populator(config: &GeneratorConfig) -> InstancePopulator {
        InstancePopulator::new(config.fill_rates, config.valid_value_probability)
    }

    #[test]
    fn full_fill_rate_nests_to_level_three() {
        let config = GeneratorConfig {
            seed: 42,
            entity_count: 3,
            base_entity_count: 1,
            basic_fields: CountRange::fixed(1),
            reference_fields: CountRange::fixed(1),
            fill_rates: FillRates::uniform(1.0),
            ..GeneratorConfig::default()
        };
        let (mut graph, mut random) = annotated(&config);
        let holder = populator(&config).populate(&mut graph, &mut random).unwrap();

        assert_eq!(holder.len(), 3);
        for top in holder.iter() {
            assert_eq!(top.instance_count(), 4);
            assert_eq!(top.max_level(), 3);
            assert_eq!(top.unset_links(), 1);
        }
    }

    #[test]
    fn zero_fill_rate_leaves_references_unset() {
        let config = GeneratorConfig {
            fill_rates: FillRates::uniform(0.0),
            ..GeneratorConfig::default()
        };
        let (mut graph, mut random) = annotated(&config);
        let holder = populator(&config).populate(&mut graph, &mut random).unwrap();

        assert_eq!(holder.instance_count(), holder.len());
        assert_eq!(holder.max_level(), 0);
        assert_eq!(holder.unset_links(), graph.reference_field_count());
    }

    #[test]
    fn certain_validity_assigns_only_valid_values() {
        let config = GeneratorConfig {
            valid_value_probability: 1.0,
            ..GeneratorConfig::default()
        };
        let (mut graph, mut random) = annotated(&config);
        populator(&config).populate(&mut graph, &mut random).unwrap();

        for entity in graph.entities() {
            for field in entity.basic_fields() {
                let value = field.initial_value.as_ref().expect("initial value");
                assert!(field.valid_values.contains(value));
            }
        }
    }

    #[test]
    fn variable_names_carry_level_and_entity() {
        let config = GeneratorConfig::default();
        let (mut graph, mut random) = annotated(&config);
        let holder = populator(&config).populate(&mut graph, &mut random).unwrap();

        let first = holder.iter().next().unwrap();
        assert!(first.variable.starts_with("lvl0Bean0_"));
        for child in first.children() {
            let entity = graph.require(child.entity).unwrap();
            assert!(child.variable.starts_with(&format!("lvl1{}_", entity.name)));
        }
    }
}
