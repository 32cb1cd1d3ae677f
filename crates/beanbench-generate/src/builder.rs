use tracing::debug;

use beanbench_config::{GeneratorConfig, validate_config};
use beanbench_core::{
    BasicField, EntityGraph, EntityId, EntityRole, Field, ReferenceField, ValueType,
};

use crate::errors::GenerationError;
use crate::random::RandomEngine;

/// Builds the entity graph in three phases: primary entities with basic
/// fields, reference fields between primaries, then base entities and
/// inheritance links.
#[derive(Debug, Clone, Copy)]
pub struct EntityGraphBuilder<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> EntityGraphBuilder<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, random: &mut RandomEngine) -> Result<EntityGraph, GenerationError> {
        ensure_valid_config(self.config)?;

        let mut graph = EntityGraph::new();
        self.add_primary_entities(&mut graph, random)?;
        self.interrelate(&mut graph, random)?;
        self.add_inheritance(&mut graph, random)?;
        Ok(graph)
    }

    fn add_primary_entities(
        &self,
        graph: &mut EntityGraph,
        random: &mut RandomEngine,
    ) -> Result<(), GenerationError> {
        for index in 0..self.config.entity_count {
            self.create_entity(graph, random, format!("Bean{index}"), EntityRole::Primary)?;
        }
        Ok(())
    }

    fn interrelate(
        &self,
        graph: &mut EntityGraph,
        random: &mut RandomEngine,
    ) -> Result<(), GenerationError> {
        let targets = graph.primary_ids().to_vec();
        for &owner in &targets {
            let count = random.uniform_in(self.config.reference_fields)?;
            for index in 0..count {
                let target = *random.pick(&targets)?;
                graph.require_mut(owner)?.add_field(Field::Reference(ReferenceField::new(
                    format!("beanRef{index}"),
                    target,
                )))?;
            }
        }
        Ok(())
    }

    fn add_inheritance(
        &self,
        graph: &mut EntityGraph,
        random: &mut RandomEngine,
    ) -> Result<(), GenerationError> {
        for index in 0..self.config.base_entity_count {
            self.create_entity(graph, random, format!("BaseBean{index}"), EntityRole::Base)?;
        }

        let bases = graph.base_ids().to_vec();
        let primaries = graph.primary_ids().to_vec();
        for id in primaries {
            if random.chance(self.config.inheritance_probability) {
                let parent = *random.pick(&bases)?;
                graph.require_mut(id)?.set_superclass(parent)?;
                debug!(entity = %id, parent = %parent, "inheritance link added");
            }
        }
        Ok(())
    }

    fn create_entity(
        &self,
        graph: &mut EntityGraph,
        random: &mut RandomEngine,
        name: String,
        role: EntityRole,
    ) -> Result<EntityId, GenerationError> {
        let count = random.uniform_in(self.config.basic_fields)?;
        let qualified_name = format!("{}.{name}", self.config.naming.beans_package);
        let id = graph.add_entity(name, qualified_name, role);

        for _ in 0..count {
            let uid = random.next_unique_id();
            let value_type = *random.pick(&ValueType::ALL)?;
            graph
                .require_mut(id)?
                .add_field(Field::Basic(BasicField::new(format!("field{uid}"), value_type)))?;
        }
        Ok(id)
    }
}

/// Reject configs with errors before any random draw happens.
pub(crate) fn ensure_valid_config(config: &GeneratorConfig) -> Result<(), GenerationError> {
    let report = validate_config(config);
    if report.is_ok() {
        Ok(())
    } else {
        Err(GenerationError::Configuration(report.summary()))
    }
}
