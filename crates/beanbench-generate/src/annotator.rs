use std::collections::BTreeSet;

use beanbench_config::GeneratorConfig;
use beanbench_core::{
    BasicField, ConstraintDescriptor, ConstraintKind, DescriptorSet, Entity, EntityGraph,
    EntityId, Field, Group, GroupId, ParamValue, ReferenceField, VALUE_PARAM,
};

use crate::catalog::Catalog;
use crate::errors::GenerationError;
use crate::random::RandomEngine;

/// Counters collected while annotating a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    /// Entities whose descriptors were tagged with groups.
    pub tagged_entities: usize,
    /// Field descriptors restricted to a group.
    pub tagged_descriptors: usize,
    pub group_sequences: usize,
}

/// Attaches catalog descriptors to every field and entity of a graph.
#[derive(Debug, Clone)]
pub struct ConstraintAnnotator<'a> {
    catalog: &'a Catalog,
    groups: Vec<Group>,
    group_probability: f64,
}

impl<'a> ConstraintAnnotator<'a> {
    pub fn new(catalog: &'a Catalog, config: &GeneratorConfig) -> Self {
        let groups = (0..config.group_count as usize)
            .map(|index| {
                let name = format!("Group{index}");
                Group {
                    id: GroupId(index),
                    qualified_name: format!("{}.{name}", config.naming.groups_package),
                    name,
                }
            })
            .collect();

        Self {
            catalog,
            groups,
            group_probability: config.group_probability,
        }
    }

    /// Validation groups available for tagging, ordered by id.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Annotate primary entities, then base entities.
    pub fn annotate_graph(
        &self,
        graph: &mut EntityGraph,
        random: &mut RandomEngine,
    ) -> Result<AnnotationSummary, GenerationError> {
        let mut summary = AnnotationSummary::default();
        for id in graph.traversal_order() {
            self.annotate_entity(graph, id, random, &mut summary)?;
        }
        Ok(summary)
    }

    fn annotate_entity(
        &self,
        graph: &mut EntityGraph,
        id: EntityId,
        random: &mut RandomEngine,
        summary: &mut AnnotationSummary,
    ) -> Result<(), GenerationError> {
        let tag_groups = random.chance(self.group_probability);
        let entity = graph.require_mut(id)?;

        let mut used = BTreeSet::new();
        let mut tagged = 0;
        for field in entity.fields.iter_mut() {
            tagged += match field {
                Field::Basic(field) => self.annotate_basic(field, tag_groups, random, &mut used)?,
                Field::Reference(field) => {
                    self.annotate_reference(field, tag_groups, random, &mut used)?
                }
            };
        }
        for group in used {
            entity.add_group(group);
        }
        if tag_groups {
            summary.tagged_entities += 1;
        }
        summary.tagged_descriptors += tagged;

        entity.descriptors.attach(self.catalog.entity.clone());
        if !entity.groups.is_empty() {
            let sequence = self.group_sequence(entity)?;
            entity.descriptors.attach(sequence);
            summary.group_sequences += 1;
        }
        Ok(())
    }

    /// Returns the number of group-tagged descriptors attached.
    fn annotate_basic(
        &self,
        field: &mut BasicField,
        tag_groups: bool,
        random: &mut RandomEngine,
        used: &mut BTreeSet<GroupId>,
    ) -> Result<usize, GenerationError> {
        if field.is_annotated() {
            return Err(GenerationError::InvariantViolation(format!(
                "field '{}' is already annotated",
                field.name
            )));
        }

        let bundle = random.pick(self.catalog.bundles_for(field.value_type)?)?;
        // One group per field; every copied descriptor carries it.
        let group = self.pick_group(tag_groups, random)?;
        let mut tagged = 0;
        for descriptor in &bundle.descriptors {
            tagged += attach_tagged(&mut field.descriptors, descriptor.clone(), group, used);
        }
        field.valid_values = bundle.valid_values.clone();
        field.invalid_values = bundle.invalid_values.clone();
        Ok(tagged)
    }

    fn annotate_reference(
        &self,
        field: &mut ReferenceField,
        tag_groups: bool,
        random: &mut RandomEngine,
        used: &mut BTreeSet<GroupId>,
    ) -> Result<usize, GenerationError> {
        field.descriptors.attach(self.catalog.cascade.clone());

        let descriptor = random.pick(&self.catalog.reference)?.clone();
        let group = self.pick_group(tag_groups, random)?;
        Ok(attach_tagged(&mut field.descriptors, descriptor, group, used))
    }

    fn pick_group(
        &self,
        tag_groups: bool,
        random: &mut RandomEngine,
    ) -> Result<Option<&Group>, GenerationError> {
        if !tag_groups {
            return Ok(None);
        }
        Ok(Some(random.pick(&self.groups)?))
    }

    // Registered groups in id order, followed by the entity itself.
    fn group_sequence(&self, entity: &Entity) -> Result<ConstraintDescriptor, GenerationError> {
        let mut members = Vec::with_capacity(entity.groups.len() + 1);
        for id in &entity.groups {
            let group = self.groups.get(id.0).ok_or_else(|| {
                GenerationError::InvariantViolation(format!(
                    "entity {} registers unknown group {}",
                    entity.qualified_name, id.0
                ))
            })?;
            members.push(ParamValue::type_ref(group.qualified_name.clone()));
        }
        members.push(ParamValue::type_ref(entity.qualified_name.clone()));

        Ok(ConstraintDescriptor::new(ConstraintKind::GroupSequence)
            .with_param(VALUE_PARAM, ParamValue::Array(members)))
    }
}

// Groups are recorded only for descriptors that were actually attached.
fn attach_tagged(
    descriptors: &mut DescriptorSet,
    mut descriptor: ConstraintDescriptor,
    group: Option<&Group>,
    used: &mut BTreeSet<GroupId>,
) -> usize {
    if let Some(group) = group {
        descriptor.set_group(group);
    }
    let attached = descriptors.attach(descriptor);
    match group {
        Some(group) if attached => {
            used.insert(group.id);
            1
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use beanbench_config::CountRange;
    use beanbench_core::{EntityRole, validate_annotations};

    use super::*;
    use crate::builder::EntityGraphBuilder;

    fn built(config: &GeneratorConfig, seed: u64) -> (EntityGraph, RandomEngine) {
        let mut random = RandomEngine::new(seed);
        let graph = EntityGraphBuilder::new(config).build(&mut random).unwrap();
        (graph, random)
    }

    #[test]
    fn annotated_graph_satisfies_bookkeeping_checks() {
        let config = GeneratorConfig::default();
        let catalog = Catalog::builtin(&config.naming);
        let (mut graph, mut random) = built(&config, 21);

        let annotator = ConstraintAnnotator::new(&catalog, &config);
        annotator.annotate_graph(&mut graph, &mut random).unwrap();
        validate_annotations(&graph, annotator.groups()).unwrap();
    }

    #[test]
    fn basic_field_descriptors_share_one_group() {
        let config = GeneratorConfig {
            group_probability: 1.0,
            group_count: 8,
            basic_fields: CountRange::fixed(5),
            ..GeneratorConfig::default()
        };
        let catalog = Catalog::builtin(&config.naming);
        let (mut graph, mut random) = built(&config, 31);

        let annotator = ConstraintAnnotator::new(&catalog, &config);
        let summary = annotator.annotate_graph(&mut graph, &mut random).unwrap();

        let mut attached = 0;
        for entity in graph.entities() {
            for field in entity.basic_fields() {
                let first = field.descriptors.iter().next().expect("descriptor");
                let group = first.groups();
                assert_eq!(group.len(), 1, "{}", field.name);
                for descriptor in field.descriptors.iter() {
                    assert_eq!(descriptor.groups(), group, "{}", field.name);
                    attached += 1;
                }
            }
            attached += entity.reference_fields().count();
        }
        assert_eq!(summary.tagged_descriptors, attached);
        validate_annotations(&graph, annotator.groups()).unwrap();
    }

    #[test]
    fn reference_only_entity_registers_exactly_its_reference_groups() {
        let config = GeneratorConfig {
            group_probability: 1.0,
            group_count: 8,
            ..GeneratorConfig::default()
        };
        let catalog = Catalog::builtin(&config.naming);
        let mut graph = EntityGraph::new();
        let owner = graph.add_entity("Bean0", "bench.generated.beans.Bean0", EntityRole::Primary);
        for index in 0..4 {
            graph
                .require_mut(owner)
                .unwrap()
                .add_field(Field::Reference(ReferenceField::new(
                    format!("beanRef{index}"),
                    owner,
                )))
                .unwrap();
        }

        let annotator = ConstraintAnnotator::new(&catalog, &config);
        annotator
            .annotate_graph(&mut graph, &mut RandomEngine::new(13))
            .unwrap();

        let entity = graph.require(owner).unwrap();
        let tagged: BTreeSet<&str> = entity
            .reference_fields()
            .flat_map(|field| field.descriptors.iter())
            .flat_map(|descriptor| descriptor.groups())
            .collect();
        let registered: BTreeSet<&str> = entity
            .groups
            .iter()
            .map(|id| annotator.groups()[id.0].qualified_name.as_str())
            .collect();
        assert!(!registered.is_empty());
        assert_eq!(registered, tagged);
        validate_annotations(&graph, annotator.groups()).unwrap();
    }

    #[test]
    fn rejected_duplicate_neither_counts_nor_registers_its_group() {
        let config = GeneratorConfig {
            group_count: 2,
            ..GeneratorConfig::default()
        };
        let catalog = Catalog::builtin(&config.naming);
        let annotator = ConstraintAnnotator::new(&catalog, &config);
        let [first, second] = annotator.groups() else {
            panic!("two groups");
        };

        let mut descriptors = DescriptorSet::default();
        let mut used = BTreeSet::new();
        let descriptor = ConstraintDescriptor::new(ConstraintKind::NotNull);
        assert_eq!(
            attach_tagged(&mut descriptors, descriptor.clone(), Some(first), &mut used),
            1
        );
        assert_eq!(
            attach_tagged(&mut descriptors, descriptor, Some(second), &mut used),
            0
        );
        assert_eq!(used, BTreeSet::from([first.id]));
        assert_eq!(
            descriptors.iter().next().unwrap().groups(),
            vec![first.qualified_name.as_str()]
        );
    }

    #[test]
    fn zero_group_probability_leaves_descriptors_untagged() {
        let config = GeneratorConfig {
            group_probability: 0.0,
            ..GeneratorConfig::default()
        };
        let catalog = Catalog::builtin(&config.naming);
        let (mut graph, mut random) = built(&config, 4);

        let summary = ConstraintAnnotator::new(&catalog, &config)
            .annotate_graph(&mut graph, &mut random)
            .unwrap();

        assert_eq!(summary.tagged_descriptors, 0);
        assert_eq!(summary.group_sequences, 0);
        for entity in graph.entities() {
            assert!(entity.groups.is_empty());
            assert!(entity.group_sequence().is_none());
            for field in &entity.fields {
                assert!(field.descriptors().iter().all(|d| d.groups().is_empty()));
            }
        }
    }

    #[test]
    fn certain_tagging_builds_sequences_ending_with_entity() {
        let config = GeneratorConfig {
            group_probability: 1.0,
            group_count: 2,
            basic_fields: CountRange::fixed(3),
            ..GeneratorConfig::default()
        };
        let catalog = Catalog::builtin(&config.naming);
        let (mut graph, mut random) = built(&config, 9);

        let annotator = ConstraintAnnotator::new(&catalog, &config);
        let summary = annotator.annotate_graph(&mut graph, &mut random).unwrap();
        assert_eq!(summary.group_sequences, graph.len());

        for entity in graph.entities() {
            let sequence = entity.group_sequence().expect("group sequence");
            let members: Vec<&str> = sequence
                .param(VALUE_PARAM)
                .and_then(ParamValue::as_array)
                .unwrap()
                .iter()
                .filter_map(ParamValue::as_type_ref)
                .collect();
            assert_eq!(members.len(), entity.groups.len() + 1);
            assert_eq!(*members.last().unwrap(), entity.qualified_name);
            for (member, id) in members.iter().zip(&entity.groups) {
                assert_eq!(*member, annotator.groups()[id.0].qualified_name);
            }
        }
    }

    #[test]
    fn every_entity_carries_the_class_level_marker() {
        let config = GeneratorConfig::default();
        let catalog = Catalog::builtin(&config.naming);
        let (mut graph, mut random) = built(&config, 2);
        ConstraintAnnotator::new(&catalog, &config)
            .annotate_graph(&mut graph, &mut random)
            .unwrap();

        let marker = ConstraintKind::composed("AlwaysValid");
        assert!(graph.entities().iter().all(|e| e.descriptors.contains(&marker)));
    }

    #[test]
    fn annotating_twice_is_rejected() {
        let config = GeneratorConfig::default();
        let catalog = Catalog::builtin(&config.naming);
        let (mut graph, mut random) = built(&config, 6);
        let annotator = ConstraintAnnotator::new(&catalog, &config);
        annotator.annotate_graph(&mut graph, &mut random).unwrap();
        assert!(matches!(
            annotator.annotate_graph(&mut graph, &mut random),
            Err(GenerationError::InvariantViolation(_))
        ));
    }

    #[test]
    fn groups_are_named_in_groups_package() {
        let config = GeneratorConfig {
            group_count: 3,
            ..GeneratorConfig::default()
        };
        let catalog = Catalog::builtin(&config.naming);
        let annotator = ConstraintAnnotator::new(&catalog, &config);
        let names: Vec<&str> = annotator
            .groups()
            .iter()
            .map(|group| group.qualified_name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "bench.generated.groups.Group0",
                "bench.generated.groups.Group1",
                "bench.generated.groups.Group2"
            ]
        );
    }
}
