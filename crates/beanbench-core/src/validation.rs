use std::collections::BTreeSet;

use crate::constraints::{ConstraintKind, Group, VALUE_PARAM};
use crate::error::{Error, Result};
use crate::schema::{EntityGraph, EntityRole};
use crate::types::ParamValue;

/// Validate the structural shape of an entity graph.
///
/// This checks:
/// - ids and role lists agree with the arena
/// - field names are unique per entity
/// - reference targets exist and are primary entities
/// - base entities hold no reference fields and never inherit
/// - superclasses are base entities
pub fn validate_graph(graph: &EntityGraph) -> Result<()> {
    for (position, entity) in graph.entities().iter().enumerate() {
        if entity.id.index() != position {
            return Err(Error::invariant(format!(
                "entity {} stored at position {position} has id {}",
                entity.qualified_name, entity.id
            )));
        }

        let expected = match entity.role {
            EntityRole::Primary => graph.primary_ids(),
            EntityRole::Base => graph.base_ids(),
        };
        if !expected.contains(&entity.id) {
            return Err(Error::invariant(format!(
                "entity {} missing from its role list",
                entity.qualified_name
            )));
        }

        let mut names = BTreeSet::new();
        for field in &entity.fields {
            if !names.insert(field.name()) {
                return Err(Error::invariant(format!(
                    "duplicate field '{}' on entity {}",
                    field.name(),
                    entity.qualified_name
                )));
            }
        }

        for field in entity.reference_fields() {
            if entity.is_base() {
                return Err(Error::invariant(format!(
                    "base entity {} holds reference field '{}'",
                    entity.qualified_name, field.name
                )));
            }
            let target = graph.require(field.target)?;
            if target.is_base() {
                return Err(Error::invariant(format!(
                    "reference field {}.{} targets base entity {}",
                    entity.qualified_name, field.name, target.qualified_name
                )));
            }
        }

        if let Some(parent) = entity.superclass {
            if entity.is_base() {
                return Err(Error::invariant(format!(
                    "base entity {} has a superclass",
                    entity.qualified_name
                )));
            }
            let parent = graph.require(parent)?;
            if !parent.is_base() {
                return Err(Error::invariant(format!(
                    "entity {} extends non-base entity {}",
                    entity.qualified_name, parent.qualified_name
                )));
            }
        }
    }

    Ok(())
}

/// Validate constraint bookkeeping on an annotated entity graph.
///
/// This checks:
/// - every basic field carries descriptors plus non-empty, disjoint
///   valid/invalid sample lists whose values fit the field type
/// - every reference field carries `Valid` and exactly one of
///   `NotNull`/`Null`
/// - every entity carries its class-level descriptor
/// - the groups an entity registers are exactly the groups its field
///   descriptors are tagged with, resolved through `groups`
/// - an entity has a group sequence exactly when it has groups, and the
///   sequence lists the groups followed by the entity itself
pub fn validate_annotations(graph: &EntityGraph, groups: &[Group]) -> Result<()> {
    for entity in graph.entities() {
        for field in entity.basic_fields() {
            let location = format!("{}.{}", entity.qualified_name, field.name);
            if field.descriptors.is_empty() {
                return Err(Error::invariant(format!("{location} has no descriptors")));
            }
            if field.valid_values.is_empty() || field.invalid_values.is_empty() {
                return Err(Error::invariant(format!(
                    "{location} is missing valid or invalid sample values"
                )));
            }
            if field
                .valid_values
                .iter()
                .any(|value| field.invalid_values.contains(value))
            {
                return Err(Error::invariant(format!(
                    "{location} has overlapping valid and invalid values"
                )));
            }
            if let Some(value) = field
                .valid_values
                .iter()
                .chain(field.invalid_values.iter())
                .find(|value| !value.fits(field.value_type))
            {
                return Err(Error::invariant(format!(
                    "{location} sample value {value} does not fit type {}",
                    field.value_type
                )));
            }
        }

        for field in entity.reference_fields() {
            let location = format!("{}.{}", entity.qualified_name, field.name);
            if !field.descriptors.contains(&ConstraintKind::Valid) {
                return Err(Error::invariant(format!(
                    "{location} is missing cascade validation"
                )));
            }
            let presence = [ConstraintKind::NotNull, ConstraintKind::Null]
                .iter()
                .filter(|kind| field.descriptors.contains(kind))
                .count();
            if presence != 1 {
                return Err(Error::invariant(format!(
                    "{location} carries {presence} presence descriptors"
                )));
            }
        }

        if !entity.descriptors.kinds().any(ConstraintKind::is_composed) {
            return Err(Error::invariant(format!(
                "entity {} has no class-level descriptor",
                entity.qualified_name
            )));
        }

        let mut registered = Vec::with_capacity(entity.groups.len());
        for id in &entity.groups {
            let group = groups.iter().find(|group| group.id == *id).ok_or_else(|| {
                Error::invariant(format!(
                    "entity {} registers unknown group {}",
                    entity.qualified_name, id.0
                ))
            })?;
            registered.push(group.qualified_name.as_str());
        }
        let tagged: BTreeSet<&str> = entity
            .fields
            .iter()
            .flat_map(|field| field.descriptors().iter())
            .flat_map(|descriptor| descriptor.groups())
            .collect();
        if tagged != registered.iter().copied().collect::<BTreeSet<_>>() {
            return Err(Error::invariant(format!(
                "entity {} registers groups {registered:?} but its fields are tagged with {tagged:?}",
                entity.qualified_name
            )));
        }

        match (registered.is_empty(), entity.group_sequence()) {
            (true, None) => {}
            (true, Some(_)) => {
                return Err(Error::invariant(format!(
                    "entity {} has a group sequence without groups",
                    entity.qualified_name
                )));
            }
            (false, None) => {
                return Err(Error::invariant(format!(
                    "entity {} has groups but no group sequence",
                    entity.qualified_name
                )));
            }
            (false, Some(sequence)) => {
                let members: Vec<Option<&str>> = sequence
                    .param(VALUE_PARAM)
                    .and_then(ParamValue::as_array)
                    .unwrap_or_default()
                    .iter()
                    .map(ParamValue::as_type_ref)
                    .collect();
                let expected: Vec<Option<&str>> = registered
                    .iter()
                    .copied()
                    .chain([entity.qualified_name.as_str()])
                    .map(Some)
                    .collect();
                if members != expected {
                    return Err(Error::invariant(format!(
                        "entity {} has a malformed group sequence",
                        entity.qualified_name
                    )));
                }
            }
        }
    }

    Ok(())
}
