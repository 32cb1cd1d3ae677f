use std::collections::BTreeSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{ConstraintDescriptor, ConstraintKind, DescriptorSet, GroupId};
use crate::error::{Error, Result};
use crate::types::{SampleValue, ValueType};

/// Index of an entity inside an [`EntityGraph`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct EntityId(pub usize);

impl EntityId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role an entity plays in the generated graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    /// First-class graph member; instantiated into the holder.
    Primary,
    /// Inheritance root; never references other entities nor inherits.
    Base,
}

/// Field holding a basic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BasicField {
    pub name: String,
    pub value_type: ValueType,
    pub descriptors: DescriptorSet,
    /// Values satisfying every attached descriptor.
    pub valid_values: Vec<SampleValue>,
    /// Values violating at least one attached descriptor.
    pub invalid_values: Vec<SampleValue>,
    /// Fixed initial value chosen during population.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<SampleValue>,
}

impl BasicField {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            descriptors: DescriptorSet::new(),
            valid_values: Vec::new(),
            invalid_values: Vec::new(),
            initial_value: None,
        }
    }

    pub fn is_annotated(&self) -> bool {
        !self.descriptors.is_empty() || !self.valid_values.is_empty()
    }
}

/// Field whose value is an instance of another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceField {
    pub name: String,
    pub target: EntityId,
    pub descriptors: DescriptorSet,
}

impl ReferenceField {
    pub fn new(name: impl Into<String>, target: EntityId) -> Self {
        Self {
            name: name.into(),
            target,
            descriptors: DescriptorSet::new(),
        }
    }
}

/// Field of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "field_kind", rename_all = "snake_case")]
pub enum Field {
    Basic(BasicField),
    Reference(ReferenceField),
}

impl Field {
    pub fn name(&self) -> &str {
        match self {
            Field::Basic(field) => &field.name,
            Field::Reference(field) => &field.name,
        }
    }

    pub fn descriptors(&self) -> &DescriptorSet {
        match self {
            Field::Basic(field) => &field.descriptors,
            Field::Reference(field) => &field.descriptors,
        }
    }

    pub fn as_basic(&self) -> Option<&BasicField> {
        match self {
            Field::Basic(field) => Some(field),
            Field::Reference(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceField> {
        match self {
            Field::Reference(field) => Some(field),
            Field::Basic(_) => None,
        }
    }
}

/// Generated class-like definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub qualified_name: String,
    pub role: EntityRole,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<EntityId>,
    pub descriptors: DescriptorSet,
    /// Distinct groups used by the entity's field descriptors.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub groups: BTreeSet<GroupId>,
}

impl Entity {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        role: EntityRole,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            qualified_name: qualified_name.into(),
            role,
            fields: Vec::new(),
            superclass: None,
            descriptors: DescriptorSet::new(),
            groups: BTreeSet::new(),
        }
    }

    pub fn is_base(&self) -> bool {
        self.role == EntityRole::Base
    }

    /// Append a field, rejecting names already declared on this entity.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.field(field.name()).is_some() {
            return Err(Error::invariant(format!(
                "duplicate field '{}' on entity {}",
                field.name(),
                self.qualified_name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn basic_fields(&self) -> impl Iterator<Item = &BasicField> {
        self.fields.iter().filter_map(Field::as_basic)
    }

    pub fn reference_fields(&self) -> impl Iterator<Item = &ReferenceField> {
        self.fields.iter().filter_map(Field::as_reference)
    }

    pub fn basic_fields_mut(&mut self) -> impl Iterator<Item = &mut BasicField> {
        self.fields.iter_mut().filter_map(|field| match field {
            Field::Basic(field) => Some(field),
            Field::Reference(_) => None,
        })
    }

    pub fn set_superclass(&mut self, parent: EntityId) -> Result<()> {
        if self.is_base() {
            return Err(Error::invariant(format!(
                "base entity {} cannot inherit",
                self.qualified_name
            )));
        }
        if let Some(existing) = self.superclass {
            return Err(Error::invariant(format!(
                "entity {} already extends {existing}",
                self.qualified_name
            )));
        }
        self.superclass = Some(parent);
        Ok(())
    }

    /// Register a group; returns `false` if it was already registered.
    pub fn add_group(&mut self, group: GroupId) -> bool {
        self.groups.insert(group)
    }

    pub fn group_sequence(&self) -> Option<&ConstraintDescriptor> {
        self.descriptors.get(&ConstraintKind::GroupSequence)
    }
}

/// Arena holding every generated entity.
///
/// Entities refer to each other by [`EntityId`]; superclass and reference
/// targets are resolved through the arena rather than held as pointers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EntityGraph {
    entities: Vec<Entity>,
    primary: Vec<EntityId>,
    base: Vec<EntityId>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new entity without fields and return its id.
    pub fn add_entity(
        &mut self,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        role: EntityRole,
    ) -> EntityId {
        let id = EntityId(self.entities.len());
        self.entities
            .push(Entity::new(id, name, qualified_name, role));
        match role {
            EntityRole::Primary => self.primary.push(id),
            EntityRole::Base => self.base.push(id),
        }
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.index())
    }

    /// Resolve an id that must exist.
    pub fn require(&self, id: EntityId) -> Result<&Entity> {
        self.entity(id)
            .ok_or_else(|| Error::invariant(format!("unknown entity {id}")))
    }

    pub fn require_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entity_mut(id)
            .ok_or_else(|| Error::invariant(format!("unknown entity {id}")))
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn primary_ids(&self) -> &[EntityId] {
        &self.primary
    }

    pub fn base_ids(&self) -> &[EntityId] {
        &self.base
    }

    pub fn primary_entities(&self) -> impl Iterator<Item = &Entity> {
        self.primary.iter().filter_map(|id| self.entity(*id))
    }

    pub fn base_entities(&self) -> impl Iterator<Item = &Entity> {
        self.base.iter().filter_map(|id| self.entity(*id))
    }

    /// Primary entities first, then base entities.
    pub fn traversal_order(&self) -> Vec<EntityId> {
        self.primary.iter().chain(self.base.iter()).copied().collect()
    }

    pub fn superclass_of(&self, entity: &Entity) -> Option<&Entity> {
        entity.superclass.and_then(|id| self.entity(id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn basic_field_count(&self) -> usize {
        self.entities
            .iter()
            .map(|entity| entity.basic_fields().count())
            .sum()
    }

    pub fn reference_field_count(&self) -> usize {
        self.entities
            .iter()
            .map(|entity| entity.reference_fields().count())
            .sum()
    }
}
