use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::ParamValue;

/// Parameter key holding the validation groups of a descriptor.
pub const GROUPS_PARAM: &str = "groups";
/// Parameter key holding the ordered members of a group sequence.
pub const VALUE_PARAM: &str = "value";

/// Constraint kinds the generator can attach.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    NotNull,
    Null,
    Size,
    Min,
    Max,
    Pattern,
    /// Cascade validation into the referenced instance.
    Valid,
    /// Ordering of groups checked for an entity.
    GroupSequence,
    /// Constraint defined by a [`ConstraintDefinition`] in the catalog.
    Composed(String),
}

impl ConstraintKind {
    pub fn composed(name: impl Into<String>) -> Self {
        ConstraintKind::Composed(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            ConstraintKind::NotNull => "NotNull",
            ConstraintKind::Null => "Null",
            ConstraintKind::Size => "Size",
            ConstraintKind::Min => "Min",
            ConstraintKind::Max => "Max",
            ConstraintKind::Pattern => "Pattern",
            ConstraintKind::Valid => "Valid",
            ConstraintKind::GroupSequence => "GroupSequence",
            ConstraintKind::Composed(name) => name.as_str(),
        }
    }

    pub fn is_composed(&self) -> bool {
        matches!(self, ConstraintKind::Composed(_))
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable identifier of a generated validation group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct GroupId(pub usize);

/// Marker type partitioning constraints into conditionally active subsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub qualified_name: String,
}

/// One validation rule plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintDescriptor {
    pub kind: ConstraintKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParamValue>,
}

impl ConstraintDescriptor {
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Restrict the descriptor to a single group, replacing any earlier one.
    pub fn set_group(&mut self, group: &Group) {
        self.params.insert(
            GROUPS_PARAM.to_string(),
            ParamValue::Array(vec![ParamValue::type_ref(group.qualified_name.clone())]),
        );
    }

    /// Qualified names of the groups this descriptor is restricted to.
    pub fn groups(&self) -> Vec<&str> {
        self.param(GROUPS_PARAM)
            .and_then(ParamValue::as_array)
            .map(|values| values.iter().filter_map(ParamValue::as_type_ref).collect())
            .unwrap_or_default()
    }
}

/// Descriptors attached to one owner, deduplicated by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DescriptorSet {
    descriptors: Vec<ConstraintDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a descriptor. Returns `false` when the kind is already present.
    pub fn attach(&mut self, descriptor: ConstraintDescriptor) -> bool {
        if self.contains(&descriptor.kind) {
            return false;
        }
        self.descriptors.push(descriptor);
        true
    }

    pub fn contains(&self, kind: &ConstraintKind) -> bool {
        self.descriptors.iter().any(|item| &item.kind == kind)
    }

    pub fn get(&self, kind: &ConstraintKind) -> Option<&ConstraintDescriptor> {
        self.descriptors.iter().find(|item| &item.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintDescriptor> {
        self.descriptors.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ConstraintKind> {
        self.descriptors.iter().map(|item| &item.kind)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Definition of a composed constraint type referenced by
/// [`ConstraintKind::Composed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintDefinition {
    pub name: String,
    pub qualified_name: String,
    /// Constraints the definition is composed of, checked jointly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composed_of: Vec<ConstraintDescriptor>,
    /// Report one violation instead of one per composing constraint.
    #[serde(default)]
    pub report_as_single_violation: bool,
    /// Qualified names of the validator types backing the definition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validated_by: Vec<String>,
}

impl ConstraintDefinition {
    pub fn kind(&self) -> ConstraintKind {
        ConstraintKind::composed(self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: usize) -> Group {
        Group {
            id: GroupId(id),
            name: format!("Group{id}"),
            qualified_name: format!("bench.groups.Group{id}"),
        }
    }

    #[test]
    fn attach_ignores_duplicate_kinds() {
        let mut set = DescriptorSet::new();
        assert!(set.attach(ConstraintDescriptor::new(ConstraintKind::NotNull)));
        assert!(!set.attach(
            ConstraintDescriptor::new(ConstraintKind::NotNull)
                .with_param("message", ParamValue::text("other"))
        ));
        assert!(set.attach(ConstraintDescriptor::new(ConstraintKind::Valid)));
        assert_eq!(set.len(), 2);
        assert!(set.get(&ConstraintKind::NotNull).unwrap().params.is_empty());
    }

    #[test]
    fn set_group_replaces_previous_group() {
        let mut descriptor = ConstraintDescriptor::new(ConstraintKind::Null);
        descriptor.set_group(&group(0));
        descriptor.set_group(&group(2));
        assert_eq!(descriptor.groups(), vec!["bench.groups.Group2"]);
    }
}
