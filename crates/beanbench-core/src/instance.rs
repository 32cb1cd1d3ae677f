use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::EntityId;

/// Populated instance of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Instance {
    pub entity: EntityId,
    /// Generated variable name, unique for the run.
    pub variable: String,
    /// Nesting level; top-level instances sit at 0.
    pub level: u32,
    pub links: Vec<ReferenceLink>,
}

/// Value of one reference field on an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceLink {
    pub field: String,
    /// Nested instance, or `None` when the field was left unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Box<Instance>>,
}

impl Instance {
    pub fn new(entity: EntityId, variable: impl Into<String>, level: u32) -> Self {
        Self {
            entity,
            variable: variable.into(),
            level,
            links: Vec::new(),
        }
    }

    pub fn link(&mut self, field: impl Into<String>, value: Option<Instance>) {
        self.links.push(ReferenceLink {
            field: field.into(),
            value: value.map(Box::new),
        });
    }

    pub fn children(&self) -> impl Iterator<Item = &Instance> {
        self.links.iter().filter_map(|link| link.value.as_deref())
    }

    pub fn linked(&self, field: &str) -> Option<&Instance> {
        self.links
            .iter()
            .find(|link| link.field == field)
            .and_then(|link| link.value.as_deref())
    }

    /// Deepest nesting level reached in this subtree.
    pub fn max_level(&self) -> u32 {
        self.children()
            .map(Instance::max_level)
            .max()
            .unwrap_or(self.level)
    }

    /// Number of instances in this subtree, including `self`.
    pub fn instance_count(&self) -> usize {
        1 + self.children().map(Instance::instance_count).sum::<usize>()
    }

    /// Number of reference links left unset in this subtree.
    pub fn unset_links(&self) -> usize {
        let own = self.links.iter().filter(|link| link.value.is_none()).count();
        own + self.children().map(Instance::unset_links).sum::<usize>()
    }
}

/// Root collection owning every top-level instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Holder {
    pub beans: Vec<Instance>,
}

impl Holder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instance: Instance) {
        self.beans.push(instance);
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.beans.iter()
    }

    pub fn max_level(&self) -> u32 {
        self.beans.iter().map(Instance::max_level).max().unwrap_or(0)
    }

    pub fn instance_count(&self) -> usize {
        self.beans.iter().map(Instance::instance_count).sum()
    }

    pub fn unset_links(&self) -> usize {
        self.beans.iter().map(Instance::unset_links).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_nested_links() {
        let mut leaf = Instance::new(EntityId(1), "lvl1Bean1_2", 1);
        leaf.link("beanRef0", None);
        let mut root = Instance::new(EntityId(0), "lvl0Bean0_1", 0);
        root.link("beanRef0", Some(leaf));
        root.link("beanRef1", None);

        assert_eq!(root.instance_count(), 2);
        assert_eq!(root.max_level(), 1);
        assert_eq!(root.unset_links(), 2);
        assert_eq!(root.linked("beanRef0").unwrap().variable, "lvl1Bean1_2");
        assert!(root.linked("beanRef1").is_none());
    }
}
