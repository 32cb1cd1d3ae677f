use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use beanbench_core::{
    ConstraintDefinition, ConstraintKind, EntityGraph, Group, GroupId, Holder,
    ReferenceGraphSummary,
};

use crate::errors::GenerationError;

/// Everything a downstream emitter needs to render one generated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeanGraphSnapshot {
    pub snapshot_version: String,
    pub seed: u64,
    pub graph: EntityGraph,
    pub groups: Vec<Group>,
    pub definitions: Vec<ConstraintDefinition>,
    pub holder: Holder,
}

impl BeanGraphSnapshot {
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn definition(&self, kind: &ConstraintKind) -> Option<&ConstraintDefinition> {
        self.definitions
            .iter()
            .find(|definition| &definition.kind() == kind)
    }

    /// Hex SHA-256 of the compact JSON encoding.
    ///
    /// Two runs with the same config and catalog produce the same value.
    pub fn fingerprint(&self) -> Result<String, GenerationError> {
        let bytes = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&bytes);
        Ok(hex::encode(digest))
    }
}

/// Structured generation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub code: String,
    pub message: String,
    pub path: String,
}

/// Report for a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub seed: u64,
    pub fingerprint: String,
    pub entities: usize,
    pub base_entities: usize,
    pub basic_fields: usize,
    pub reference_fields: usize,
    pub inheriting_entities: usize,
    pub groups_defined: usize,
    pub grouped_entities: usize,
    pub group_sequences: usize,
    pub tagged_descriptors: usize,
    pub instances: usize,
    pub unset_references: usize,
    pub max_level: u32,
    pub valid_initial_values: u64,
    pub invalid_initial_values: u64,
    pub value_type_usage: BTreeMap<String, u64>,
    pub descriptor_usage: BTreeMap<String, u64>,
    pub reference_graph: ReferenceGraphSummary,
    pub cyclic_references: bool,
    pub random_draws: u64,
    pub duration_ms: u64,
    pub warnings: Vec<GenerationIssue>,
}

impl GenerationReport {
    /// Collect counts from a finished snapshot.
    pub fn from_snapshot(snapshot: &BeanGraphSnapshot, fingerprint: String) -> Self {
        let graph = &snapshot.graph;
        let mut report = Self {
            seed: snapshot.seed,
            fingerprint,
            entities: graph.primary_ids().len(),
            base_entities: graph.base_ids().len(),
            basic_fields: graph.basic_field_count(),
            reference_fields: graph.reference_field_count(),
            inheriting_entities: graph
                .entities()
                .iter()
                .filter(|entity| entity.superclass.is_some())
                .count(),
            groups_defined: snapshot.groups.len(),
            grouped_entities: graph
                .entities()
                .iter()
                .filter(|entity| !entity.groups.is_empty())
                .count(),
            group_sequences: graph
                .entities()
                .iter()
                .filter(|entity| entity.group_sequence().is_some())
                .count(),
            tagged_descriptors: 0,
            instances: snapshot.holder.instance_count(),
            unset_references: snapshot.holder.unset_links(),
            max_level: snapshot.holder.max_level(),
            valid_initial_values: 0,
            invalid_initial_values: 0,
            value_type_usage: BTreeMap::new(),
            descriptor_usage: BTreeMap::new(),
            reference_graph: ReferenceGraphSummary {
                nodes: 0,
                edges: 0,
                self_references: 0,
            },
            cyclic_references: false,
            random_draws: 0,
            duration_ms: 0,
            warnings: Vec::new(),
        };

        for entity in graph.entities() {
            for descriptor in entity.descriptors.iter() {
                report.record_descriptor_usage(&descriptor.kind);
            }
            for field in &entity.fields {
                for descriptor in field.descriptors().iter() {
                    report.record_descriptor_usage(&descriptor.kind);
                    if !descriptor.groups().is_empty() {
                        report.tagged_descriptors += 1;
                    }
                }
            }
            for field in entity.basic_fields() {
                *report
                    .value_type_usage
                    .entry(field.value_type.to_string())
                    .or_insert(0) += 1;
                match &field.initial_value {
                    Some(value) if field.valid_values.contains(value) => {
                        report.valid_initial_values += 1
                    }
                    Some(_) => report.invalid_initial_values += 1,
                    None => {}
                }
            }
        }

        report
    }

    pub fn record_descriptor_usage(&mut self, kind: &ConstraintKind) {
        *self
            .descriptor_usage
            .entry(kind.name().to_string())
            .or_insert(0) += 1;
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        self.warnings.push(issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanbench_core::{EntityRole, SNAPSHOT_VERSION};

    fn snapshot() -> BeanGraphSnapshot {
        let mut graph = EntityGraph::new();
        graph.add_entity("Bean0", "bench.beans.Bean0", EntityRole::Primary);
        BeanGraphSnapshot {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            seed: 7,
            graph,
            groups: Vec::new(),
            definitions: Vec::new(),
            holder: Holder::new(),
        }
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let first = snapshot();
        let same = snapshot();
        assert_eq!(first.fingerprint().unwrap(), same.fingerprint().unwrap());
        assert_eq!(first.fingerprint().unwrap().len(), 64);

        let mut changed = snapshot();
        changed.seed = 8;
        assert_ne!(first.fingerprint().unwrap(), changed.fingerprint().unwrap());
    }

    #[test]
    fn report_counts_entities() {
        let snapshot = snapshot();
        let report = GenerationReport::from_snapshot(&snapshot, "abc".to_string());
        assert_eq!(report.entities, 1);
        assert_eq!(report.base_entities, 0);
        assert_eq!(report.instances, 0);
        assert!(report.descriptor_usage.is_empty());
    }
}
