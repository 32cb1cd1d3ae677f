//! Core contracts for beanbench.
//!
//! This crate defines the entity graph, constraint descriptors, sample
//! values and instance tree shared by the generator and downstream emitters.

pub mod constraints;
pub mod error;
pub mod graph;
pub mod instance;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{
    ConstraintDefinition, ConstraintDescriptor, ConstraintKind, DescriptorSet, GROUPS_PARAM,
    Group, GroupId, VALUE_PARAM,
};
pub use error::{Error, Result};
pub use graph::{ReferenceGraphReport, ReferenceGraphSummary, build_reference_graph_report};
pub use instance::{Holder, Instance, ReferenceLink};
pub use schema::{BasicField, Entity, EntityGraph, EntityId, EntityRole, Field, ReferenceField};
pub use types::{ParamValue, SampleValue, ValueType};
pub use validation::{validate_annotations, validate_graph};

/// Contract version for serialized snapshots.
pub const SNAPSHOT_VERSION: &str = "0.1";
