//! Seeded bean-graph generation for beanbench.
//!
//! A run builds an entity graph, annotates it with constraint descriptors
//! from a catalog and populates a tree of instances. Every random decision
//! flows through one [`RandomEngine`], so a config and seed always yield the
//! same snapshot.

pub mod annotator;
pub mod builder;
pub mod catalog;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod populator;
pub mod random;

pub use annotator::{AnnotationSummary, ConstraintAnnotator};
pub use builder::EntityGraphBuilder;
pub use catalog::{Catalog, DescriptorBundle};
pub use engine::{GenerationEngine, GenerationResult};
pub use errors::GenerationError;
pub use model::{BeanGraphSnapshot, GenerationIssue, GenerationReport};
pub use populator::InstancePopulator;
pub use random::RandomEngine;
