use std::time::Instant;

use tracing::{debug, info, warn};

use beanbench_config::{GeneratorConfig, validate_config};
use beanbench_core::{
    ReferenceGraphReport, SNAPSHOT_VERSION, build_reference_graph_report, validate_annotations,
    validate_graph,
};

use crate::annotator::ConstraintAnnotator;
use crate::builder::EntityGraphBuilder;
use crate::catalog::Catalog;
use crate::errors::GenerationError;
use crate::model::{BeanGraphSnapshot, GenerationIssue, GenerationReport};
use crate::populator::InstancePopulator;
use crate::random::RandomEngine;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub snapshot: BeanGraphSnapshot,
    pub references: ReferenceGraphReport,
    pub report: GenerationReport,
}

/// Entry point for generating a bean graph from a config and catalog.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    config: GeneratorConfig,
    catalog: Catalog,
}

impl GenerationEngine {
    pub fn new(config: GeneratorConfig, catalog: Catalog) -> Self {
        Self { config, catalog }
    }

    /// Engine using the stock catalog qualified with the config's naming.
    pub fn with_builtin_catalog(config: GeneratorConfig) -> Self {
        let catalog = Catalog::builtin(&config.naming);
        Self::new(config, catalog)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run every phase with a fresh random engine seeded from the config.
    pub fn run(&self) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let config = &self.config;

        let issues = validate_config(config);
        if !issues.is_ok() {
            return Err(GenerationError::Configuration(issues.summary()));
        }
        for issue in &issues.warnings {
            warn!(code = %issue.code, path = %issue.path, "{}", issue.message);
        }
        self.catalog.validate()?;

        info!(
            seed = config.seed,
            entities = config.entity_count,
            base_entities = config.base_entity_count,
            groups = config.group_count,
            "generation started"
        );

        let mut random = RandomEngine::new(config.seed);

        let phase = Instant::now();
        let mut graph = EntityGraphBuilder::new(config).build(&mut random)?;
        validate_graph(&graph)?;
        info!(
            entities = graph.len(),
            basic_fields = graph.basic_field_count(),
            reference_fields = graph.reference_field_count(),
            duration_ms = phase.elapsed().as_millis() as u64,
            "entity graph built"
        );

        let phase = Instant::now();
        let annotator = ConstraintAnnotator::new(&self.catalog, config);
        let annotation = annotator.annotate_graph(&mut graph, &mut random)?;
        validate_annotations(&graph, annotator.groups())?;
        info!(
            tagged_entities = annotation.tagged_entities,
            tagged_descriptors = annotation.tagged_descriptors,
            group_sequences = annotation.group_sequences,
            duration_ms = phase.elapsed().as_millis() as u64,
            "constraints annotated"
        );

        let phase = Instant::now();
        let holder = InstancePopulator::new(config.fill_rates, config.valid_value_probability)
            .populate(&mut graph, &mut random)?;
        if holder.len() != graph.primary_ids().len() {
            return Err(GenerationError::InvariantViolation(format!(
                "holder has {} top-level instances for {} primary entities",
                holder.len(),
                graph.primary_ids().len()
            )));
        }
        info!(
            top_level = holder.len(),
            instances = holder.instance_count(),
            max_level = holder.max_level(),
            duration_ms = phase.elapsed().as_millis() as u64,
            "instances populated"
        );

        let references = build_reference_graph_report(&graph);
        debug!(
            nodes = references.summary.nodes,
            edges = references.summary.edges,
            self_references = references.summary.self_references,
            cyclic = references.cycle.is_some(),
            "reference graph analysed"
        );

        let snapshot = BeanGraphSnapshot {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            seed: config.seed,
            graph,
            groups: annotator.groups().to_vec(),
            definitions: self.catalog.definitions.clone(),
            holder,
        };
        let fingerprint = snapshot.fingerprint()?;

        let mut report = GenerationReport::from_snapshot(&snapshot, fingerprint);
        report.reference_graph = references.summary.clone();
        report.cyclic_references = references.cycle.is_some();
        report.random_draws = random.draws();
        report.duration_ms = start.elapsed().as_millis() as u64;
        for issue in issues.warnings {
            report.record_warning(GenerationIssue {
                code: issue.code,
                message: issue.message,
                path: issue.path,
            });
        }

        info!(
            fingerprint = %report.fingerprint,
            instances = report.instances,
            random_draws = report.random_draws,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult {
            snapshot,
            references,
            report,
        })
    }
}
