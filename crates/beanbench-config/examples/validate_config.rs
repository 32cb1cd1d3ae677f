use std::path::PathBuf;

use beanbench_config::{ConfigError, load_config};

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("generator.toml"));

    match load_config(&path) {
        Ok(config) => {
            println!(
                "config ok: seed={} entities={} base_entities={}",
                config.seed, config.entity_count, config.base_entity_count
            );
        }
        Err(ConfigError::Invalid(report)) => {
            for issue in &report.errors {
                eprintln!("error: {issue}");
            }
            for issue in &report.warnings {
                eprintln!("warning: {issue}");
            }
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("failed to load {}: {err}", path.display());
            std::process::exit(1);
        }
    }
}
