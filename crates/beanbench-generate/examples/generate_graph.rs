use std::path::PathBuf;

use beanbench_config::load_config;
use beanbench_generate::GenerationEngine;
use beanbench_generate::output::json::write_snapshot_json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .map(PathBuf::from)
        .ok_or("usage: generate_graph <config.toml> [snapshot.json]")?;
    let out = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("snapshot.json"));

    let config = load_config(&config_path)?;
    let result = GenerationEngine::with_builtin_catalog(config).run()?;
    let bytes = write_snapshot_json(&out, &result.snapshot)?;

    println!(
        "wrote {} ({bytes} bytes, fingerprint {})",
        out.display(),
        result.report.fingerprint
    );
    Ok(())
}
