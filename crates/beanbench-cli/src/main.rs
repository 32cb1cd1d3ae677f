mod registry;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use beanbench_config::{
    ConfigError, GeneratorConfig, config_json_schema, load_config, validate_config,
};
use beanbench_generate::{Catalog, GenerationEngine, GenerationError};
use clap::{Args, Parser, Subcommand};
use registry::{RunContext, init_run_logging, start_run, write_report, write_snapshot};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "beanbench", version, about = "Seeded bean-graph generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a snapshot into a new run directory.
    Generate(GenerateArgs),
    /// Print the JSON Schema of the generator config.
    ConfigSchema(PrintArgs),
    /// Print the built-in constraint catalog.
    Catalog(CatalogArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Config file (.toml or .json); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the config seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Optional extra output path for snapshot.json.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PrintArgs {
    /// Write to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// Config file whose naming qualifies the constraint definitions.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::ConfigSchema(args) => emit_json(&config_json_schema(), args.out),
        Command::Catalog(args) => {
            let config = resolve_config(args.config.as_ref())?;
            emit_json(&Catalog::builtin(&config.naming), args.out)
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let GenerateArgs {
        config: config_path,
        seed,
        run_dir,
        out,
    } = args;

    let mut config = resolve_config(config_path.as_ref())?;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    let report = validate_config(&config);
    if !report.is_ok() {
        return Err(CliError::InvalidConfig(report.summary()));
    }

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        config_path,
        config: config.clone(),
        run_dir,
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(event = "run_started", run_id = %run_id, seed = config.seed);
    let timer = Instant::now();

    let result = GenerationEngine::with_builtin_catalog(config).run()?;

    let bytes = write_snapshot(&run_paths, &result.snapshot, out.as_deref())?;
    tracing::info!(
        event = "snapshot_written",
        path = %run_paths.snapshot_path.display(),
        bytes
    );

    write_report(&run_paths, &result.report)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    let duration_ms = timer.elapsed().as_millis() as u64;
    tracing::info!(
        event = "run_finished",
        status = "success",
        fingerprint = %result.report.fingerprint,
        duration_ms
    );

    println!("{}", run_paths.root.display());
    Ok(())
}

fn resolve_config(path: Option<&PathBuf>) -> Result<GeneratorConfig, CliError> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(GeneratorConfig::default()),
    }
}

fn emit_json<T: serde::Serialize>(value: &T, out: Option<PathBuf>) -> Result<(), CliError> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    match out {
        Some(path) => std::fs::write(path, rendered)?,
        None => std::io::stdout().write_all(rendered.as_bytes())?,
    }
    Ok(())
}
