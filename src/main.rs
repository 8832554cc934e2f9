use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use assessment_navigator::{
    config::{Config, LogFormat},
    decode::{encode_result, unpack, unpack_tree, DirectoryFileLoader, NodeRegistry, ResourceInfo},
    runner::run_scripted,
    ResultData,
};

/// Run an assessment with scripted answers and print its result.
#[derive(Debug, Parser)]
#[command(name = "assessment-navigator", version, about)]
struct Cli {
    /// Resource name of the assessment, e.g. `survey` for `survey.json`
    assessment: String,

    /// Directory resources are loaded from (overrides ASSESSMENT_RESOURCE_DIR)
    #[arg(short, long)]
    resources: Option<PathBuf>,

    /// Package (subdirectory) of the assessment resource
    #[arg(short, long)]
    package: Option<String>,

    /// JSON object mapping result identifiers to answers
    #[arg(short, long)]
    answers: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full run report instead of only the result tree
    #[arg(long)]
    report: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        assessment = %cli.assessment,
        "Assessment navigator starting..."
    );

    let resource_dir = cli
        .resources
        .clone()
        .or_else(|| config.runner.resource_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let loader = DirectoryFileLoader::new(resource_dir);
    let mut resource = ResourceInfo::new(cli.assessment.clone());
    if let Some(package) = &cli.package {
        resource = resource.with_package(package.clone());
    }

    let registry = NodeRegistry::new();
    let decoded = if config.navigation.validate_on_load {
        unpack(&loader, &resource, &registry)
    } else {
        unpack_tree(&loader, &resource, &registry)
    };
    let node = match decoded {
        Ok(node) => node,
        Err(e) => {
            error!(resource = %resource, error = %e, "Failed to load assessment");
            return Err(e.into());
        }
    };

    let answers: BTreeMap<String, Value> = match &cli.answers {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => BTreeMap::new(),
    };
    info!(answers = answers.len(), "Answers loaded");

    let report = match run_scripted(node, &answers, &config.navigation, config.runner.max_steps) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Assessment run failed");
            return Err(e.into());
        }
    };

    let encoded = if cli.report {
        serde_json::to_string_pretty(&report)?
    } else {
        encode_result(&ResultData::Branch(report.result.clone()))?
    };
    match &cli.output {
        Some(path) => {
            std::fs::write(path, encoded)?;
            info!(path = %path.display(), "Result written");
        }
        None => println!("{}", encoded),
    }

    info!(reason = %report.reason, steps = report.steps, "Run complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
