use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};

use nodesync::generator::{merge_groups, merge_proxies, render_proxy, MergePolicy};
use nodesync::models::ConfigDocument;
use nodesync::parser::parse_node_file;
use nodesync::{CommandGateway, Reconciler, Settings, SyncOutcome};

/// Keep an OpenClash configuration in sync with a list of proxy links
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file (.toml, .yaml or .yml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one reconciliation pass against the live gateway
    Sync,

    /// Parse the node list and print the rendered proxies
    Parse {
        /// Node list to parse instead of the configured one
        #[arg(long, value_name = "FILE")]
        nodes: Option<PathBuf>,
    },

    /// Merge the node list into a configuration without touching the gateway
    Merge {
        /// Node list to parse instead of the configured one
        #[arg(long, value_name = "FILE")]
        nodes: Option<PathBuf>,

        /// Configuration to merge into instead of the live one
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn nodes_path(settings: &Settings, nodes: Option<PathBuf>) -> PathBuf {
    nodes.unwrap_or_else(|| PathBuf::from(&settings.nodes_path))
}

fn run_sync(settings: Settings) -> ExitCode {
    let gateway = CommandGateway::from_settings(&settings);
    let outcome = Reconciler::new(settings, gateway).run();
    match &outcome {
        SyncOutcome::Unchanged => info!("No changes"),
        SyncOutcome::Committed(report) => info!(
            "Update complete: {} nodes written, {} groups updated, {} lines failed",
            report.proxies.injected, report.groups.groups_touched, report.parse_errors
        ),
        SyncOutcome::Aborted(e) => warn!("Update aborted: {}", e),
        SyncOutcome::RolledBack(e) => warn!("Update rolled back: {}", e),
    }

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_parse(settings: &Settings, nodes: Option<PathBuf>) -> Result<()> {
    let path = nodes_path(settings, nodes);
    let batch = parse_node_file(&path, settings.name_strictness)
        .with_context(|| format!("Failed to read node list {}", path.display()))?;

    let proxies = batch
        .records
        .iter()
        .map(render_proxy)
        .collect::<Result<Vec<_>, _>>()?;
    print!("{}", serde_yaml::to_string(&proxies)?);
    println!(
        "# {} parsed, {} failed",
        batch.success_count, batch.error_count
    );
    Ok(())
}

fn run_merge(
    settings: &Settings,
    nodes: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let path = nodes_path(settings, nodes);
    let batch = parse_node_file(&path, settings.name_strictness)
        .with_context(|| format!("Failed to read node list {}", path.display()))?;

    let config_path = match config {
        Some(path) => path,
        None => settings.resolve_config_path()?,
    };
    let mut document = ConfigDocument::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let proxies = merge_proxies(&mut document, &batch.records, MergePolicy::ReplaceAll);
    merge_groups(&mut document, &proxies.names, &settings.group_selection());

    let yaml = document.to_yaml_string()?;
    match output {
        Some(output) => {
            fs::write(&output, yaml)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote merged configuration to {}", output.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize the logger
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::init_from_env(Env::default().default_filter_or(default_level));

    let settings = load_settings(args.config.as_ref())?;

    match args.command {
        Command::Sync => Ok(run_sync(settings)),
        Command::Parse { nodes } => {
            run_parse(&settings, nodes)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Merge {
            nodes,
            config,
            output,
        } => {
            run_merge(&settings, nodes, config, output)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
