//! flowctl - drive command nodes through scripted scenarios.
//!
//! - `flowctl run <scenario>` - replay a scenario and print every output
//! - `flowctl check-config <config>` - validate a node configuration file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use flow_cli::{Report, Scenario, ScenarioRunner};
use flow_core::FlowConfig;

#[derive(Parser)]
#[command(name = "flowctl")]
#[command(about = "Run flow-graph command node scenarios", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario against the in-memory host
    Run {
        /// Node configuration (YAML); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        scenario: PathBuf,
    },

    /// Validate a configuration file
    CheckConfig { config: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Run {
            config,
            json,
            scenario,
        } => run_scenario(config.as_deref(), &scenario, json),
        Commands::CheckConfig { config } => check_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<FlowConfig> {
    match path {
        Some(path) => FlowConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(FlowConfig::default()),
    }
}

fn run_scenario(config: Option<&Path>, path: &Path, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let scenario =
        Scenario::load(path).with_context(|| format!("loading scenario {}", path.display()))?;
    tracing::info!(scenario = %path.display(), steps = scenario.steps.len(), "running scenario");

    let report = ScenarioRunner::new(config, &scenario).run(&scenario)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    if let Some(name) = &report.name {
        println!("scenario: {name}");
    }
    for log in &report.steps {
        for sent in &log.commands {
            println!(
                "tick {:>3}  {}  command {} -> {}",
                log.tick, sent.command.sender, sent.command.name, sent.subject
            );
        }
        for output in &log.outputs {
            let subject = output
                .subject
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "tick {:>3}  {}  {:?} ({subject})",
                log.tick, output.node, output.port
            );
        }
        for diagnostic in &log.diagnostics {
            println!(
                "tick {:>3}  {}  {:?}: {}",
                diagnostic.tick, diagnostic.node, diagnostic.kind, diagnostic.message
            );
        }
    }
    println!(
        "final: latch={:?} in_flight={} updating={} live_pipes={}",
        report.latch, report.in_flight, report.updating, report.live_pipe_registrations
    );
}

fn check_config(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    println!("{}: ok", path.display());
    println!("  alertness_check: {}", config.alertness_check);
    println!("  transition_animations: {}", config.transition_animations);
    Ok(())
}
