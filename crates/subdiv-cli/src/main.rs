mod config;
mod systems;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use subdiv_core::{
    ActiveBox, BoxGrid, Interval, SubdivisionDriver, SubdivisionEngine, TracingObserver,
};

use config::{RunConfig, RunSettings, parse_domain, parse_param};
use systems::CATALOGUE;

#[derive(Parser)]
#[command(name = "subdiv", about = "Box-subdivision covering of attractors and unstable manifolds")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cover the invariant set of a built-in system
    Run(RunArgs),

    /// List built-in systems with their parameters and default domains
    Systems,
}

#[derive(Args)]
struct RunArgs {
    /// Built-in system name (see `subdiv systems`)
    #[arg(long)]
    system: Option<String>,

    /// Target depth; the final grid has 2^depth boxes per axis
    #[arg(long)]
    depth: Option<u32>,

    /// Domain as "min,max;min,max;..." (defaults to the system's domain)
    #[arg(long, allow_hyphen_values = true)]
    domain: Option<String>,

    /// Test points per axis in every active box
    #[arg(long)]
    samples: Option<usize>,

    /// Depth of the fully active starting grid
    #[arg(long)]
    seed_depth: Option<u32>,

    /// Refine on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// System parameter override, repeatable
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, f64)>,

    /// TOML config file (default: $SUBDIV_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Summary)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Summary,
    Json,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Systems => cmd_systems(),
    }
}

fn load_settings(args: &RunArgs) -> Result<RunSettings> {
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var_os("SUBDIV_CONFIG").map(PathBuf::from));
    let file = match &config_path {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let domain = args
        .domain
        .as_deref()
        .map(parse_domain)
        .transpose()
        .map_err(|e| anyhow::anyhow!("invalid --domain: {e}"))?;
    let flags = RunConfig {
        system: args.system.clone(),
        depth: args.depth,
        domain,
        samples: args.samples,
        seed_depth: args.seed_depth,
        parallel: args.sequential.then_some(false),
        params: args.params.iter().cloned().collect::<BTreeMap<_, _>>(),
    };
    file.overlay(flags).resolve()
}

fn cmd_run(args: &RunArgs) -> Result<()> {
    let settings = load_settings(args)?;
    tracing::info!(
        "covering {} on {}-dimensional domain to depth {}",
        settings.system.name(),
        settings.domain.dimension(),
        settings.depth
    );

    let engine = SubdivisionEngine::new()
        .with_samples_per_dimension(settings.samples)
        .with_parallel(settings.parallel);
    let driver = SubdivisionDriver::new(engine).with_seed_depth(settings.seed_depth);
    let grid = driver
        .run_observed(
            &settings.system,
            Arc::new(settings.domain.clone()),
            settings.depth,
            &mut TracingObserver,
        )
        .context("subdivision failed")?;

    match args.format {
        Format::Summary => print_summary(&settings, &grid),
        Format::Json => print_json(&settings, &grid)?,
    }
    Ok(())
}

fn print_summary(settings: &RunSettings, grid: &BoxGrid) {
    let summary = grid.summary();
    println!("system:     {}", settings.system.name());
    println!("depth:      {}", summary.depth);
    println!("resolution: {}", summary.resolution);
    println!("boxes:      {}", summary.box_count);
    println!("active:     {}", summary.active_count);
    println!("covered:    {:.6}", summary.covered_volume);
}

#[derive(Serialize)]
struct GridExport<'a> {
    system: &'static str,
    depth: u32,
    resolution: usize,
    domain: &'a [Interval],
    boxes: Vec<ActiveBox>,
}

fn print_json(settings: &RunSettings, grid: &BoxGrid) -> Result<()> {
    let export = GridExport {
        system: settings.system.name(),
        depth: grid.depth(),
        resolution: grid.resolution(),
        domain: grid.domain().intervals(),
        boxes: grid.active_boxes().collect(),
    };
    let stdout = std::io::stdout();
    serde_json::to_writer(stdout.lock(), &export).context("failed to write JSON")?;
    println!();
    Ok(())
}

fn cmd_systems() -> Result<()> {
    for info in CATALOGUE {
        println!("{:<10} {}", info.name, info.summary);
        let params: Vec<String> = info.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        if !params.is_empty() {
            println!("{:<10} params: {}", "", params.join(" "));
        }
        let domain: Vec<String> = info.domain.iter().map(|(lo, hi)| format!("{lo},{hi}")).collect();
        println!("{:<10} domain: {}", "", domain.join(";"));
    }
    Ok(())
}
