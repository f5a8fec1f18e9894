//! trim CLI - trimmed solid reconstruction
//!
//! Reads a curve network and a primitive list, rebuilds the trimmed model
//! and writes it as an exchange file and an STL mesh.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use trim_cad::GeometryKernel;
use trim_core::constants::{
    DEFAULT_CURVES_PATH, DEFAULT_EXCHANGE_PATH, DEFAULT_STL_PATH, DEFAULT_SURFACES_PATH,
};
use trim_core::{
    CurveNetwork, Primitive, TrimConfig, classify_network, export_exchange, export_stl,
    load_curve_network, load_primitives, trim_object,
};

#[derive(Parser)]
#[command(name = "trim")]
#[command(about = "Rebuild a trimmed solid from boundary curves and fitted primitives", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Primitive list (JSON)
    #[arg(long, default_value = DEFAULT_SURFACES_PATH)]
    surfaces: PathBuf,
    /// Curve network (JSON)
    #[arg(long, default_value = DEFAULT_CURVES_PATH)]
    curves: PathBuf,
    /// Configuration file (RON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct the model and write the output files
    Run {
        #[command(flatten)]
        input: InputArgs,
        /// Exchange file output: RON expression tree (csg) or JSON B-rep (truck)
        #[arg(long, alias = "step", default_value = DEFAULT_EXCHANGE_PATH)]
        exchange: PathBuf,
        /// STL output
        #[arg(long, default_value = DEFAULT_STL_PATH)]
        stl: PathBuf,
        /// Geometry kernel backend (csg, truck)
        #[arg(long)]
        kernel: Option<String>,
    },
    /// List the primitives each curve lies on
    Classify {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the default configuration
    Config,
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trim_core=info,trim_cad=info,trim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            exchange,
            stl,
            kernel,
        } => run(&input, &exchange, &stl, kernel.as_deref()),
        Commands::Classify { input } => classify(&input),
        Commands::Config => {
            print!("{}", TrimConfig::default().to_ron_string()?);
            Ok(())
        }
    }
}

fn load_inputs(input: &InputArgs) -> Result<(CurveNetwork, Vec<Primitive>, TrimConfig)> {
    let config = match &input.config {
        Some(path) => TrimConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TrimConfig::default(),
    };
    let network = load_curve_network(&input.curves)
        .with_context(|| format!("Failed to read curves {}", input.curves.display()))?;
    let primitives = load_primitives(&input.surfaces)
        .with_context(|| format!("Failed to read primitives {}", input.surfaces.display()))?;
    Ok((network, primitives, config))
}

fn select_kernel(name: Option<&str>) -> Result<Box<dyn GeometryKernel>> {
    let kernel = match name {
        Some(name) => trim_cad::kernel_by_name(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown geometry kernel: {}", name))?,
        None => trim_cad::default_kernel(),
    };
    if !kernel.is_available() {
        anyhow::bail!("Geometry kernel '{}' is not available", kernel.name());
    }
    tracing::info!("Using {} kernel", kernel.name());
    Ok(kernel)
}

fn run(input: &InputArgs, exchange: &Path, stl: &Path, kernel: Option<&str>) -> Result<()> {
    let (network, primitives, config) = load_inputs(input)?;
    let kernel = select_kernel(kernel)?;

    let model = trim_object(&network, &primitives, &config, kernel.as_ref())
        .context("Failed to assemble the trimmed model")?;

    for skipped in &model.report.skipped {
        tracing::warn!("Curve {} not in model: {:?}", skipped.curve, skipped.reason);
    }

    export_exchange(kernel.as_ref(), &model.compound, exchange)
        .with_context(|| format!("Failed to write {}", exchange.display()))?;
    println!("Saved exchange file {}", exchange.display());

    let triangles = export_stl(kernel.as_ref(), &model.compound, config.stl_tolerance, stl)
        .with_context(|| format!("Failed to write {}", stl.display()))?;
    println!("Saved {} ({} triangles)", stl.display(), triangles);

    Ok(())
}

fn classify(input: &InputArgs) -> Result<()> {
    let (network, primitives, config) = load_inputs(input)?;

    for (index, result) in classify_network(&network, &primitives, &config)
        .into_iter()
        .enumerate()
    {
        match result {
            Ok(classified) => {
                let shape = if classified.is_closed() { "closed" } else { "open" };
                println!(
                    "curve {} ({}) has primitives {:?}",
                    classified.index(),
                    shape,
                    classified.primitives
                );
                for id in &classified.primitives {
                    if let Some(primitive) = primitives.get(*id) {
                        println!("    {} {}: {:?}", primitive.kind(), id, primitive.surface);
                    }
                }
            }
            Err(e) => println!("curve {}: {}", index, e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["trim", "run"]).unwrap();
        let Commands::Run {
            input,
            exchange,
            stl,
            kernel,
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(input.surfaces, PathBuf::from(DEFAULT_SURFACES_PATH));
        assert_eq!(input.curves, PathBuf::from(DEFAULT_CURVES_PATH));
        assert!(input.config.is_none());
        assert_eq!(exchange, PathBuf::from(DEFAULT_EXCHANGE_PATH));
        assert_eq!(stl, PathBuf::from(DEFAULT_STL_PATH));
        assert!(kernel.is_none());
    }

    #[test]
    fn test_exchange_flag_and_step_alias() {
        for flag in ["--exchange", "--step"] {
            let cli = Cli::try_parse_from(["trim", "run", flag, "out.ron"]).unwrap();
            let Commands::Run { exchange, .. } = cli.command else {
                panic!("expected run");
            };
            assert_eq!(exchange, PathBuf::from("out.ron"));
        }
    }

    #[test]
    fn test_unknown_kernel_rejected() {
        assert!(select_kernel(Some("opencascade")).is_err());
        assert!(select_kernel(Some("null")).is_err());
        assert!(select_kernel(Some("csg")).is_ok());
    }
}
