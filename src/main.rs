//! dinq CLI: digital-development cluster predictions from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use dinq::config::ServiceConfig;
use dinq::dataset::PivotTable;
use dinq::error::DinqError;
use dinq::graph::GraphArtifact;
use dinq::paths::DinqPaths;
use dinq::request::{validate_cluster, validate_year};
use dinq::service::PredictionService;

#[derive(Parser)]
#[command(name = "dinq", version, about = "Digital inequality cluster predictor")]
struct Cli {
    /// Config file (default: $DINQ_CONFIG, then $XDG_CONFIG_HOME/dinq/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict clusters for every country in a year.
    Predict {
        #[arg(long)]
        year: i32,
    },

    /// Show the cluster history of one country.
    Trends {
        /// Country name (case-insensitive).
        #[arg(long)]
        country: String,

        /// Years to look back from the configured current year.
        #[arg(long)]
        years_back: Option<u32>,
    },

    /// Show statistics for one cluster in one year.
    Stats {
        #[arg(long)]
        year: i32,

        #[arg(long)]
        cluster: u32,
    },

    /// List feature-matrix columns and their indicator names.
    Features,

    /// Show what the loaded service holds.
    Info,

    /// Rebuild the historical year offset table from the dataset.
    Offsets {
        /// Long-format dataset CSV.
        #[arg(long)]
        dataset: PathBuf,

        /// Graph artifact to attach the table to.
        #[arg(long, requires = "output")]
        graph: Option<PathBuf>,

        /// Where to write the updated graph artifact.
        #[arg(long, requires = "graph")]
        output: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn load_service(config_path: Option<&std::path::Path>) -> Result<PredictionService> {
    let paths = DinqPaths::resolve().map_err(DinqError::from)?;
    let config = ServiceConfig::discover(config_path, &paths).map_err(DinqError::from)?;
    Ok(PredictionService::load(config, &paths)?)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Predict { year } => {
            let service = load_service(config_path)?;
            let year = validate_year(year, &service.config().server).map_err(DinqError::from)?;
            print_json(&*service.predict_clusters(year)?)?;
        }

        Commands::Trends {
            country,
            years_back,
        } => {
            let service = load_service(config_path)?;
            let years_back = years_back.unwrap_or(service.config().server.default_years_back);
            print_json(&service.country_trends(&country, years_back)?)?;
        }

        Commands::Stats { year, cluster } => {
            let service = load_service(config_path)?;
            let server = &service.config().server;
            let year = validate_year(year, server).map_err(DinqError::from)?;
            let cluster = validate_cluster(cluster, server).map_err(DinqError::from)?;
            print_json(&service.cluster_stats(year, cluster)?)?;
        }

        Commands::Features => {
            let service = load_service(config_path)?;
            print_json(service.feature_mapping())?;
        }

        Commands::Info => {
            let service = load_service(config_path)?;
            print_json(&service.info())?;
        }

        Commands::Offsets {
            dataset,
            graph,
            output,
        } => {
            let table = PivotTable::load(&dataset).map_err(DinqError::from)?.year_offsets();
            print_json(&table.to_pairs())?;

            if let (Some(graph), Some(output)) = (graph, output) {
                let mut artifact = GraphArtifact::load(&graph).map_err(DinqError::from)?;
                table.validate(artifact.x.len()).map_err(DinqError::from)?;
                artifact.node_offset = Some(table.to_pairs());
                artifact.save(&output).map_err(DinqError::from)?;
                eprintln!(
                    "Wrote {} year ranges over {} nodes to {}",
                    table.len(),
                    table.covered(),
                    output.display()
                );
            }
        }
    }

    Ok(())
}
