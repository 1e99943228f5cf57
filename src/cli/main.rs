mod utils;

use crate::utils::{NeighbourRow, NeighbourStatusRow, RouteRow, SourceRow};
use clap::{Parser, Subcommand};
use looking_glass_sources::api::Route;
use looking_glass_sources::config::config_path_from_env;
use looking_glass_sources::{Config, LgError, Source, SourceRegistry};
use serde::Serialize;
use std::path::PathBuf;
use std::process::exit;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tokio::runtime::Runtime;
use tracing::{error, info};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file, defaults to $LG_SOURCES_CONFIG or /etc/alice-lg/alice.conf
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// disable logging
    #[clap(long, global = true)]
    no_log: bool,

    /// print out results in JSON format instead of Markdown table
    #[clap(short, long, global = true)]
    json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configuration and print a summary
    Check,

    /// List the configured sources
    Sources,

    /// Show the status of a source
    Status {
        /// source id
        source: String,
    },

    /// List the neighbours of a source
    Neighbours {
        /// source id
        source: String,

        /// only show session states
        #[clap(short, long)]
        status_only: bool,
    },

    /// List the routes of a source
    Routes {
        /// source id
        source: String,

        /// neighbour id, all routes of the source if omitted
        neighbour: Option<String>,

        /// show routes rejected by the import filter
        #[clap(long, group = "category")]
        filtered: bool,

        /// show routes not exported to other neighbours
        #[clap(long, group = "category")]
        not_exported: bool,
    },

    /// Print the UI configuration derived from the config file
    Ui,
}

/// Route category selected by the `routes` command.
#[derive(Debug, PartialEq, Eq)]
enum RouteQuery {
    All,
    Received(String),
    Filtered(String),
    NotExported(String),
}

impl RouteQuery {
    /// The category flags win over a missing neighbour: `--filtered` and
    /// `--not-exported` without a neighbour query with an empty neighbour id.
    fn new(neighbour: Option<String>, filtered: bool, not_exported: bool) -> Self {
        match (neighbour, filtered, not_exported) {
            (n, true, _) => RouteQuery::Filtered(n.unwrap_or_default()),
            (n, _, true) => RouteQuery::NotExported(n.unwrap_or_default()),
            (Some(n), false, false) => RouteQuery::Received(n),
            (None, false, false) => RouteQuery::All,
        }
    }

    async fn fetch(&self, source: &dyn Source) -> Result<Vec<Route>, LgError> {
        let routes = match self {
            RouteQuery::All => source.all_routes().await?.imported,
            RouteQuery::Received(n) => source.routes_received(n).await?.imported,
            RouteQuery::Filtered(n) => source.routes_filtered(n).await?.filtered,
            RouteQuery::NotExported(n) => source.routes_not_exported(n).await?.not_exported,
        };
        Ok(routes)
    }
}

fn get_tokio_runtime() -> Runtime {
    match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to start tokio runtime: {}", e);
            exit(1);
        }
    }
}

fn enable_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(true)
        .with_level(true)
        .with_target(false)
        .init();
}

fn print_items<T: Serialize + Tabled>(items: Vec<T>, json: bool) {
    if json {
        print_json(&items);
    } else {
        println!("{}", Table::new(items).with(Style::markdown()));
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            error!("failed to serialize output: {}", e);
            exit(1);
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Config {
    let path = path.unwrap_or_else(config_path_from_env);
    match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration {}: {}", path.display(), e);
            exit(1);
        }
    }
}

async fn run_query(
    registry: &SourceRegistry,
    command: Commands,
    json: bool,
) -> Result<(), LgError> {
    match command {
        Commands::Status { source } => {
            let status = registry.instance(&source)?.status().await?;
            print_json(&status);
        }
        Commands::Neighbours {
            source,
            status_only,
        } => {
            let source = registry.instance(&source)?;
            if status_only {
                let response = source.neighbours_status().await?;
                info!("{} neighbours", response.neighbours.len());
                print_items(
                    response
                        .neighbours
                        .iter()
                        .map(NeighbourStatusRow::from)
                        .collect(),
                    json,
                );
            } else {
                let response = source.neighbours().await?;
                info!("{} neighbours", response.neighbours.len());
                print_items(
                    response.neighbours.iter().map(NeighbourRow::from).collect(),
                    json,
                );
            }
        }
        Commands::Routes {
            source,
            neighbour,
            filtered,
            not_exported,
        } => {
            let source = registry.instance(&source)?;
            let routes = RouteQuery::new(neighbour, filtered, not_exported)
                .fetch(source.as_ref())
                .await?;
            info!("{} routes", routes.len());
            print_items(routes.iter().map(RouteRow::from).collect(), json);
        }
        Commands::Check | Commands::Sources | Commands::Ui => {}
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "looking_glass_sources=info");
    }
    if !cli.no_log {
        enable_logging();
    }

    let config = load_config(cli.config);

    match cli.command {
        Commands::Check => {
            for line in config.display_summary() {
                println!("{}", line);
            }
        }
        Commands::Sources => {
            print_items(config.sources.iter().map(SourceRow::from).collect(), cli.json);
        }
        Commands::Ui => {
            print_json(&config.ui);
        }
        command => {
            let registry = SourceRegistry::new(config.sources);
            let rt = get_tokio_runtime();
            if let Err(e) = rt.block_on(run_query(&registry, command, cli.json)) {
                error!("{}", e);
                exit(1);
            }
        }
    }
}
