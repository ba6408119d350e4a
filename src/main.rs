use anyhow::Context;
use blue_destination::logging::init_logging;
use blue_destination::{AppState, Config, ConfigOverrides, SearchFilters, Server};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "blue-destination")]
#[command(about = "Travel package catalog: search, favorites and notifications")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// JSON fixture file used to seed the in-memory store
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,
    },
    /// Run one package search and print the results as JSON
    Search(SearchArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct SearchArgs {
    /// Free-text query matched against package names
    #[arg(short, long)]
    query: Option<String>,

    #[arg(short, long)]
    destination: Option<String>,

    /// One of price-asc, price-desc, duration-asc, duration-desc, name-asc, name-desc
    #[arg(short, long)]
    sort_by: Option<String>,

    #[arg(short, long)]
    page: Option<u32>,

    #[arg(short, long)]
    limit: Option<u32>,
}

impl From<SearchArgs> for SearchFilters {
    fn from(args: SearchArgs) -> Self {
        Self {
            query: args.query,
            destination_id: args.destination,
            sort_by: args.sort_by,
            page: args.page,
            limit: args.limit,
            ..Self::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (port, host) = match &cli.command {
        Command::Serve { port, host } => (*port, host.clone()),
        _ => (None, None),
    };
    let overrides = ConfigOverrides {
        port,
        host,
        log_level: cli.log_level.clone(),
        fixtures: cli.fixtures.clone(),
    };
    let config = Config::load_with_overrides(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    init_logging(&config.logging)?;
    match Config::source_path(cli.config.as_deref()) {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file found, using defaults and environment"),
    }

    match cli.command {
        Command::Serve { .. } => {
            info!(
                "Starting blue-destination v{} on {}:{}",
                env!("CARGO_PKG_VERSION"),
                config.server.host,
                config.server.port
            );
            Server::new(config).run().await?;
        }
        Command::Search(args) => {
            let state = AppState::from_config(&config).await?;
            let packages = state.search.search_packages(&args.into()).await?;
            println!("{}", serde_json::to_string_pretty(&packages)?);
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
