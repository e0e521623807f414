//! Ativos CLI - serve and inspect the class/node/edge graph

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use ativos::config::{self, AtivosConfig, Overrides};
use ativos::storage::SqliteStore;
use ativos::ui;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ativos")]
#[command(version)]
#[command(about = "Dynamic graph-modeling backend - classes, ativos and vínculos over HTTP")]
#[command(long_about = r#"
Ativos lets clients define Classes (free-form attribute templates), create
Ativos (nodes) of a Class and connect them with typed Vínculos (edges).
Deleting a Class or an Ativo cascades to everything that depends on it.

Example usage:
  ativos init
  ativos serve --port 3000
  ativos stats --format json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Write a config file and create the database
    Init {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show entity counts
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if let Err(e) = run(cli).await {
        ui::failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let file = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port, database } => {
            let settings = config::resolve_from_env(Overrides { database, host, port }, file)?;
            config::ensure_db_dir(&settings.database)?;

            tracing::info!("Opening database {:?}", settings.database);
            let store = SqliteStore::open(&settings.database)?;
            let addr = settings.socket_addr()?;

            let listener = ativos::server::bind(addr).await?;

            ui::serve_banner(listener.local_addr()?, &settings.database);
            ativos::server::start_server(listener, store).await?;
        }

        Commands::Init { database, force } => {
            let config_path = cli.config.unwrap_or_else(config::default_config_path);
            let database = database.unwrap_or_else(|| config::default_database_path_in(Path::new(".")));

            let new_config = AtivosConfig {
                database: Some(database.display().to_string()),
                host: Some(config::DEFAULT_HOST.to_string()),
                port: Some(config::DEFAULT_PORT),
            };
            config::write_config(&config_path, &new_config, force)?;
            config::ensure_db_dir(&database)?;
            SqliteStore::open(&database)?;

            if let Err(e) = config::ensure_gitignore(Path::new(".")) {
                ui::notice(&format!("could not update .gitignore: {}", e));
            }

            ui::init_summary(&config_path, &database);
        }

        Commands::Stats { database, format } => {
            let settings = config::resolve_from_env(
                Overrides { database, ..Default::default() },
                file,
            )?;
            if !settings.database.exists() {
                anyhow::bail!("database not found at {}", settings.database.display());
            }

            let store = SqliteStore::open(&settings.database)?;
            let stats = store.stats()?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                ui::stats(&settings.database, &stats);
            }
        }
    }

    Ok(())
}
