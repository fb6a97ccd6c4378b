mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cogflare::config::CogflareConfig;

#[derive(Parser)]
#[command(name = "cogflare", version, about = "Hypergraph knowledge store and mind-agent scheduler")]
struct Cli {
    /// Config file (defaults to ~/.cogflare/config.toml)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Keep every instance in memory; nothing is written to disk
        #[arg(long)]
        ephemeral: bool,
    },
    /// Show atomspace statistics
    Stats {
        #[arg(long)]
        instance: Option<String>,
    },
    /// Check database health
    Doctor {
        #[arg(long)]
        instance: Option<String>,
    },
    /// Export atoms, agents and goals as JSON to stdout
    Export {
        #[arg(long)]
        instance: Option<String>,
    },
    /// Delete all data of an instance
    Reset {
        #[arg(long)]
        instance: Option<String>,
    },
    /// List agents and recent executions
    Agents {
        #[arg(long)]
        instance: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit --config path wins over ~/.cogflare/config.toml.
    let mut config = match &cli.config {
        Some(path) => CogflareConfig::load_from(path)?,
        None => CogflareConfig::load()?,
    };

    // Log to stderr so stdout stays clean for `export`.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { ephemeral } => {
            if ephemeral {
                config.storage.in_memory = true;
                tracing::warn!("ephemeral mode: no data will be persisted");
            }
            cogflare::server::serve(config).await?;
        }
        Command::Stats { instance } => {
            let name = cli::instance_name(&config, instance)?;
            cli::stats::stats(&config, &name)?;
        }
        Command::Doctor { instance } => {
            let name = cli::instance_name(&config, instance)?;
            cli::doctor::doctor(&config, &name)?;
        }
        Command::Export { instance } => {
            let name = cli::instance_name(&config, instance)?;
            cli::export::export(&config, &name)?;
        }
        Command::Reset { instance } => {
            let name = cli::instance_name(&config, instance)?;
            cli::reset::reset(&config, &name)?;
        }
        Command::Agents { instance } => {
            let name = cli::instance_name(&config, instance)?;
            cli::agents::agents(&config, &name)?;
        }
    }

    Ok(())
}
