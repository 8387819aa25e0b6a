//! Bastion CLI — run the authorization server or check a user database.
//!
//! ```bash
//! bastion serve --config bastion.toml
//! bastion check --config bastion.toml
//! ```
//!
//! See `bastion --help` for all available commands and options.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bastion", about = "Bastion authorization server", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the admin surface until Ctrl-C
    Serve {
        /// Config file (defaults to ./bastion.toml when present)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Override server.host
        #[arg(long)]
        host: Option<String>,

        /// Override server.port
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// Fetch and validate the user database without serving
    Check {
        /// Config file (defaults to ./bastion.toml when present)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, host, port } => {
            commands::serve::run(config.as_deref(), host, port).await
        }
        Commands::Check { config } => commands::check::run(config.as_deref()).await.map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
