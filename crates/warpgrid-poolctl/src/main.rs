use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "warpgrid-poolctl",
    about = "WarpGrid connection pool tool",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a pool config file and print the effective settings
    Check {
        /// Path to the pool config (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Open a pool against the configured TCP address and print its status.
    ///
    /// The pool is initialized to min_size, optionally has `--reserve`
    /// connections checked out, and is purged before exiting.
    Status {
        /// Path to the pool config (TOML)
        #[arg(short, long)]
        config: PathBuf,
        /// Number of connections to reserve before taking the snapshot
        #[arg(short, long, default_value = "0")]
        reserve: usize,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => commands::check::check(&config),
        Commands::Status {
            config,
            reserve,
            format,
        } => commands::status::status(&config, reserve, &format).await,
    }
}
