//! Service binary: runs the contact API or probes the SMTP relay.

use clap::{Parser, Subcommand};

/// Contact-form backend service
#[derive(Parser, Debug)]
#[command(name = "missive")]
#[command(about = "Contact-form backend service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service (the default)
    Serve,
    /// Probe the configured SMTP relay and exit
    CheckSmtp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = missive::config::load()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => config.run().await,
        Commands::CheckSmtp => config.check_smtp().await,
    }
}
