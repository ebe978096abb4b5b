//! gouml - PlantUML class diagrams from Go sources

mod config;
mod uml_cli;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gouml")]
#[command(about = "PlantUML class diagrams from Go sources", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a PlantUML class diagram
    Diagram(uml_cli::DiagramArgs),
    /// Dump the extracted entity model
    Model(uml_cli::ModelArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Diagram(args) => uml_cli::run_diagram(args)?,
        Commands::Model(args) => uml_cli::run_model(args)?,
    }

    Ok(())
}
