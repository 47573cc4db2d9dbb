//! Arpegio CLI - offline driver for the arpeggiation engine.

mod render;
mod script;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arpegio")]
#[command(author, version, about = "Arpegio arpeggiation engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a performance to a note-event schedule
    Render(render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => render::run(args),
    }
}
