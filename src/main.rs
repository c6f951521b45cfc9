//! umlscan - class diagrams for Python packages

mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Without a subcommand, renders the diagram using the top-level flags
#[derive(Parser)]
#[command(name = "umlscan")]
#[command(about = "Class diagrams for Python packages", version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<cli::Commands>,
    #[command(flatten)]
    diagram: cli::DiagramArgs,
}

impl Cli {
    fn into_command(self) -> cli::Commands {
        self.command
            .unwrap_or(cli::Commands::Diagram(self.diagram))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli::run(cli.into_command())
}
