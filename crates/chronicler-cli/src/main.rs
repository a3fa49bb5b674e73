mod cmd_report;
mod cmd_taxonomy;
mod config;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chronicler", version, about = "Discover what you did last quarter")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render activity reports for every configured subject
    Report {
        /// Subjects config file (YAML)
        #[arg(long, default_value = "subjects.yaml")]
        config: String,
        /// Window start, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Window end, exclusive (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
    /// Print the active forge event-kind taxonomy
    Taxonomy,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Report { config, from, to } => cmd_report::execute(&config, &from, &to),
        Command::Taxonomy => cmd_taxonomy::execute(),
    }
}
