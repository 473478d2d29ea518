use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "greentrigger-cli", version, about = "Green energy trigger CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one polling request
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Inspect the event ledger
    Events {
        #[command(subcommand)]
        action: commands::events::EventsAction,
    },
    /// Time-of-day window helpers
    Window {
        #[command(subcommand)]
        action: commands::window::WindowAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    // stderr only: stdout carries response payloads
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run(args),
        Commands::Events { action } => commands::events::run(action),
        Commands::Window { action } => commands::window::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
