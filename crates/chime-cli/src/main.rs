use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod adapters;
mod commands;

#[derive(Parser)]
#[command(name = "chime", version, about = "Reminder scheduler with a persistent alarm")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reminder management
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Per-bot mute flags and the client session id
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Send an utterance to the intent endpoint; reminders it creates are stored
    Ask {
        /// What to ask, e.g. "remind me to call mom at 6pm"
        text: String,
    },
    /// Poll for due reminders and ring until dismissed
    Run(commands::run::RunArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CHIME_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Ask { text } => commands::ask::run(&text),
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
