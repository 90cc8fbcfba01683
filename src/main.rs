use anyhow::Result;
use clap::{Parser, Subcommand};

use flightlens::{cli, config, web};

#[derive(Debug, Parser)]
#[command(name = "flightlens")]
#[command(about = "Interpretation and visualization for airline review analytics")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send an analytics result to the interpreter and print the narrative
    Interpret {
        /// Path to the analytics result JSON, or `-` for stdin
        result: String,
        /// The user's original question
        #[arg(long, default_value = "")]
        query: String,
        /// Output format: text (default), json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show chart data and summary cards for an analytics result
    Visualize {
        /// Path to the analytics result JSON, or `-` for stdin
        result: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Run the local JSON API
    Serve {
        /// Listen address (default: `[server] addr` from config)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Summarize past interpretation calls
    History {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check config, interpreter reachability and the event log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config to ~/.flightlens/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `interpreter.timeout_ms 30000`
    Set { key: String, value: String },
    /// Restore the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Interpret {
            result,
            query,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_interpret(&result, &query, fmt)
        }
        Commands::Visualize { result, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_visualize(&result, fmt)
        }
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config::load().server.addr);
            web::serve(&addr)
        }
        Commands::History { days, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, days)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
