mod commands;
mod config;
mod openai;
mod server;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_add, cmd_add_estimated, cmd_delete, cmd_entries, cmd_estimate, cmd_preset_add,
    cmd_preset_delete, cmd_preset_list, cmd_settings_set, cmd_settings_show, cmd_summary,
};
use crate::config::{Config, EstimatorConfig};
use macrolog_core::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use macrolog_core::service::NutritionService;

const SERVER_LOG_FILTER: &str = "macrolog=info,macrolog_core=info,tower_http=info";
const CLI_LOG_FILTER: &str = "macrolog=warn,macrolog_core=warn";

#[derive(Parser)]
#[command(
    name = "macrolog",
    version,
    about = "Log calories, protein and fiber by day",
    long_about = "Log calories, protein and fiber by day.\n\n\
        Entries are grouped into calendar days of one reference timezone. \
        Run `macrolog serve` to expose the same log over a small JSON API."
)]
struct Cli {
    /// Path to the SQLite database (default: per-user data directory)
    #[arg(long, global = true, env = "MACROLOG_DB", value_name = "PATH")]
    db: Option<PathBuf>,
    /// IANA timezone that defines calendar days
    #[arg(
        long,
        global = true,
        env = "MACROLOG_TIMEZONE",
        default_value = "America/New_York"
    )]
    timezone: String,
    /// API key for food estimation (estimation is disabled without one)
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
    /// Chat model used for estimation
    #[arg(long, global = true, env = "MACROLOG_OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    openai_model: String,
    /// Base URL of an OpenAI-compatible API
    #[arg(
        long,
        global = true,
        env = "MACROLOG_OPENAI_BASE_URL",
        default_value = DEFAULT_BASE_URL
    )]
    openai_base_url: String,
    /// Seconds to wait for an estimate before giving up
    #[arg(
        long,
        global = true,
        env = "MACROLOG_ESTIMATE_TIMEOUT_SECS",
        default_value_t = 15
    )]
    estimate_timeout_secs: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "3000")]
        port: u16,
        /// Address to bind to (use 0.0.0.0 to expose to network)
        #[arg(short, long, env = "MACROLOG_BIND", default_value = "127.0.0.1")]
        bind: String,
    },
    /// List a day's entries (defaults to today)
    Entries {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log an entry
    Add {
        /// What was eaten
        description: String,
        /// Calories (kcal)
        #[arg(short, long)]
        calories: Option<f64>,
        /// Protein (g)
        #[arg(short, long)]
        protein: Option<f64>,
        /// Fiber (g)
        #[arg(short, long)]
        fiber: Option<f64>,
        /// Entry type: manual, ai, preset
        #[arg(long = "type", value_name = "TYPE")]
        entry_type: Option<String>,
        /// Estimate the numbers from the description and log them
        #[arg(long, conflicts_with_all = ["calories", "protein", "fiber", "entry_type"])]
        ai: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by ID
    Delete {
        /// Entry ID to delete
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage saved foods
    Preset {
        #[command(subcommand)]
        command: PresetCommands,
    },
    /// Show or change daily targets
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Estimate nutrients for a description without logging it
    Estimate {
        /// Food description, e.g. "two eggs and toast"
        description: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show totals against targets (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PresetCommands {
    /// Save a preset
    Add {
        /// Preset name
        name: String,
        /// Calories (kcal)
        #[arg(short, long)]
        calories: Option<f64>,
        /// Protein (g)
        #[arg(short, long)]
        protein: Option<f64>,
        /// Fiber (g)
        #[arg(short, long)]
        fiber: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List presets by name
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a preset by ID
    Delete {
        /// Preset ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show daily targets
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change daily targets
    Set {
        /// Daily calorie target (kcal)
        #[arg(long)]
        calories: Option<i64>,
        /// Daily protein target (g)
        #[arg(long)]
        protein: Option<i64>,
        /// Daily fiber target (g)
        #[arg(long)]
        fiber: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if matches!(cli.command, Commands::Serve { .. }) {
        SERVER_LOG_FILTER
    } else {
        CLI_LOG_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(
        cli.db,
        &cli.timezone,
        EstimatorConfig {
            api_key: cli.openai_api_key,
            model: cli.openai_model,
            base_url: cli.openai_base_url,
            timeout: Duration::from_secs(cli.estimate_timeout_secs),
        },
    )?;
    let estimator = config.estimator.build()?;
    let service = NutritionService::open(&config.db_path, config.timezone, estimator)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?
        .with_estimate_timeout(config.estimator.timeout);

    match cli.command {
        Commands::Serve { port, bind } => server::start_server(service, port, &bind).await,
        Commands::Entries { date, json } => cmd_entries(&service, date.as_deref(), json),
        Commands::Add {
            description,
            calories,
            protein,
            fiber,
            entry_type,
            ai,
            json,
        } => {
            if ai {
                cmd_add_estimated(&service, &description, json).await
            } else {
                cmd_add(
                    &service,
                    &description,
                    calories,
                    protein,
                    fiber,
                    entry_type.as_deref(),
                    json,
                )
            }
        }
        Commands::Delete { id, json } => cmd_delete(&service, id, json),
        Commands::Preset { command } => match command {
            PresetCommands::Add {
                name,
                calories,
                protein,
                fiber,
                json,
            } => cmd_preset_add(&service, &name, calories, protein, fiber, json),
            PresetCommands::List { json } => cmd_preset_list(&service, json),
            PresetCommands::Delete { id, json } => cmd_preset_delete(&service, id, json),
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(&service, json),
            SettingsCommands::Set {
                calories,
                protein,
                fiber,
                json,
            } => cmd_settings_set(&service, calories, protein, fiber, json),
        },
        Commands::Estimate { description, json } => {
            cmd_estimate(&service, &description, json).await
        }
        Commands::Summary { date, json } => cmd_summary(&service, date.as_deref(), json),
    }
}
