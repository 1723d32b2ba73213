use clap::{Parser, Subcommand};
use std::sync::Arc;

mod application;
mod domain;
mod infrastructure;

use infrastructure::adapters::console::{ConsoleFactory, ConsolePrompt};
use infrastructure::commands::LibraryLoader;
use infrastructure::config::Config;
use infrastructure::session::BotRuntime;
use infrastructure::storage::FileCredentialStore;

#[derive(Parser)]
#[command(name = "waru-bot")]
#[command(about = "Session supervisor and command dispatcher for chat bots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            run_bot(cli.config);
        }
        Commands::Version => {
            println!("waru-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn run_bot(config_path: String) {
    // Load config
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using environment", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    tracing::info!("Starting waru-bot: {}", config.bot.name);

    let mut runtime = BotRuntime::new(
        &config,
        Arc::new(ConsoleFactory),
        Arc::new(FileCredentialStore::new(&config.auth.directory)),
        Arc::new(ConsolePrompt),
        Arc::new(LibraryLoader),
    );

    let rt = tokio::runtime::Runtime::new().unwrap();
    match rt.block_on(runtime.start()) {
        Ok(()) => {
            tracing::info!("Supervisor stopped");
        }
        Err(e) if e.is_fatal() => {
            tracing::error!("Fatal: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            // Top-level safety net: log and exit cleanly rather than
            // crash; the supervisor has already given up restarting.
            tracing::error!("Bot stopped with error: {}", e);
        }
    }
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => match std::fs::write("config.yaml", yaml) {
            Ok(()) => println!("Wrote config.yaml"),
            Err(e) => eprintln!("Failed to write config.yaml: {}", e),
        },
        Err(e) => eprintln!("Failed to serialize config: {}", e),
    }
}
