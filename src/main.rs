// src/main.rs — aftersales entry point

use clap::Parser;

use aftersales::cli::{Cli, Commands};
use aftersales::infra::config::Config;
use aftersales::infra::{logger, paths};
use aftersales::session::Sessions;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    paths::ensure_dirs()?;

    match cli.command {
        Commands::Sessions { action } => {
            let sessions = open_sessions(&config)?;
            aftersales::cli::sessions::run(&sessions, action)
        }
        Commands::Hydrate => {
            let sessions = open_sessions(&config)?;
            aftersales::cli::hydrate::run(&sessions)
        }
        Commands::Locate { query } => aftersales::cli::extract::run_locate(&config, &query),
        Commands::Extract {
            query,
            max_seconds,
            max_chars,
        } => aftersales::cli::extract::run_extract(&config, &query, max_seconds, max_chars).await,
    }
}

fn open_sessions(config: &Config) -> anyhow::Result<Sessions> {
    let sessions = Sessions::open(
        paths::sessions_dir(),
        &paths::db_path(),
        config.session.clone(),
    )?;
    Ok(sessions)
}
