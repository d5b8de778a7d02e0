use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aurelian_concierge::clients::{ExaSearchClient, ImageGenClient, VectorStoreClient};
use aurelian_concierge::{
    config::{Config, LogFormat},
    engine::ConciergeEngine,
    error::AppError,
    Arbiter, Composer,
};
use aurelian_concierge::storage::SqliteStorage;

/// Line-oriented submission surface for the concierge core.
#[derive(Debug, Parser)]
#[command(name = "aurelian", version, about)]
struct Cli {
    /// Override the session database path
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Aurelian concierge starting..."
    );

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            Arc::new(s)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize tool clients
    let retrieval = Arc::new(VectorStoreClient::new(
        &config.retrieval,
        config.request.clone(),
    )?);
    let web = Arc::new(ExaSearchClient::new(&config.search, &config.request)?);
    let generative = Arc::new(ImageGenClient::new(&config.generative, &config.request)?);

    let arbiter = Arbiter::new(
        retrieval,
        web,
        generative,
        config.policy.clone(),
        Duration::from_millis(config.request.timeout_ms),
    );
    let composer = Composer::new(&config.retrieval.catalog_base_url);

    let mut engine = ConciergeEngine::new(storage, arbiter, composer).await;

    info!("Ready, reading turns from stdin...");
    run_repl(&mut engine).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Read user turns line by line until EOF or `/quit`.
async fn run_repl(engine: &mut ConciergeEngine) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    // Show the latest assistant message (welcome on a fresh session).
    if let Some(turn) = engine.session().turns().last() {
        for part in &turn.parts {
            if let aurelian_concierge::session::TurnPart::Text { text, .. } = part {
                stdout.write_all(format!("{}\n\n", text).as_bytes()).await?;
            }
        }
    }
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                engine.clear().await;
                stdout.write_all(b"Session cleared.\n\n").await?;
            }
            input => match engine.handle_turn(input).await {
                Ok(draft) => {
                    stdout
                        .write_all(format!("{}\n\n", draft.text).as_bytes())
                        .await?;
                }
                Err(AppError::Session(e)) => {
                    stdout.write_all(format!("{}\n\n", e).as_bytes()).await?;
                }
                Err(e) => {
                    error!(error = %e, "Turn failed");
                    stdout
                        .write_all(b"Something went wrong with that turn; please try again.\n\n")
                        .await?;
                }
            },
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
