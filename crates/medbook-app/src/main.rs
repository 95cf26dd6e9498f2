//! Medbook application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Build the doctor directory, pattern classifier and dialog service
//! 3. Either chat on the console or serve the HTTP API

mod cli;

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use medbook_api::state::AppState;
use medbook_core::{MedbookConfig, UserId};
use medbook_dialog::{
    messages, DialogError, DialogService, IntentLabels, LoggingBackend, LogTransport, Transport,
};
use medbook_nlu::PatternClassifier;

use cli::{CliArgs, Mode};

/// Prints every answer to stdout.
struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn deliver(&self, _user_id: &UserId, text: &str) -> Result<(), DialogError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", text).map_err(|e| DialogError::Transport(e.to_string()))
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Talk to a single user over stdin until EOF or "quit".
async fn run_console(
    service: DialogService,
    user_id: UserId,
    bot_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", messages::greeting(bot_name));
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        match service.handle_message(&user_id, line).await {
            Ok(_) | Err(DialogError::EmptyMessage) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Turn failed");
                println!("{}", messages::CLARIFY);
            }
        }
        prompt();
    }

    service.flush().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = MedbookConfig::load_or_default(&config_file);

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Medbook v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Dialog pipeline.
    let directory = Arc::new(config.directory()?);
    tracing::info!(doctors = directory.len(), "Doctor directory ready");

    let classifier = PatternClassifier::new(
        Arc::clone(&directory),
        IntentLabels::from(&config.dialog),
    )?;

    match args.mode {
        Mode::Console => {
            let service = DialogService::from_config(
                &config,
                Arc::new(classifier),
                Arc::new(ConsoleTransport),
                Arc::new(LoggingBackend),
            )?;
            run_console(service, UserId::from(args.user.as_str()), &config.general.bot_name).await
        }
        Mode::Http => {
            let service = DialogService::from_config(
                &config,
                Arc::new(classifier),
                Arc::new(LogTransport),
                Arc::new(LoggingBackend),
            )?;

            config.api.port = args.resolve_port(config.api.port);
            let token_path = cli::medbook_dir().join("api_token");
            let api_token = args.resolve_api_token(config.api.token.as_deref(), &token_path);
            if api_token.is_none() {
                tracing::warn!("API authentication disabled");
            }

            let state = AppState::new(service, config.api.clone(), api_token);
            if let Err(e) = medbook_api::start_server(state).await {
                tracing::error!(
                    addr = %format!("{}:{}", config.api.host, config.api.port),
                    error = %e,
                    "API server stopped"
                );
                tracing::error!("Try: MEDBOOK_PORT={} medbook", config.api.port.saturating_add(1));
                return Err(e.into());
            }
            Ok(())
        }
    }
}
