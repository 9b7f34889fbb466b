use std::{path::PathBuf, sync::Arc, time::Duration};

use admin_client::HttpAdminBackend;
use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::ScenarioId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod controller;

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod screen_tests;

use config::{load_settings, normalize_api_base};
use controller::{
    commands::{parse_command, CommandParseError, ConsoleCommand},
    events::UiEvent,
    screen::ScreenController,
};

#[derive(Parser, Debug)]
#[command(about = "Edit scenario questions and ending guidances over the admin API")]
struct Args {
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// Scenario to open on startup.
    #[arg(long)]
    scenario: Option<i64>,
    #[arg(long)]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args.config);
    if let Some(api_base) = args.api_base {
        settings.api_base = api_base;
    }
    if let Some(username) = args.username {
        settings.username = username;
    }
    if args.password.is_some() {
        settings.password = args.password;
    }
    if let Some(log_filter) = args.log_filter {
        settings.log_filter = log_filter;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let api_base = normalize_api_base(&settings.api_base)?;
    let mut http = reqwest::Client::builder();
    if let Some(secs) = settings.request_timeout_secs {
        http = http.timeout(Duration::from_secs(secs));
    }
    let http = http.build().context("failed to build HTTP client")?;
    let backend = HttpAdminBackend::with_client(http, api_base.clone())
        .with_basic_auth(settings.username.clone(), settings.password.clone());
    info!(%api_base, username = %settings.username, "admin console starting");

    let mut controller = ScreenController::new(Arc::new(backend));
    let mut stdout = tokio::io::stdout();

    let opening = match args.scenario {
        Some(id) => ConsoleCommand::Select(ScenarioId(id)),
        None => ConsoleCommand::Scenarios,
    };
    if print_events(&mut stdout, controller.handle(opening).await).await? {
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let prompt = match controller.screen() {
            _ if controller.awaiting_confirmation() => "confirm> ".to_string(),
            Some(screen) => format!("{}> ", screen.scenario().name),
            None => "> ".to_string(),
        };
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(CommandParseError::Empty) => continue,
            Err(err) => {
                warn!(input = %line.trim(), error = %err, "rejected console input");
                stdout.write_all(format!("{err}\n").as_bytes()).await?;
                continue;
            }
        };
        if print_events(&mut stdout, controller.handle(cmd).await).await? {
            break;
        }
    }

    Ok(())
}

/// Writes events to stdout and reports whether the console should exit.
async fn print_events(stdout: &mut tokio::io::Stdout, events: Vec<UiEvent>) -> Result<bool> {
    let mut quit = false;
    for event in events {
        quit |= matches!(event, UiEvent::Quit);
        if let UiEvent::Error(err) = &event {
            warn!(context = ?err.context(), category = ?err.category(), "command failed");
        }
        stdout.write_all(format!("{event}\n").as_bytes()).await?;
    }
    stdout.flush().await?;
    Ok(quit)
}
