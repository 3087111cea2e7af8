use clap::Parser;
use tracing::warn;

mod app;
mod chat;
mod cli;
mod commands;

use cli::{Cli, Command};

/// Used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str =
    "ailaw=warn,ailaw_core=warn,ailaw_protocol=warn,ailaw_api=warn,ailaw_stream=warn,ailaw_chat=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr; stdout carries answers
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config / AILAW_CONFIG > ~/.ailaw/ailaw.toml
    let config = ailaw_core::AilawConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        ailaw_core::AilawConfig::default()
    });
    let app = app::App::new(config)?;

    match cli.command {
        Command::Chat(args) => chat::run(&app, args).await,
        Command::Sessions(cmd) => commands::sessions(&app, cmd).await,
        Command::History { session_id } => commands::history(&app, session_id).await,
        Command::Feedback { message_id, kind } => commands::feedback(&app, message_id, kind).await,
        Command::Login(args) => commands::login(&app, args).await,
        Command::Logout => commands::logout(&app).await,
        Command::Health => commands::health(&app).await,
    }
}

#[cfg(test)]
mod tests {
    use super::DEFAULT_LOG_FILTER;

    #[test]
    fn default_filter_covers_every_crate() {
        for target in [
            "ailaw",
            "ailaw_core",
            "ailaw_protocol",
            "ailaw_api",
            "ailaw_stream",
            "ailaw_chat",
        ] {
            let directive = format!("{target}=warn");
            assert!(
                DEFAULT_LOG_FILTER.split(',').any(|d| d == directive),
                "{target} missing"
            );
        }
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
