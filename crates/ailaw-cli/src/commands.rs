use ailaw_core::types::{ChatMessage, MessageId, Role, SessionId, DEFAULT_TITLE};
use tracing::{info, warn};

use crate::app::App;
use crate::cli::{joined, FeedbackKind, LoginArgs, SessionsCommand};

pub async fn sessions(app: &App, cmd: SessionsCommand) -> anyhow::Result<()> {
    app.require_login()?;
    match cmd {
        SessionsCommand::List => {
            let sessions = app.api.list_sessions().await?;
            if sessions.is_empty() {
                println!("no sessions");
            }
            for s in sessions {
                let when = s.last_message_at.or(s.created_at).unwrap_or_default();
                println!("{}  {:<25}  {}", s.session_id, when, s.title);
            }
        }
        SessionsCommand::New { title } => {
            let title = joined(&title);
            let title = if title.is_empty() { DEFAULT_TITLE.to_string() } else { title };
            let id = app.api.create_session(&title).await?;
            println!("{id}");
        }
        SessionsCommand::Rename { session_id, name } => {
            let name = app
                .api
                .rename_session(&SessionId(session_id), &joined(&name))
                .await?;
            println!("renamed to {name}");
        }
        SessionsCommand::Delete { session_id } => {
            app.api.delete_session(&SessionId(session_id)).await?;
            println!("deleted");
        }
    }
    Ok(())
}

pub async fn history(app: &App, session_id: String) -> anyhow::Result<()> {
    app.require_login()?;
    let messages = app.api.messages(&SessionId(session_id)).await?;
    for m in &messages {
        print_message(m);
    }
    Ok(())
}

pub fn print_message(m: &ChatMessage) {
    match m.role {
        Role::User => println!("> {}", m.content),
        Role::Model => {
            let mark = match m.feedback.map(|f| f.as_i8()) {
                Some(1) => " [liked]",
                Some(_) => " [disliked]",
                None => "",
            };
            println!("{}\n  ({}){}", m.content, m.message_id, mark);
        }
    }
    println!();
}

pub async fn feedback(app: &App, message_id: String, kind: FeedbackKind) -> anyhow::Result<()> {
    app.require_login()?;
    app.api
        .set_feedback(&MessageId(message_id), kind.as_feedback())
        .await?;
    println!("feedback saved");
    Ok(())
}

pub async fn login(app: &App, args: LoginArgs) -> anyhow::Result<()> {
    match args.code {
        Some(code) => {
            let token = app.api.exchange_code(&code).await?;
            info!("access token issued");
            println!("signed in; keep the session with:");
            println!("  export AILAW_AUTH__ACCESS_TOKEN={token}");
            match app.api.refresh_token() {
                Some(refresh) => println!("  export AILAW_AUTH__REFRESH_TOKEN={refresh}"),
                None => warn!("no refresh cookie issued; sign in again when the token expires"),
            }
        }
        None => {
            let url = app.api.google_login_url(args.email.as_deref())?;
            println!("open this URL to sign in, then run `ailaw login --code <CODE>`:");
            println!("  {url}");
        }
    }
    Ok(())
}

pub async fn logout(app: &App) -> anyhow::Result<()> {
    if !app.tokens.is_present() {
        println!("not signed in");
        return Ok(());
    }
    app.api.logout().await;
    println!("signed out");
    Ok(())
}

pub async fn health(app: &App) -> anyhow::Result<()> {
    app.api.health().await?;
    println!("ok: {}", app.api.base_url());
    Ok(())
}
