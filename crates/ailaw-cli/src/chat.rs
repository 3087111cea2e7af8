use std::future::Future;
use std::io::Write;
use std::time::Duration;

use ailaw_chat::{ChatError, ChatSession, SendOutcome};
use ailaw_core::types::{ChatMessage, Feedback, ModelType, Role, SessionId};
use ailaw_core::ErrorInfo;
use ailaw_stream::{StreamClient, StreamEvent, StreamHandle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::app::App;
use crate::cli::{joined, ChatArgs};
use crate::commands::print_message;

/// How long to wait for the socket before the first prompt.
const CONNECT_WAIT: Duration = Duration::from_secs(5);

pub async fn run(app: &App, args: ChatArgs) -> anyhow::Result<()> {
    app.require_login()?;
    let model = args
        .model
        .map(ModelType::from)
        .unwrap_or(app.config.chat.model_type);

    let ws_base = app.config.server.ws_base()?;
    let (stream, mut events) = StreamClient::spawn(&app.config.stream, &ws_base, app.tokens.clone())?;
    wait_connected(&stream).await;

    let mut chat = ChatSession::new(app.api.clone(), Some(stream.clone()), model);
    if let Some(id) = args.session {
        chat.load_history(SessionId(id)).await?;
        for m in chat.conversation().messages() {
            print_message(m);
        }
    }

    let prompt = joined(&args.prompt);
    let result = if prompt.is_empty() {
        interactive(&mut chat, &mut events).await
    } else {
        ask_once(&mut chat, &mut events, &prompt).await
    };
    stream.disconnect();
    result
}

async fn wait_connected(stream: &StreamHandle) {
    let mut status = stream.watch_status();
    let ready = tokio::time::timeout(CONNECT_WAIT, status.wait_for(|s| s.is_connected())).await;
    if !matches!(ready, Ok(Ok(_))) {
        warn!("socket not connected, answers will come over http");
    }
}

async fn ask_once(
    chat: &mut ChatSession,
    events: &mut UnboundedReceiver<StreamEvent>,
    prompt: &str,
) -> anyhow::Result<()> {
    match chat.send(prompt).await? {
        SendOutcome::Streaming => await_answer(chat, events).await,
        SendOutcome::Answered(_) => {
            print_last_answer(chat);
            Ok(())
        }
    }
}

async fn interactive(chat: &mut ChatSession, events: &mut UnboundedReceiver<StreamEvent>) -> anyhow::Result<()> {
    eprintln!("Ask a legal question. Commands: /like /dislike /model normal|cot /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        // once await_answer has listened for Ctrl-C, SIGINT no longer ends
        // the process, so the prompt has to watch for it too
        let Some(line) = read_line(&mut lines, tokio::signal::ctrl_c()).await? else {
            println!();
            break;
        };
        let line = line.trim();

        // connection notices that arrived while idle
        while let Ok(event) = events.try_recv() {
            note_connection(&event);
            chat.handle(&event);
        }

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/like" => rate_last(chat, Feedback::Like).await,
            "/dislike" => rate_last(chat, Feedback::Dislike).await,
            cmd if cmd.starts_with("/model") => match cmd.trim_start_matches("/model").trim().parse() {
                Ok(model) => {
                    chat.set_model_type(model);
                    eprintln!("model: {model}");
                }
                Err(e) => eprintln!("{e}"),
            },
            prompt => match chat.send(prompt).await {
                Ok(SendOutcome::Streaming) => await_answer(chat, events).await?,
                Ok(SendOutcome::Answered(_)) => print_last_answer(chat),
                Err(e) => {
                    eprintln!("{}", describe(&e));
                    if let Some(input) = e.into_input() {
                        eprintln!("not sent: {input}");
                    }
                }
            },
        }
    }
    Ok(())
}

/// Next line from `lines`, or `None` on EOF or once `interrupt` fires.
async fn read_line<R>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        line = lines.next_line() => Ok(line?),
        _ = interrupt => Ok(None),
    }
}

/// Print streamed text until the answer finishes, fails or the socket drops.
async fn await_answer(chat: &mut ChatSession, events: &mut UnboundedReceiver<StreamEvent>) -> anyhow::Result<()> {
    let mut out = std::io::stdout();
    let mut printed = false;

    while chat.is_sending() {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                chat.interrupt();
                println!();
                eprintln!("interrupted");
                return Ok(());
            }
        };
        let Some(event) = event else {
            chat.interrupt();
            anyhow::bail!("stream client stopped");
        };

        let current = chat.conversation().is_current(&event);
        match &event {
            StreamEvent::Chunk { content, .. } if current => {
                print!("{content}");
                out.flush()?;
                printed = true;
            }
            StreamEvent::Status { status, .. } if current => eprintln!("… {status}"),
            StreamEvent::Plan { steps, rationale, .. } if current => {
                eprintln!("plan:");
                for (i, step) in steps.iter().enumerate() {
                    eprintln!("  {}. {step}", i + 1);
                }
                if !rationale.is_empty() {
                    eprintln!("  ({rationale})");
                }
            }
            other => note_connection(other),
        }

        if let Some(info) = chat.handle(&event) {
            if printed {
                println!();
            }
            eprintln!("{info}");
            return Ok(());
        }

        match event {
            StreamEvent::CotStep { .. } if current => {
                if let Some(line) = chat.conversation().progress().step_line() {
                    eprintln!("{line}");
                }
            }
            StreamEvent::Done { .. } if !chat.is_sending() => {
                if printed {
                    println!();
                    if let Some(m) = last_answer(chat) {
                        eprintln!("({})", m.message_id);
                    }
                } else {
                    print_last_answer(chat);
                }
            }
            StreamEvent::Disconnected { .. } if chat.is_sending() => {
                chat.interrupt();
                if printed {
                    println!();
                }
                eprintln!("connection lost before the answer finished");
                return Ok(());
            }
            _ => {}
        }
    }
    Ok(())
}

fn note_connection(event: &StreamEvent) {
    match event {
        StreamEvent::Connected => debug!("socket connected"),
        StreamEvent::Disconnected { code, reason } => debug!(?code, %reason, "socket disconnected"),
        StreamEvent::Reconnecting { attempt, delay } => {
            eprintln!("reconnecting (attempt {attempt}) in {}ms", delay.as_millis());
        }
        _ => {}
    }
}

fn last_answer(chat: &ChatSession) -> Option<&ChatMessage> {
    chat.conversation()
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == Role::Model)
}

fn print_last_answer(chat: &ChatSession) {
    if let Some(m) = last_answer(chat) {
        print_message(m);
    }
}

async fn rate_last(chat: &mut ChatSession, kind: Feedback) {
    let Some(id) = last_answer(chat).map(|m| m.message_id.clone()) else {
        eprintln!("no answer to rate yet");
        return;
    };
    let result = match kind {
        Feedback::Like => chat.like(&id).await,
        Feedback::Dislike => chat.dislike(&id).await,
    };
    match result {
        Ok(Some(Feedback::Like)) => eprintln!("liked"),
        Ok(Some(Feedback::Dislike)) => eprintln!("disliked"),
        Ok(None) => eprintln!("feedback cleared"),
        Err(e) => eprintln!("{}", describe(&e)),
    }
}

fn describe(e: &ChatError) -> String {
    match e.api_error() {
        Some(api) => ErrorInfo::from_error(api).to_string(),
        None => e.to_string(),
    }
}
