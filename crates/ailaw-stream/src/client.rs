use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ailaw_core::config::StreamConfig;
use ailaw_core::types::{ModelType, SessionId};
use ailaw_core::TokenStore;
use ailaw_protocol::frames::ClientFrame;
use ailaw_protocol::routes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::backoff::ReconnectPolicy;
use crate::dispatch;
use crate::error::StreamError;
use crate::types::{ConnectionStatus, StreamEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Outbound = Arc<Mutex<Option<mpsc::UnboundedSender<Message>>>>;

const CLIENT_DISCONNECT: &str = "Client disconnect";
const NORMAL_CLOSURE: u16 = 1000;

enum Command {
    Connect,
    Disconnect,
}

/// Supervisor state between sockets.
enum Step {
    Idle,
    Connect,
    Backoff,
    Stop,
}

/// How one socket ended.
enum SocketEnd {
    /// Peer sent a close frame.
    Closed { code: Option<u16>, reason: String },
    /// Transport error or EOF without a close frame.
    Lost(String),
    /// We closed it (disconnect, token cleared).
    ClientClosed,
    /// Every handle was dropped.
    Stopped,
}

/// Cloneable front of the socket supervisor.
///
/// Dropping the last handle closes the socket normally and stops the task.
#[derive(Clone)]
pub struct StreamHandle {
    commands: mpsc::UnboundedSender<Command>,
    outbound: Outbound,
    status: watch::Receiver<ConnectionStatus>,
}

impl StreamHandle {
    /// Open the socket if it is not open or opening. No-op without a token.
    pub fn connect(&self) {
        let _ = self.commands.send(Command::Connect);
    }

    /// Cancel any pending reconnect and close with 1000 "Client disconnect".
    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that fires on every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.outbound).is_some()
    }

    /// Queue a frame on the open socket. `false` means there is no open
    /// socket and the caller should use the HTTP path instead.
    pub fn send(&self, frame: &ClientFrame) -> bool {
        match lock(&self.outbound).as_ref() {
            Some(tx) => tx.send(Message::Text(frame.to_json())).is_ok(),
            None => {
                debug!("send attempted while socket is not open");
                false
            }
        }
    }

    pub fn send_chat(&self, session_id: &SessionId, content: &str, model_type: ModelType) -> bool {
        self.send(&ClientFrame::chat(session_id.as_str(), content, model_type))
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the socket and its reconnect schedule. Lives inside the task
/// started by [`StreamClient::spawn`].
pub struct StreamClient {
    base: Url,
    policy: ReconnectPolicy,
    heartbeat: Duration,
    tokens: TokenStore,
    token_rx: watch::Receiver<Option<String>>,
    commands: mpsc::UnboundedReceiver<Command>,
    outbound: Outbound,
    status: watch::Sender<ConnectionStatus>,
    events: mpsc::UnboundedSender<StreamEvent>,
    attempts: u32,
}

impl StreamClient {
    /// Start the supervisor. `ws_base` is the socket origin (`ws://` or
    /// `wss://`); the socket path and token query are appended per connect.
    ///
    /// Connects right away when `tokens` already holds a token. Must be
    /// called from within a tokio runtime.
    pub fn spawn(
        config: &StreamConfig,
        ws_base: &str,
        tokens: TokenStore,
    ) -> Result<(StreamHandle, mpsc::UnboundedReceiver<StreamEvent>), StreamError> {
        let base = Url::parse(ws_base)
            .map_err(|e| StreamError::ConfigError(format!("invalid socket url {ws_base}: {e}")))?;
        if !matches!(base.scheme(), "ws" | "wss") {
            return Err(StreamError::ConfigError(format!(
                "socket url must be ws:// or wss://, got {}",
                base.scheme()
            )));
        }

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let outbound: Outbound = Arc::new(Mutex::new(None));

        let client = StreamClient {
            base,
            policy: ReconnectPolicy::from_config(config),
            heartbeat: Duration::from_secs(config.heartbeat_secs.max(1)),
            token_rx: tokens.subscribe(),
            tokens,
            commands: cmd_rx,
            outbound: outbound.clone(),
            status: status_tx,
            events: event_tx,
            attempts: 0,
        };
        tokio::spawn(client.run());

        let handle = StreamHandle {
            commands: cmd_tx,
            outbound,
            status: status_rx,
        };
        Ok((handle, event_rx))
    }

    async fn run(mut self) {
        let mut step = if self.tokens.is_present() {
            Step::Connect
        } else {
            Step::Idle
        };
        loop {
            step = match step {
                Step::Idle => self.idle().await,
                Step::Connect => self.connect_once().await,
                Step::Backoff => self.backoff().await,
                Step::Stop => break,
            };
        }
        self.set_outbound(None);
        self.set_status(ConnectionStatus::Disconnected);
        debug!("stream supervisor stopped");
    }

    /// Wait for an explicit connect or a fresh token.
    async fn idle(&mut self) -> Step {
        self.set_status(ConnectionStatus::Disconnected);
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Connect) => {
                        self.attempts = 0;
                        return Step::Connect;
                    }
                    Some(Command::Disconnect) => {
                        self.attempts = self.policy.max_attempts;
                    }
                    None => return Step::Stop,
                },
                changed = self.token_rx.changed() => {
                    if changed.is_err() {
                        return Step::Stop;
                    }
                    if self.token_rx.borrow_and_update().is_some() {
                        debug!("token available, connecting");
                        self.attempts = 0;
                        return Step::Connect;
                    }
                }
            }
        }
    }

    async fn connect_once(&mut self) -> Step {
        let Some(token) = self.tokens.get() else {
            debug!("no access token, not connecting");
            return Step::Idle;
        };
        self.set_status(ConnectionStatus::Connecting);
        debug!(attempts = self.attempts, "opening socket");

        let connect = connect_async(self.socket_url(&token));
        tokio::pin!(connect);
        loop {
            tokio::select! {
                res = &mut connect => {
                    return match res {
                        Ok((ws, _)) => self.on_open(ws).await,
                        Err(e) => {
                            let err = StreamError::ConnectionFailed(e.to_string());
                            warn!(error = %err, attempts = self.attempts, "socket connect failed");
                            self.emit(StreamEvent::Disconnected {
                                code: None,
                                reason: err.to_string(),
                            });
                            self.after_abnormal_close()
                        }
                    };
                }
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Connect) => debug!("already connecting"),
                    Some(Command::Disconnect) => {
                        self.attempts = self.policy.max_attempts;
                        return Step::Idle;
                    }
                    None => return Step::Stop,
                },
                changed = self.token_rx.changed() => {
                    if changed.is_err() {
                        return Step::Stop;
                    }
                    if self.token_rx.borrow_and_update().is_none() {
                        return Step::Idle;
                    }
                }
            }
        }
    }

    async fn on_open(&mut self, ws: Socket) -> Step {
        match self.pump(ws).await {
            SocketEnd::Closed { code, reason } => {
                self.emit(StreamEvent::Disconnected {
                    code,
                    reason: reason.clone(),
                });
                if code == Some(NORMAL_CLOSURE) {
                    info!(%reason, "socket closed normally");
                    Step::Idle
                } else {
                    warn!(?code, %reason, "socket closed abnormally");
                    self.after_abnormal_close()
                }
            }
            SocketEnd::Lost(reason) => {
                warn!(%reason, "socket lost");
                self.emit(StreamEvent::Disconnected { code: None, reason });
                self.after_abnormal_close()
            }
            SocketEnd::ClientClosed => {
                info!("socket closed by client");
                self.emit(StreamEvent::Disconnected {
                    code: Some(NORMAL_CLOSURE),
                    reason: CLIENT_DISCONNECT.to_string(),
                });
                Step::Idle
            }
            SocketEnd::Stopped => Step::Stop,
        }
    }

    /// Publish the socket as open and drive it until it ends.
    async fn pump(&mut self, ws: Socket) -> SocketEnd {
        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.set_outbound(Some(tx));
        self.attempts = 0;
        info!("socket connected");
        self.set_status(ConnectionStatus::Connected);
        self.emit(StreamEvent::Connected);

        // first ping one full interval after open
        let mut heartbeat = interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let end = loop {
            tokio::select! {
                msg = stream.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = dispatch::decode(&text) {
                            self.emit(event);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = match frame {
                            Some(f) => (Some(u16::from(f.code)), f.reason.into_owned()),
                            None => (None, String::new()),
                        };
                        // flush the close reply tungstenite queued
                        let _ = sink.close().await;
                        break SocketEnd::Closed { code, reason };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break SocketEnd::Lost(e.to_string()),
                    None => break SocketEnd::Lost("connection closed without close frame".into()),
                },

                Some(msg) = rx.recv() => {
                    if let Err(e) = sink.send(msg).await {
                        break SocketEnd::Lost(StreamError::SendFailed(e.to_string()).to_string());
                    }
                }

                _ = heartbeat.tick() => {
                    debug!("heartbeat ping");
                    if let Err(e) = sink.send(Message::Text(ClientFrame::Ping.to_json())).await {
                        break SocketEnd::Lost(StreamError::SendFailed(e.to_string()).to_string());
                    }
                }

                cmd = self.commands.recv() => match cmd {
                    Some(Command::Connect) => debug!("already connected"),
                    Some(Command::Disconnect) => {
                        self.attempts = self.policy.max_attempts;
                        close_normally(&mut sink).await;
                        break SocketEnd::ClientClosed;
                    }
                    None => {
                        close_normally(&mut sink).await;
                        break SocketEnd::Stopped;
                    }
                },

                changed = self.token_rx.changed() => {
                    if changed.is_err() {
                        close_normally(&mut sink).await;
                        break SocketEnd::Stopped;
                    }
                    if self.token_rx.borrow_and_update().is_none() {
                        info!("access token cleared, closing socket");
                        close_normally(&mut sink).await;
                        break SocketEnd::ClientClosed;
                    }
                }
            }
        };

        self.set_outbound(None);
        end
    }

    fn after_abnormal_close(&self) -> Step {
        if !self.policy.can_retry(self.attempts) {
            warn!(attempts = self.attempts, "reconnect attempts exhausted");
            return Step::Idle;
        }
        if !self.tokens.is_present() {
            debug!("no access token, not reconnecting");
            return Step::Idle;
        }
        Step::Backoff
    }

    async fn backoff(&mut self) -> Step {
        let delay = self.policy.delay(self.attempts);
        let attempt = self.attempts + 1;
        info!(
            attempt,
            max = self.policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "scheduling reconnect"
        );
        self.set_status(ConnectionStatus::Reconnecting { attempt });
        self.emit(StreamEvent::Reconnecting { attempt, delay });

        let timer = sleep(delay);
        tokio::pin!(timer);
        loop {
            tokio::select! {
                _ = &mut timer => {
                    self.attempts += 1;
                    return Step::Connect;
                }
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Connect) => {
                        self.attempts += 1;
                        return Step::Connect;
                    }
                    Some(Command::Disconnect) => {
                        debug!("pending reconnect cancelled");
                        self.attempts = self.policy.max_attempts;
                        return Step::Idle;
                    }
                    None => return Step::Stop,
                },
                changed = self.token_rx.changed() => {
                    if changed.is_err() {
                        return Step::Stop;
                    }
                    if self.token_rx.borrow_and_update().is_none() {
                        debug!("access token cleared, reconnect cancelled");
                        return Step::Idle;
                    }
                }
            }
        }
    }

    /// `{base}/api/ws?token=<token>`; the token is form-encoded.
    fn socket_url(&self, token: &str) -> String {
        let mut url = self.base.clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), routes::WS);
        url.set_path(&path);
        url.query_pairs_mut().clear().append_pair("token", token);
        url.into()
    }

    fn emit(&self, event: StreamEvent) {
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }

    fn set_outbound(&self, tx: Option<mpsc::UnboundedSender<Message>>) {
        *lock(&self.outbound) = tx;
    }
}

async fn close_normally(sink: &mut SplitSink<Socket, Message>) {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: CLIENT_DISCONNECT.into(),
    };
    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "close frame not delivered");
    }
}
