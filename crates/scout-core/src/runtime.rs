//! Tokio adapters: WebSocket transport, abortable timers, and the session
//! task that serialises every command and callback onto one loop.

use crate::client::{ClientEvent, SessionClient, SessionConfig, SessionSnapshot};
use crate::controller::{Channel, ChannelToken, Timer, TimerHandle, TimerToken, Transport, TransportEvent};
use crate::{Result, ScoutError};
use futures::{SinkExt, StreamExt};
use scout_types::EntryId;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Callback delivered to the session loop.
#[derive(Debug)]
pub(crate) enum RuntimeEvent {
    Transport(ChannelToken, TransportEvent),
    Timer(TimerToken),
}

/// Arms timers as sleeping tasks; cancelling aborts the task.
pub(crate) struct TokioTimer {
    events: mpsc::UnboundedSender<RuntimeEvent>,
}

impl TokioTimer {
    pub(crate) fn new(events: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self { events }
    }
}

pub(crate) struct TokioTimerHandle(JoinHandle<()>);

impl TimerHandle for TokioTimerHandle {
    fn cancel(self) {
        self.0.abort();
    }
}

impl Timer for TokioTimer {
    type Handle = TokioTimerHandle;

    fn schedule(&mut self, token: TimerToken, delay: Duration) -> TokioTimerHandle {
        let events = self.events.clone();
        TokioTimerHandle(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(RuntimeEvent::Timer(token));
        }))
    }
}

enum Outgoing {
    Text(String),
    Close,
}

/// Opens WebSocket channels with `tokio-tungstenite`, one task per channel.
pub(crate) struct WsTransport {
    events: mpsc::UnboundedSender<RuntimeEvent>,
}

impl WsTransport {
    pub(crate) fn new(events: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self { events }
    }
}

pub(crate) struct WsChannel {
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl Channel for WsChannel {
    fn send(&mut self, text: String) -> bool {
        self.outgoing.send(Outgoing::Text(text)).is_ok()
    }

    fn close(self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

impl Transport for WsTransport {
    type Channel = WsChannel;

    fn open(&mut self, token: ChannelToken, endpoint: &str) -> WsChannel {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_channel(
            token,
            endpoint.to_string(),
            outgoing_rx,
            self.events.clone(),
        ));
        WsChannel {
            outgoing: outgoing_tx,
        }
    }
}

/// Drive one WebSocket connection until it fails, the peer closes it, or the
/// controller closes it. Reports exactly one terminal event on failure.
async fn run_channel(
    token: ChannelToken,
    endpoint: String,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: mpsc::UnboundedSender<RuntimeEvent>,
) {
    let emit = |event: TransportEvent| {
        let _ = events.send(RuntimeEvent::Transport(token, event));
    };

    let ws_stream = tokio::select! {
        result = tokio_tungstenite::connect_async(endpoint.as_str()) => match result {
            Ok((stream, _)) => stream,
            Err(e) => {
                let err = ScoutError::from_tungstenite(e);
                match &err {
                    ScoutError::Unavailable => debug!(target: "scout::ws", "Backend unavailable at {}", endpoint),
                    _ => warn!(target: "scout::ws", "Failed to connect to {}: {}", endpoint, err),
                }
                emit(TransportEvent::Error(err.to_string()));
                return;
            }
        },
        // Closed (or dropped) before the handshake finished.
        _ = outgoing.recv() => {
            debug!(target: "scout::ws", "Connection attempt {:?} abandoned", token);
            return;
        }
    };

    emit(TransportEvent::Opened);
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            msg = outgoing.recv() => match msg {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                        emit(TransportEvent::Error(e.to_string()));
                        return;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return;
                }
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(text))) => emit(TransportEvent::Message(text.as_str().to_owned())),
                Some(Ok(Message::Close(frame))) => {
                    debug!(target: "scout::ws", "Backend sent close: {:?}", frame);
                    emit(TransportEvent::Closed);
                    return;
                }
                // Pings are answered by tungstenite; binary frames are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(TransportEvent::Error(e.to_string()));
                    return;
                }
                None => {
                    emit(TransportEvent::Closed);
                    return;
                }
            }
        }
    }
}

enum Command {
    Connect,
    SendQuery {
        text: String,
        reply: oneshot::Sender<Option<EntryId>>,
    },
    Clear,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Handle to a session running on its own tokio task.
///
/// The task owns the [`SessionClient`]; commands, socket callbacks and timer
/// firings are all processed one at a time on that task.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<ClientEvent>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Spawn the session task. It stays `Idle` until [`SessionHandle::connect`],
    /// so subscribers can attach first.
    pub fn spawn(config: SessionConfig) -> Self {
        let (runtime_tx, runtime_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let client = SessionClient::new(
            &config,
            WsTransport::new(runtime_tx.clone()),
            TokioTimer::new(runtime_tx),
        );
        let events = client.event_sender();
        let task = tokio::spawn(run_session(client, command_rx, runtime_rx));

        Self {
            commands: command_tx,
            events,
            task,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn connect(&self) -> Result<()> {
        self.command(Command::Connect)
    }

    /// Send a query. Returns the user entry id, or `None` if the query was
    /// blank or the connection was not open.
    pub async fn send_query(&self, text: impl Into<String>) -> Result<Option<EntryId>> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::SendQuery {
            text: text.into(),
            reply,
        })?;
        rx.await.map_err(|_| ScoutError::SessionClosed)
    }

    pub fn clear_chat(&self) -> Result<()> {
        self.command(Command::Clear)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::Snapshot(reply))?;
        rx.await.map_err(|_| ScoutError::SessionClosed)
    }

    /// Close permanently and wait for the session task to finish.
    pub async fn shutdown(self) -> Result<()> {
        // The task may already be gone; joining below still succeeds.
        let _ = self.commands.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            warn!(target: "scout::session", "Session task ended abnormally: {}", e);
        }
        Ok(())
    }

    fn command(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| ScoutError::SessionClosed)
    }
}

async fn run_session(
    mut client: SessionClient<WsTransport, TokioTimer>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut runtime: mpsc::UnboundedReceiver<RuntimeEvent>,
) {
    info!(target: "scout::session", "Session task started");
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Connect) => client.connect(),
                Some(Command::SendQuery { text, reply }) => {
                    let _ = reply.send(client.send_query(&text));
                }
                Some(Command::Clear) => client.clear_chat(),
                Some(Command::Snapshot(reply)) => {
                    let _ = reply.send(client.snapshot());
                }
                Some(Command::Shutdown) | None => {
                    client.shutdown();
                    break;
                }
            },
            Some(event) = runtime.recv() => match event {
                RuntimeEvent::Transport(token, event) => client.handle_transport(token, event),
                RuntimeEvent::Timer(token) => client.handle_timer(token),
            },
        }
    }
    info!(target: "scout::session", "Session task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioTimer::new(tx);
        let start = Instant::now();

        let _handle = timer.schedule(TimerToken(7), Duration::from_millis(3000));
        match rx.recv().await {
            Some(RuntimeEvent::Timer(token)) => assert_eq!(token, TimerToken(7)),
            other => panic!("Expected timer event, got {:?}", other),
        }
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioTimer::new(tx);

        let handle = timer.schedule(TimerToken(1), Duration::from_millis(3000));
        handle.cancel();

        let result = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(result.is_err(), "cancelled timer fired: {:?}", result);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = WsTransport::new(tx);
        let _channel = transport.open(ChannelToken(1), &format!("ws://{}/ws", addr));

        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(RuntimeEvent::Transport(token, TransportEvent::Error(_)))) => {
                assert_eq!(token, ChannelToken(1));
            }
            other => panic!("Expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_snapshot_before_connect() {
        let handle = SessionHandle::spawn(SessionConfig::default());
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, scout_types::ConnectionState::Idle);
        assert!(snapshot.entries.is_empty());
        handle.shutdown().await.unwrap();
    }
}
