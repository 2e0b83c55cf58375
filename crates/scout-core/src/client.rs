//! Session client: wires connection events into the timeline.
//!
//! The client is the composition root. It owns the controller, the
//! timeline and the session identifier, dispatches inbound frames by type,
//! and exposes the outbound commands. Consumers observe changes through
//! [`SessionClient::subscribe`] and read state through snapshots; they never
//! mutate the timeline directly.

use crate::controller::{
    ChannelToken, ConnectionController, ControllerEvent, DEFAULT_RECONNECT_DELAY, Timer,
    TimerToken, Transport, TransportEvent,
};
use crate::timeline::{GENERIC_ERROR_MESSAGE, Timeline};
use scout_types::{ConnectionState, Entry, EntryId, InboundFrame, OutboundFrame};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Runtime settings for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend WebSocket endpoint.
    pub endpoint: String,
    pub reconnect_delay: Duration,
    /// Show malformed inbound frames as an error entry instead of dropping them.
    pub surface_malformed_frames: bool,
    /// Capacity of the change-notification channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8000/ws".to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            surface_malformed_frames: false,
            event_capacity: 256,
        }
    }
}

/// Change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    StateChanged(ConnectionState),
    SessionAssigned(String),
    EntryAppended(Entry),
    TimelineCleared,
    /// The backend is working on a query. Advisory only.
    Thinking,
}

/// Read-only view of the whole client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    pub session_id: Option<String>,
    pub entries: Vec<Entry>,
    pub awaiting_response: bool,
}

pub struct SessionClient<T: Transport, C: Timer> {
    controller: ConnectionController<T, C>,
    timeline: Timeline,
    session_id: Option<String>,
    surface_malformed_frames: bool,
    event_tx: broadcast::Sender<ClientEvent>,
}

impl<T: Transport, C: Timer> SessionClient<T, C> {
    pub fn new(config: &SessionConfig, transport: T, timer: C) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            controller: ConnectionController::new(
                config.endpoint.clone(),
                config.reconnect_delay,
                transport,
                timer,
            ),
            timeline: Timeline::new(),
            session_id: None,
            surface_malformed_frames: config.surface_malformed_frames,
            event_tx,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<ClientEvent> {
        self.event_tx.clone()
    }

    /// Start connecting. No-op while already connecting or open.
    pub fn connect(&mut self) {
        self.controller.connect();
        self.pump();
    }

    /// Send a query to the backend.
    ///
    /// Blank text, or any state other than `Open`, is a no-op. Otherwise the
    /// user entry is appended (and announced) before the frame goes out.
    pub fn send_query(&mut self, text: &str) -> Option<EntryId> {
        if text.trim().is_empty() {
            return None;
        }
        if !self.controller.state().is_open() {
            debug!(target: "scout::session", "Not sending query while {}", self.controller.state());
            return None;
        }

        let id = self.timeline.append_user(text);
        self.publish_entry(id);

        let frame = OutboundFrame::Query {
            query: text.to_string(),
            session_id: self.session_id.clone(),
        };
        if !self.controller.send(&frame) {
            warn!(target: "scout::session", "Query {} was not transmitted", id);
        }
        Some(id)
    }

    /// Empty the timeline and ask the backend to forget the conversation.
    ///
    /// The timeline is always cleared; the clear frame only goes out while
    /// the connection is open.
    pub fn clear_chat(&mut self) {
        self.timeline.clear();
        self.publish(ClientEvent::TimelineCleared);

        let frame = OutboundFrame::Clear {
            session_id: self.session_id.clone(),
        };
        self.controller.send(&frame);
    }

    /// Permanent teardown. No reconnect will happen afterwards.
    pub fn shutdown(&mut self) {
        self.controller.close(true);
        self.pump();
    }

    /// Feed a transport completion.
    pub fn handle_transport(&mut self, token: ChannelToken, event: TransportEvent) {
        self.controller.on_transport(token, event);
        self.pump();
    }

    /// Feed a timer firing.
    pub fn handle_timer(&mut self, token: TimerToken) {
        self.controller.on_timer(token);
        self.pump();
    }

    pub fn state(&self) -> ConnectionState {
        self.controller.state()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn entries(&self) -> &[Entry] {
        self.timeline.entries()
    }

    pub fn is_awaiting(&self) -> bool {
        self.timeline.is_awaiting()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.controller.state(),
            session_id: self.session_id.clone(),
            entries: self.timeline.snapshot(),
            awaiting_response: self.timeline.is_awaiting(),
        }
    }

    fn pump(&mut self) {
        while let Some(event) = self.controller.poll_event() {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::StateChanged(state) => self.publish(ClientEvent::StateChanged(state)),
            ControllerEvent::Frame(frame) => self.dispatch_frame(frame),
            ControllerEvent::Malformed { reason, .. } => {
                if self.surface_malformed_frames {
                    debug!(target: "scout::session", "Surfacing malformed frame: {}", reason);
                    let id = self.timeline.append_error(GENERIC_ERROR_MESSAGE).id;
                    self.publish_entry(id);
                }
            }
        }
    }

    fn dispatch_frame(&mut self, frame: InboundFrame) {
        match frame {
            InboundFrame::SessionId {
                session_id: Some(session_id),
            } => {
                if self.session_id.as_deref() != Some(session_id.as_str()) {
                    info!(target: "scout::session", "Session assigned: {}", session_id);
                }
                self.session_id = Some(session_id.clone());
                self.publish(ClientEvent::SessionAssigned(session_id));
            }
            InboundFrame::SessionId { session_id: None } => {
                if let Some(previous) = self.session_id.take() {
                    info!(target: "scout::session", "Backend dropped session {}", previous);
                }
            }
            InboundFrame::Response { content } => {
                let id = self.timeline.append_assistant(content).id;
                self.publish_entry(id);
            }
            InboundFrame::Error { message } => {
                let message = message.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
                let id = self.timeline.append_error(message).id;
                self.publish_entry(id);
            }
            InboundFrame::Thinking => {
                debug!(target: "scout::session", "Backend is thinking");
                self.publish(ClientEvent::Thinking);
            }
            InboundFrame::Unknown => {
                debug!(target: "scout::session", "Ignoring frame with unrecognised type");
            }
        }
    }

    fn publish_entry(&self, id: EntryId) {
        if let Some(entry) = self.timeline.get(id) {
            self.publish(ClientEvent::EntryAppended(entry.clone()));
        }
    }

    fn publish(&self, event: ClientEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}
