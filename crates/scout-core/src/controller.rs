//! Connection lifecycle state machine.
//!
//! The controller owns the single live channel and the single pending
//! reconnect timer. It performs no I/O itself: opening channels and arming
//! timers go through the [`Transport`] and [`Timer`] traits, and their
//! completions are fed back in with [`ConnectionController::on_transport`]
//! and [`ConnectionController::on_timer`]. Every call returns immediately;
//! observable changes are queued as [`ControllerEvent`]s.

use scout_types::{ConnectionState, InboundFrame, OutboundFrame};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Delay between a disconnect and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Identifies one channel instance. Events carrying an old token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelToken(pub u64);

/// Identifies one armed reconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Completion reported by a transport for a channel it opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake finished; frames may flow.
    Opened,
    /// One text message arrived.
    Message(String),
    /// The channel failed (including failure to connect at all).
    Error(String),
    /// The peer closed the channel.
    Closed,
}

/// A live duplex text channel.
pub trait Channel {
    /// Queue a text message. Returns false if the channel is already gone.
    fn send(&mut self, text: String) -> bool;
    /// Close the channel. No further events are expected for it.
    fn close(self);
}

/// Opens channels to the backend.
pub trait Transport {
    type Channel: Channel;

    /// Start opening a channel. The outcome is reported later as
    /// [`TransportEvent`]s tagged with `token`.
    fn open(&mut self, token: ChannelToken, endpoint: &str) -> Self::Channel;
}

/// A pending timer that can be cancelled.
pub trait TimerHandle {
    fn cancel(self);
}

/// Arms one-shot timers.
pub trait Timer {
    type Handle: TimerHandle;

    /// Fire `token` once after `delay`, unless the handle is cancelled first.
    fn schedule(&mut self, token: TimerToken, delay: Duration) -> Self::Handle;
}

/// Output of the controller, drained by its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    StateChanged(ConnectionState),
    Frame(InboundFrame),
    /// A message that was not valid JSON or had no recognised `type` shape.
    Malformed { raw: String, reason: String },
}

pub struct ConnectionController<T: Transport, C: Timer> {
    endpoint: String,
    reconnect_delay: Duration,
    transport: T,
    timer: C,
    state: ConnectionState,
    channel: Option<(ChannelToken, T::Channel)>,
    reconnect: Option<(TimerToken, C::Handle)>,
    /// Set by a permanent close; suppresses reconnects until `connect`.
    stopped: bool,
    next_token: u64,
    events: VecDeque<ControllerEvent>,
}

impl<T: Transport, C: Timer> ConnectionController<T, C> {
    pub fn new(endpoint: impl Into<String>, reconnect_delay: Duration, transport: T, timer: C) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect_delay,
            transport,
            timer,
            state: ConnectionState::Idle,
            channel: None,
            reconnect: None,
            stopped: false,
            next_token: 1,
            events: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// True while a reconnect timer is armed.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Open a channel unless one is already connecting or open.
    pub fn connect(&mut self) {
        if self.state.is_active() {
            trace!(target: "scout::ws", "connect() while {}, ignoring", self.state);
            return;
        }

        self.stopped = false;
        self.cancel_reconnect();

        let token = ChannelToken(self.fresh_token());
        info!(target: "scout::ws", "Connecting to {}", self.endpoint);
        let channel = self.transport.open(token, &self.endpoint);
        self.channel = Some((token, channel));
        self.set_state(ConnectionState::Connecting);
    }

    /// Transmit a frame if the channel is open.
    ///
    /// Sending in any other state silently drops the frame; callers gate on
    /// [`ConnectionController::state`]. Returns whether the frame was handed
    /// to the channel.
    pub fn send(&mut self, frame: &OutboundFrame) -> bool {
        if !self.state.is_open() {
            debug!(target: "scout::ws", "Dropping outbound frame while {}", self.state);
            return false;
        }
        let Some((_, channel)) = self.channel.as_mut() else {
            debug!(target: "scout::ws", "Dropping outbound frame: no channel");
            return false;
        };

        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                warn!(target: "scout::ws", "Failed to encode outbound frame: {}", e);
                return false;
            }
        };
        trace!(target: "scout::ws::frame", "-> {}", json);
        channel.send(json)
    }

    /// Close the active channel.
    ///
    /// A permanent close cancels any pending reconnect and returns to `Idle`.
    /// Otherwise this behaves like an unexpected disconnect.
    pub fn close(&mut self, permanent: bool) {
        if permanent {
            info!(target: "scout::ws", "Closing connection permanently");
            self.stopped = true;
            self.cancel_reconnect();
            if let Some((_, channel)) = self.channel.take() {
                channel.close();
            }
            self.set_state(ConnectionState::Idle);
            return;
        }

        if self.channel.is_none() && self.state == ConnectionState::Idle {
            trace!(target: "scout::ws", "close() with nothing to close");
            return;
        }
        self.disconnected("closed by client");
    }

    /// Feed a transport completion for the channel identified by `token`.
    pub fn on_transport(&mut self, token: ChannelToken, event: TransportEvent) {
        if self.channel.as_ref().map(|(current, _)| *current) != Some(token) {
            trace!(target: "scout::ws", "Ignoring {:?} from stale channel {:?}", event, token);
            return;
        }

        match event {
            TransportEvent::Opened => {
                if self.state == ConnectionState::Connecting {
                    info!(target: "scout::ws", "Connected to {}", self.endpoint);
                    self.set_state(ConnectionState::Open);
                }
            }
            TransportEvent::Message(text) => self.on_message(text),
            TransportEvent::Error(reason) => {
                warn!(target: "scout::ws", "Connection error: {}", reason);
                self.disconnected(&reason);
            }
            TransportEvent::Closed => {
                info!(target: "scout::ws", "Connection closed by backend");
                self.disconnected("closed by backend");
            }
        }
    }

    /// Feed a timer firing.
    pub fn on_timer(&mut self, token: TimerToken) {
        let current = matches!(&self.reconnect, Some((pending, _)) if *pending == token);
        if !current {
            trace!(target: "scout::reconnect", "Ignoring stale timer {:?}", token);
            return;
        }
        self.reconnect = None;

        if self.stopped {
            return;
        }
        info!(target: "scout::reconnect", "Reconnecting to {}", self.endpoint);
        self.connect();
    }

    /// Next queued event, oldest first.
    pub fn poll_event(&mut self) -> Option<ControllerEvent> {
        self.events.pop_front()
    }

    fn on_message(&mut self, text: String) {
        trace!(target: "scout::ws::frame", "<- {}", text);
        match serde_json::from_str::<InboundFrame>(&text) {
            Ok(frame) => self.events.push_back(ControllerEvent::Frame(frame)),
            Err(e) => {
                warn!(target: "scout::ws::frame", "Dropping malformed frame: {}", e);
                self.events.push_back(ControllerEvent::Malformed {
                    raw: text,
                    reason: e.to_string(),
                });
            }
        }
    }

    fn disconnected(&mut self, reason: &str) {
        if let Some((_, channel)) = self.channel.take() {
            channel.close();
        }
        debug!(target: "scout::ws", "Disconnected: {}", reason);
        self.set_state(ConnectionState::Closed);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if self.stopped || self.reconnect.is_some() {
            return;
        }
        let token = TimerToken(self.fresh_token());
        info!(
            target: "scout::reconnect",
            "Reconnecting in {} ms",
            self.reconnect_delay.as_millis()
        );
        let handle = self.timer.schedule(token, self.reconnect_delay);
        self.reconnect = Some((token, handle));
    }

    fn cancel_reconnect(&mut self) {
        if let Some((token, handle)) = self.reconnect.take() {
            debug!(target: "scout::reconnect", "Cancelling reconnect timer {:?}", token);
            handle.cancel();
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        debug!(target: "scout::ws", "State {} -> {}", self.state, state);
        self.state = state;
        self.events.push_back(ControllerEvent::StateChanged(state));
    }

    fn fresh_token(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }
}

impl<T: Transport, C: Timer> Drop for ConnectionController<T, C> {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.reconnect.take() {
            handle.cancel();
        }
        if let Some((_, channel)) = self.channel.take() {
            channel.close();
        }
    }
}
