//! In-memory transport and timer for deterministic tests.

use crate::client::ClientEvent;
use crate::controller::{Channel, ChannelToken, Timer, TimerHandle, TimerToken, Transport};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Default)]
struct TransportLog {
    opened: Vec<(ChannelToken, String)>,
    sent: Vec<(ChannelToken, String)>,
    closed: Vec<ChannelToken>,
    /// Client events seen so far, and how many entries had been announced
    /// when each message went out.
    watched: Option<tokio::sync::broadcast::Receiver<ClientEvent>>,
    announced: usize,
    announced_at_send: Vec<usize>,
}

/// Records every channel opened, message sent and channel closed.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    log: Rc<RefCell<TransportLog>>,
}

impl FakeTransport {
    pub fn opened(&self) -> Vec<ChannelToken> {
        self.log.borrow().opened.iter().map(|(token, _)| *token).collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.log.borrow().opened.iter().map(|(_, endpoint)| endpoint.clone()).collect()
    }

    pub fn last_opened(&self) -> Option<ChannelToken> {
        self.log.borrow().opened.last().map(|(token, _)| *token)
    }

    pub fn sent(&self) -> Vec<(ChannelToken, String)> {
        self.log.borrow().sent.clone()
    }

    /// Sent messages decoded as JSON.
    pub fn sent_frames(&self) -> Vec<Value> {
        self.log
            .borrow()
            .sent
            .iter()
            .map(|(_, text)| serde_json::from_str(text).expect("sent frame is JSON"))
            .collect()
    }

    pub fn closed(&self) -> Vec<ChannelToken> {
        self.log.borrow().closed.clone()
    }

    /// Count `EntryAppended` events from `events` as messages are sent.
    pub fn watch(&self, events: tokio::sync::broadcast::Receiver<ClientEvent>) {
        self.log.borrow_mut().watched = Some(events);
    }

    /// For each sent message, the number of entries announced before it.
    pub fn announced_at_send(&self) -> Vec<usize> {
        self.log.borrow().announced_at_send.clone()
    }
}

pub(crate) struct FakeChannel {
    token: ChannelToken,
    log: Rc<RefCell<TransportLog>>,
}

impl Channel for FakeChannel {
    fn send(&mut self, text: String) -> bool {
        let mut log = self.log.borrow_mut();
        let log = &mut *log;
        if let Some(events) = log.watched.as_mut() {
            while let Ok(event) = events.try_recv() {
                if matches!(event, ClientEvent::EntryAppended(_)) {
                    log.announced += 1;
                }
            }
        }
        log.announced_at_send.push(log.announced);
        log.sent.push((self.token, text));
        true
    }

    fn close(self) {
        self.log.borrow_mut().closed.push(self.token);
    }
}

impl Transport for FakeTransport {
    type Channel = FakeChannel;

    fn open(&mut self, token: ChannelToken, endpoint: &str) -> FakeChannel {
        self.log.borrow_mut().opened.push((token, endpoint.to_string()));
        FakeChannel {
            token,
            log: self.log.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct TimerLog {
    scheduled: Vec<(TimerToken, Duration)>,
    cancelled: Vec<TimerToken>,
}

/// Records armed and cancelled timers; tests fire them by hand.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTimer {
    log: Rc<RefCell<TimerLog>>,
}

impl FakeTimer {
    pub fn scheduled(&self) -> Vec<(TimerToken, Duration)> {
        self.log.borrow().scheduled.clone()
    }

    pub fn cancelled(&self) -> Vec<TimerToken> {
        self.log.borrow().cancelled.clone()
    }
}

pub(crate) struct FakeTimerHandle {
    token: TimerToken,
    log: Rc<RefCell<TimerLog>>,
}

impl TimerHandle for FakeTimerHandle {
    fn cancel(self) {
        self.log.borrow_mut().cancelled.push(self.token);
    }
}

impl Timer for FakeTimer {
    type Handle = FakeTimerHandle;

    fn schedule(&mut self, token: TimerToken, delay: Duration) -> FakeTimerHandle {
        self.log.borrow_mut().scheduled.push((token, delay));
        FakeTimerHandle {
            token,
            log: self.log.clone(),
        }
    }
}
