use crate::telemetry::logging;
use crate::world::actors::ActorId;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

/// Notifications emitted by the movement layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    EntityMoved {
        #[serde(rename = "entityId")]
        actor: ActorId,
        x: i32,
        y: i32,
    },
    /// Sent only to `actor`: its optimistic client-side move was refused.
    StateCorrection {
        #[serde(rename = "entityId")]
        actor: ActorId,
        x: i32,
        y: i32,
    },
    EntityJoined {
        #[serde(rename = "entityId")]
        actor: ActorId,
        x: i32,
        y: i32,
    },
    EntityLeft {
        #[serde(rename = "entityId")]
        actor: ActorId,
    },
}

impl WorldEvent {
    pub fn actor(&self) -> &ActorId {
        match self {
            WorldEvent::EntityMoved { actor, .. }
            | WorldEvent::StateCorrection { actor, .. }
            | WorldEvent::EntityJoined { actor, .. }
            | WorldEvent::EntityLeft { actor } => actor,
        }
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|err| format!("event encode failed: {}", err))
    }
}

/// Fire-and-forget event delivery. Implementations log their own failures.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: WorldEvent);
}

/// Forwards events into an mpsc channel.
pub struct ChannelSink {
    sender: Mutex<Sender<WorldEvent>>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<WorldEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl NotificationSink for ChannelSink {
    fn publish(&self, event: WorldEvent) {
        let Ok(sender) = self.sender.lock() else {
            logging::log_error("event channel lock poisoned");
            return;
        };
        if let Err(err) = sender.send(event) {
            logging::log_error(&format!("event dropped, receiver gone: {:?}", err.0));
        }
    }
}

/// Writes each event as a JSON line to movement.log.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, event: WorldEvent) {
        match event.to_json() {
            Ok(line) => logging::log_movement(&line),
            Err(err) => logging::log_error(&err),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorldEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WorldEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn take(&self) -> Vec<WorldEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, event: WorldEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(_) => logging::log_error("recording sink lock poisoned"),
        }
    }
}
