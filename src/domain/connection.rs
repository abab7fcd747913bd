//! Live connection handles and their outbound queues.
//!
//! A [`ConnectionHandle`] is the only way other tasks can reach a
//! connection: it pairs a process-unique [`ConnectionId`] with the sender
//! half of the connection's bounded outbound queue. The receiving half is
//! owned by the connection task, which drains it into the socket.

use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::OutboundEvent;

/// Process-unique identifier of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a non-blocking enqueue onto a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The event was queued for the socket writer.
    Enqueued,
    /// The queue was full; the event was dropped.
    QueueFull,
    /// The connection task has already gone away; the event was dropped.
    Closed,
}

/// Cloneable handle to a live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<OutboundEvent>,
}

impl ConnectionHandle {
    /// Creates a handle together with the receiving end of its outbound
    /// queue. A capacity of zero is raised to one.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutboundEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            sender,
        };
        (handle, receiver)
    }

    /// Returns the connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Enqueues an event without waiting.
    ///
    /// When the queue is full the event is dropped: the relay is a
    /// best-effort channel and a slow reader must never stall the sender.
    pub fn deliver(&self, event: OutboundEvent) -> Delivery {
        match self.sender.try_send(event) {
            Ok(()) => Delivery::Enqueued,
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    connection_id = %self.id,
                    event = dropped.event_name(),
                    presence = dropped.is_presence(),
                    "outbound queue full, dropping event"
                );
                Delivery::QueueFull
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Returns `true` once the connection task has dropped its receiver.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
