use hangman_types::ServerMessage;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One live socket. Distinct from the player id, which survives reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
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

/// Outgoing queue of a socket; the room actor pushes, the socket task drains.
pub type ConnectionSender = mpsc::UnboundedSender<ServerMessage>;
pub type ConnectionReceiver = mpsc::UnboundedReceiver<ServerMessage>;

pub fn outbound_channel() -> (ConnectionSender, ConnectionReceiver) {
    mpsc::unbounded_channel()
}
