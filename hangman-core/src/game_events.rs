use hangman_types::{PlayerId, ServerMessage};
use std::time::Duration;

/// Who a message goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient<T> {
    /// Every connection open on the room, joined or not.
    All,
    Transport(T),
}

/// Something the room wants done after a mutation. The room itself never
/// touches sockets, clocks or storage; whoever hosts it carries these out in
/// order.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEffect<T> {
    Send {
        to: Recipient<T>,
        message: ServerMessage,
    },
    /// Replaces any armed turn timer. When it fires, hand `generation` back
    /// to `Room::turn_timeout`.
    ArmTurnTimer {
        after: Duration,
        generation: u64,
    },
    CancelTurnTimer,
    ArmIdleReset {
        after: Duration,
        generation: u64,
    },
    CancelIdleReset,
    /// Save a snapshot of the current state.
    Persist,
}

/// Ordered effects produced by one room operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbox<T> {
    effects: Vec<RoomEffect<T>>,
}

impl<T> Default for Outbox<T> {
    fn default() -> Self {
        Self {
            effects: Vec::new(),
        }
    }
}

impl<T: Clone> Outbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: RoomEffect<T>) {
        self.effects.push(effect);
    }

    pub fn broadcast(&mut self, message: ServerMessage) {
        self.push(RoomEffect::Send {
            to: Recipient::All,
            message,
        });
    }

    pub fn unicast(&mut self, transport: T, message: ServerMessage) {
        self.push(RoomEffect::Send {
            to: Recipient::Transport(transport),
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn effects(&self) -> &[RoomEffect<T>] {
        &self.effects
    }

    pub fn into_effects(self) -> Vec<RoomEffect<T>> {
        self.effects
    }

    /// Messages in emission order, regardless of recipient.
    pub fn messages(&self) -> impl Iterator<Item = &ServerMessage> {
        self.effects.iter().filter_map(|effect| match effect {
            RoomEffect::Send { message, .. } => Some(message),
            _ => None,
        })
    }

    pub fn broadcasts(&self) -> impl Iterator<Item = &ServerMessage> {
        self.effects.iter().filter_map(|effect| match effect {
            RoomEffect::Send {
                to: Recipient::All,
                message,
            } => Some(message),
            _ => None,
        })
    }

    pub fn persists(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, RoomEffect::Persist))
    }

    /// The error text sent back to the requester, if the operation was refused.
    pub fn error_message(&self) -> Option<&str> {
        self.messages().find_map(|message| match message {
            ServerMessage::Error { message } => Some(message.as_str()),
            _ => None,
        })
    }

    pub fn turn_timer(&self) -> Option<(Duration, u64)> {
        self.effects.iter().rev().find_map(|effect| match effect {
            RoomEffect::ArmTurnTimer { after, generation } => Some((*after, *generation)),
            _ => None,
        })
    }

    pub fn idle_reset(&self) -> Option<(Duration, u64)> {
        self.effects.iter().rev().find_map(|effect| match effect {
            RoomEffect::ArmIdleReset { after, generation } => Some((*after, *generation)),
            _ => None,
        })
    }

    pub fn timed_out_player(&self) -> Option<&PlayerId> {
        self.messages().find_map(|message| match message {
            ServerMessage::TurnTimeout { player_id } => Some(player_id),
            _ => None,
        })
    }
}
