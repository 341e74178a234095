use dashmap::DashMap;
use hangman_core::{IdlePolicy, Outbox, Recipient, Room, RoomEffect, WordSource};
use hangman_persistence::SnapshotStore;
use hangman_types::{ClientMessage, GameState, RoomCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::websocket::connection::{ConnectionId, ConnectionSender};

const MAX_ROOM_CODE_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),
}

/// Upper-cases and validates a room code taken from a URL.
pub fn normalize_room_code(raw: &str) -> Result<RoomCode, RoomError> {
    let code = raw.trim();
    let valid = !code.is_empty()
        && code.len() <= MAX_ROOM_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(RoomError::InvalidRoomCode(raw.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

enum RoomCommand {
    Connect {
        connection: ConnectionId,
        sender: ConnectionSender,
        ready: oneshot::Sender<()>,
    },
    Message {
        connection: ConnectionId,
        message: ClientMessage,
    },
    Disconnect {
        connection: ConnectionId,
    },
    Snapshot {
        reply: oneshot::Sender<GameState>,
    },
    TurnTimerFired {
        generation: u64,
    },
    IdleTimerFired {
        generation: u64,
    },
}

/// Cheap, cloneable address of a running room actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_code: RoomCode,
    actor_id: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoomCommand::Connect { .. } => "Connect",
            RoomCommand::Message { .. } => "Message",
            RoomCommand::Disconnect { .. } => "Disconnect",
            RoomCommand::Snapshot { .. } => "Snapshot",
            RoomCommand::TurnTimerFired { .. } => "TurnTimerFired",
            RoomCommand::IdleTimerFired { .. } => "IdleTimerFired",
        };
        f.write_str(name)
    }
}

impl RoomHandle {
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_code.clone())
    }

    /// Registers a socket and waits until the room has sent it the state.
    pub async fn connect(
        &self,
        connection: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<(), RoomError> {
        let (ready, ready_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Connect {
                connection,
                sender,
                ready,
            })
            .await
            .map_err(|_| self.unavailable())?;
        ready_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn send_message(
        &self,
        connection: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message {
                connection,
                message,
            })
            .await
            .map_err(|_| self.unavailable())
    }

    pub async fn disconnect(&self, connection: ConnectionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Disconnect { connection })
            .await
            .map_err(|_| self.unavailable())
    }

    pub async fn snapshot(&self) -> Result<GameState, RoomError> {
        let (reply, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }
}

struct ArmedTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl ArmedTimer {
    fn cancel(self) {
        self.task.abort();
    }
}

/// Owns one room. All mutations of that room happen on this task, one
/// command at a time.
struct RoomActor {
    room: Room<ConnectionId>,
    connections: HashMap<ConnectionId, ConnectionSender>,
    receiver: mpsc::Receiver<RoomCommand>,
    commands: mpsc::WeakSender<RoomCommand>,
    turn_timer: Option<ArmedTimer>,
    idle_timer: Option<ArmedTimer>,
    persist: mpsc::UnboundedSender<GameState>,
}

impl RoomActor {
    /// Serves commands until nobody is connected and no idle reset is
    /// pending. Pending snapshots are flushed before the mailbox is dropped,
    /// so an actor respawned for the same code always loads the latest state.
    async fn run(mut self, persister: JoinHandle<()>) {
        while let Some(command) = self.receiver.recv().await {
            self.handle_command(command);

            if self.connections.is_empty() && self.idle_timer.is_none() {
                break;
            }
        }

        if let Some(timer) = self.turn_timer.take() {
            timer.cancel();
        }
        let room_code = self.room.room_code().to_string();
        info!(room = %room_code, "Room actor stopping");

        let RoomActor {
            receiver, persist, ..
        } = self;
        drop(persist);
        if let Err(e) = persister.await {
            error!(room = %room_code, "Snapshot writer failed: {}", e);
        }
        drop(receiver);
    }

    fn handle_command(&mut self, command: RoomCommand) {
        debug!(room = %self.room.room_code(), ?command, "Room command");
        match command {
            RoomCommand::Connect {
                connection,
                sender,
                ready,
            } => {
                self.connections.insert(connection, sender);
                let outbox = self.room.connect(connection);
                self.apply(outbox);
                let _ = ready.send(());
            }
            RoomCommand::Message {
                connection,
                message,
            } => {
                if !self.connections.contains_key(&connection) {
                    warn!(room = %self.room.room_code(), connection = %connection, "Message from unknown connection");
                    return;
                }
                let outbox = self.room.handle_message(connection, message, now_ms());
                self.apply(outbox);
            }
            RoomCommand::Disconnect { connection } => {
                if self.connections.remove(&connection).is_some() {
                    let outbox = self.room.disconnect(&connection);
                    self.apply(outbox);
                }
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.room.state().clone());
            }
            RoomCommand::TurnTimerFired { generation } => {
                if self
                    .turn_timer
                    .as_ref()
                    .is_some_and(|t| t.generation == generation)
                {
                    self.turn_timer = None;
                }
                let outbox = self.room.turn_timeout(generation, now_ms());
                self.apply(outbox);
            }
            RoomCommand::IdleTimerFired { generation } => {
                if self
                    .idle_timer
                    .as_ref()
                    .is_some_and(|t| t.generation == generation)
                {
                    self.idle_timer = None;
                }
                let outbox = self.room.idle_reset(generation);
                self.apply(outbox);
            }
        }
    }

    fn apply(&mut self, outbox: Outbox<ConnectionId>) {
        for effect in outbox.into_effects() {
            match effect {
                RoomEffect::Send {
                    to: Recipient::All,
                    message,
                } => {
                    for sender in self.connections.values() {
                        let _ = sender.send(message.clone());
                    }
                }
                RoomEffect::Send {
                    to: Recipient::Transport(connection),
                    message,
                } => {
                    if let Some(sender) = self.connections.get(&connection) {
                        let _ = sender.send(message);
                    }
                }
                RoomEffect::ArmTurnTimer { after, generation } => {
                    if let Some(timer) = self.turn_timer.take() {
                        timer.cancel();
                    }
                    let task = self.spawn_timer(after, RoomCommand::TurnTimerFired { generation });
                    self.turn_timer = Some(ArmedTimer { generation, task });
                }
                RoomEffect::CancelTurnTimer => {
                    if let Some(timer) = self.turn_timer.take() {
                        timer.cancel();
                    }
                }
                RoomEffect::ArmIdleReset { after, generation } => {
                    if let Some(timer) = self.idle_timer.take() {
                        timer.cancel();
                    }
                    let task = self.spawn_timer(after, RoomCommand::IdleTimerFired { generation });
                    self.idle_timer = Some(ArmedTimer { generation, task });
                }
                RoomEffect::CancelIdleReset => {
                    if let Some(timer) = self.idle_timer.take() {
                        timer.cancel();
                    }
                }
                RoomEffect::Persist => {
                    if self.persist.send(self.room.state().clone()).is_err() {
                        error!(room = %self.room.room_code(), "Snapshot writer is gone");
                    }
                }
            }
        }
    }

    /// Timers only hold a weak sender to the mailbox.
    fn spawn_timer(&self, after: Duration, command: RoomCommand) -> JoinHandle<()> {
        let commands = self.commands.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(sender) = commands.upgrade() {
                let _ = sender.send(command).await;
            }
        })
    }
}

/// Writes snapshots in the order the room produced them.
fn spawn_persister(
    room_code: RoomCode,
    store: Arc<dyn SnapshotStore>,
) -> (mpsc::UnboundedSender<GameState>, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::unbounded_channel::<GameState>();
    let task = tokio::spawn(async move {
        while let Some(state) = receiver.recv().await {
            if let Err(e) = store.save(&state).await {
                error!(room = %room_code, "Failed to persist snapshot: {:#}", e);
            }
        }
    });
    (sender, task)
}

async fn load_room(
    room_code: &str,
    store: &dyn SnapshotStore,
    words: Arc<dyn WordSource>,
    idle_policy: IdlePolicy,
) -> (Room<ConnectionId>, bool) {
    let restored = match store.load(room_code).await {
        Ok(state) => state,
        Err(e) => {
            error!(room = %room_code, "Failed to load snapshot, starting fresh: {:#}", e);
            None
        }
    };

    match restored {
        Some(state) => {
            info!(room = %room_code, status = ?state.status, "Restored room from snapshot");
            (
                Room::with_state(state, words).with_idle_policy(idle_policy),
                true,
            )
        }
        None => (
            Room::new(room_code.to_string(), words).with_idle_policy(idle_policy),
            false,
        ),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoomSettings {
    pub idle_policy: IdlePolicy,
    pub channel_size: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            idle_policy: IdlePolicy::default(),
            channel_size: 64,
        }
    }
}

/// Table of live room actors, keyed by upper-cased room code. Rooms are
/// spawned on first use and drop out of the table when their actor stops.
pub struct RoomManager {
    rooms: Arc<DashMap<RoomCode, RoomHandle>>,
    store: Arc<dyn SnapshotStore>,
    words: Arc<dyn WordSource>,
    settings: RoomSettings,
    next_actor_id: AtomicU64,
}

impl RoomManager {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        words: Arc<dyn WordSource>,
        settings: RoomSettings,
    ) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            store,
            words,
            settings,
            next_actor_id: AtomicU64::new(1),
        }
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_active(&self, room_code: &str) -> bool {
        self.rooms.contains_key(room_code)
    }

    /// Attaches a socket to a room, spawning the room if needed. A handle
    /// that turns out to belong to a stopped actor is forgotten and the room
    /// is respawned once.
    pub async fn connect(
        &self,
        room_code: &str,
        connection: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<RoomHandle, RoomError> {
        let room_code = normalize_room_code(room_code)?;
        for _ in 0..2 {
            let handle = self.get_or_spawn(&room_code);
            match handle.connect(connection, sender.clone()).await {
                Ok(()) => return Ok(handle),
                Err(_) => self.forget(&handle),
            }
        }
        Err(RoomError::Unavailable(room_code))
    }

    pub async fn snapshot(&self, room_code: &str) -> Result<GameState, RoomError> {
        let room_code = normalize_room_code(room_code)?;
        for _ in 0..2 {
            let handle = self.get_or_spawn(&room_code);
            match handle.snapshot().await {
                Ok(state) => return Ok(state),
                Err(_) => self.forget(&handle),
            }
        }
        Err(RoomError::Unavailable(room_code))
    }

    fn get_or_spawn(&self, room_code: &str) -> RoomHandle {
        self.rooms
            .entry(room_code.to_string())
            .or_insert_with(|| self.spawn_room(room_code))
            .clone()
    }

    fn forget(&self, handle: &RoomHandle) {
        self.rooms
            .remove_if(handle.room_code(), |_, h| h.actor_id == handle.actor_id);
    }

    fn spawn_room(&self, room_code: &str) -> RoomHandle {
        let actor_id = self.next_actor_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.settings.channel_size.max(1));
        let handle = RoomHandle {
            room_code: room_code.to_string(),
            actor_id,
            sender: sender.clone(),
        };

        let commands = sender.downgrade();
        let rooms = self.rooms.clone();
        let store = self.store.clone();
        let words = self.words.clone();
        let idle_policy = self.settings.idle_policy;
        let room_code = room_code.to_string();
        drop(sender);

        info!(room = %room_code, actor_id, "Spawning room actor");
        tokio::spawn(async move {
            let (mut room, restored) = load_room(&room_code, store.as_ref(), words, idle_policy).await;
            let (persist, persister) = spawn_persister(room_code.clone(), store);

            let resumed = if restored {
                room.resume(now_ms())
            } else {
                Outbox::new()
            };

            let mut actor = RoomActor {
                room,
                connections: HashMap::new(),
                receiver,
                commands,
                turn_timer: None,
                idle_timer: None,
                persist,
            };
            actor.apply(resumed);
            actor.run(persister).await;

            rooms.remove_if(&room_code, |_, h| h.actor_id == actor_id);
        });

        handle
    }
}
