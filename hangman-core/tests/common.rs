#![allow(dead_code)]

use hangman_core::{DrawnWord, Outbox, Room, WordSource};
use hangman_types::{
    Category, ClientMessage, Difficulty, GameConfigPatch, GameMode, GameState, RoundState,
    RoundPlay, ServerMessage,
};
use std::sync::{Arc, Mutex};

/// Fixed clock origin for tests, in ms.
pub const T0: i64 = 1_700_000_000_000;

pub type TestRoom = Room<u32>;

/// Hands out words in the given order, cycling when it runs out.
pub struct FixedWords {
    words: Vec<String>,
    next: Mutex<usize>,
}

impl FixedWords {
    pub fn new(words: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            words: words.iter().map(|w| w.to_string()).collect(),
            next: Mutex::new(0),
        })
    }

    fn take(&self) -> String {
        let mut next = self.next.lock().unwrap();
        let word = self.words[*next % self.words.len()].clone();
        *next += 1;
        word
    }
}

impl WordSource for FixedWords {
    fn draw_one(&self, category: Category, _difficulty: Difficulty) -> DrawnWord {
        let category = match category {
            Category::Mix => Category::Animales,
            other => other,
        };
        DrawnWord {
            word: self.take(),
            category,
        }
    }

    fn draw_many(
        &self,
        category: Category,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<DrawnWord> {
        (0..count)
            .map(|_| self.draw_one(category, difficulty))
            .collect()
    }
}

pub fn create_test_room(words: &[&str]) -> TestRoom {
    Room::new("ABCD".to_string(), FixedWords::new(words))
}

/// Joins `session` over `transport`. Transports are plain numbers in tests.
pub fn join(room: &mut TestRoom, transport: u32, session: &str) -> Outbox<u32> {
    room.handle_message(
        transport,
        ClientMessage::Join {
            name: session.to_uppercase(),
            avatar: "🐱".to_string(),
            session_id: session.to_string(),
        },
        T0,
    )
}

pub fn send(room: &mut TestRoom, transport: u32, message: ClientMessage, now: i64) -> Outbox<u32> {
    room.handle_message(transport, message, now)
}

pub fn guess(room: &mut TestRoom, transport: u32, letter: &str, now: i64) -> Outbox<u32> {
    room.handle_message(
        transport,
        ClientMessage::GuessLetter {
            letter: letter.to_string(),
        },
        now,
    )
}

pub fn configure(room: &mut TestRoom, transport: u32, patch: GameConfigPatch) -> Outbox<u32> {
    room.handle_message(transport, ClientMessage::UpdateConfig(patch), T0)
}

pub fn start(room: &mut TestRoom, transport: u32) -> Outbox<u32> {
    room.handle_message(transport, ClientMessage::StartGame, T0)
}

/// A room where `p1`..`pN` joined over transports 1..N, in a given mode.
/// `p1` is the host.
pub fn room_with_players(mode: GameMode, words: &[&str], count: u32) -> TestRoom {
    let mut room = create_test_room(words);
    for i in 1..=count {
        join(&mut room, i, &format!("p{i}"));
    }
    configure(
        &mut room,
        1,
        GameConfigPatch {
            mode: Some(mode),
            ..Default::default()
        },
    );
    room
}

pub fn shared_round(room: &TestRoom) -> &RoundState {
    room.state()
        .round
        .as_ref()
        .and_then(RoundPlay::shared)
        .expect("shared round in progress")
}

/// Exactly one host, and it is the recorded host id.
pub fn has_single_host(state: &GameState) -> bool {
    let hosts: Vec<_> = state.players.iter().filter(|p| p.is_host).collect();
    if state.players.is_empty() {
        return hosts.is_empty();
    }
    hosts.len() == 1 && hosts[0].id == state.host_id
}

pub fn last_state(outbox: &Outbox<u32>) -> Option<&GameState> {
    outbox
        .messages()
        .filter_map(|m| match m {
            ServerMessage::StateUpdate(state) => Some(state),
            _ => None,
        })
        .last()
}
