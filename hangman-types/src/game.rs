use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use ts_rs::TS;

use crate::{GameError, Player, PlayerId, RoomCode, Scoreboard};

pub const ALLOWED_MAX_ATTEMPTS: [u8; 3] = [6, 8, 10];
pub const ALLOWED_ROUNDS: [u8; 3] = [1, 3, 5];
pub const MAX_TURN_TIME_LIMIT_SECONDS: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameMode {
    Single,
    Team,
    Competitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Category {
    Animales,
    Paises,
    Peliculas,
    Comida,
    Deportes,
    Profesiones,
    Tecnologia,
    Mix, // Not a word list: resolved to one of the others at draw time
}

impl Category {
    /// Every category that owns a word list.
    pub const CONCRETE: [Category; 7] = [
        Category::Animales,
        Category::Paises,
        Category::Peliculas,
        Category::Comida,
        Category::Deportes,
        Category::Profesiones,
        Category::Tecnologia,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Difficulty {
    Facil,
    Medio,
    Dificil,
}

impl Difficulty {
    /// Accepted word lengths, whitespace excluded.
    pub fn length_range(self) -> RangeInclusive<usize> {
        match self {
            Difficulty::Facil => 4..=6,
            Difficulty::Medio => 7..=10,
            Difficulty::Dificil => 11..=20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameStatus {
    Lobby,
    Configuring,
    Playing,
    BetweenRounds,
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameStatus::Lobby => "lobby",
            GameStatus::Configuring => "configuring",
            GameStatus::Playing => "playing",
            GameStatus::BetweenRounds => "between_rounds",
            GameStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameConfig {
    pub mode: GameMode,
    pub category: Category,
    pub difficulty: Difficulty,
    pub max_attempts: u8,
    pub rounds: u8,
    pub turn_time_limit: Option<u32>, // seconds, None = no limit
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Team,
            category: Category::Mix,
            difficulty: Difficulty::Medio,
            max_attempts: 6,
            rounds: 3,
            turn_time_limit: None,
        }
    }
}

impl GameConfig {
    /// Returns a copy with the patch applied, or the first invalid field.
    pub fn merged(&self, patch: &GameConfigPatch) -> Result<GameConfig, GameError> {
        let mut next = self.clone();

        if let Some(mode) = patch.mode {
            next.mode = mode;
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(difficulty) = patch.difficulty {
            next.difficulty = difficulty;
        }
        if let Some(max_attempts) = patch.max_attempts {
            if !ALLOWED_MAX_ATTEMPTS.contains(&max_attempts) {
                return Err(GameError::InvalidConfig {
                    reason: format!("maxAttempts must be one of {ALLOWED_MAX_ATTEMPTS:?}"),
                });
            }
            next.max_attempts = max_attempts;
        }
        if let Some(rounds) = patch.rounds {
            if !ALLOWED_ROUNDS.contains(&rounds) {
                return Err(GameError::InvalidConfig {
                    reason: format!("rounds must be one of {ALLOWED_ROUNDS:?}"),
                });
            }
            next.rounds = rounds;
        }
        if let Some(limit) = patch.turn_time_limit {
            next.turn_time_limit = match limit {
                None | Some(0) => None,
                Some(seconds) if seconds <= MAX_TURN_TIME_LIMIT_SECONDS => Some(seconds),
                Some(_) => {
                    return Err(GameError::InvalidConfig {
                        reason: format!(
                            "turnTimeLimit must be at most {MAX_TURN_TIME_LIMIT_SECONDS} seconds"
                        ),
                    });
                }
            };
        }

        Ok(next)
    }
}

/// Partial configuration sent by the host. Absent fields are left untouched;
/// `turnTimeLimit: null` explicitly clears the limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GameMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u8>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    pub turn_time_limit: Option<Option<u32>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u32>::deserialize(deserializer).map(Some)
}

/// A word being guessed together with the letters tried against it.
///
/// Letters are stored upper-cased and diacritic-free, in guess order. A letter
/// appears at most once across both lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Puzzle {
    pub word: String,
    pub revealed_letters: Vec<char>,
    pub wrong_letters: Vec<char>,
}

impl Puzzle {
    pub fn new(word: String) -> Self {
        Self {
            word,
            revealed_letters: Vec::new(),
            wrong_letters: Vec::new(),
        }
    }

    pub fn has_guessed(&self, letter: char) -> bool {
        self.revealed_letters.contains(&letter) || self.wrong_letters.contains(&letter)
    }
}

/// Shared-word round used by team and single modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoundState {
    pub round_number: u32,
    #[serde(flatten)]
    pub puzzle: Puzzle,
    pub category: Category,
    pub current_player_index: usize,
    pub start_time: i64,              // ms since the Unix epoch
    pub turn_start_time: Option<i64>, // set only while a turn limit is configured
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompetitivePlayerState {
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub puzzle: Puzzle,
    pub has_won: bool,
    pub has_lost: bool,
    pub finish_time: Option<i64>,
}

impl CompetitivePlayerState {
    pub fn new(player_id: PlayerId, word: String) -> Self {
        Self {
            player_id,
            puzzle: Puzzle::new(word),
            has_won: false,
            has_lost: false,
            finish_time: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.has_won || self.has_lost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompetitiveRound {
    pub round_number: u32,
    pub start_time: i64,
    pub competitive_states: Vec<CompetitivePlayerState>,
}

/// The round in progress. Which variant exists follows from the configured
/// mode, so a room can never hold a shared round and per-player puzzles at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[ts(export)]
pub enum RoundPlay {
    Single(RoundState),
    Team(RoundState),
    Competitive(CompetitiveRound),
}

impl RoundPlay {
    pub fn shared(&self) -> Option<&RoundState> {
        match self {
            RoundPlay::Single(round) | RoundPlay::Team(round) => Some(round),
            RoundPlay::Competitive(_) => None,
        }
    }

    pub fn shared_mut(&mut self) -> Option<&mut RoundState> {
        match self {
            RoundPlay::Single(round) | RoundPlay::Team(round) => Some(round),
            RoundPlay::Competitive(_) => None,
        }
    }

    pub fn competitive(&self) -> Option<&CompetitiveRound> {
        match self {
            RoundPlay::Competitive(round) => Some(round),
            _ => None,
        }
    }

    /// The word reported in `round_ended`. For competitive rounds this is the
    /// first player's word, which carries no meaning beyond display.
    pub fn representative_word(&self) -> String {
        match self {
            RoundPlay::Single(round) | RoundPlay::Team(round) => round.puzzle.word.clone(),
            RoundPlay::Competitive(round) => round
                .competitive_states
                .first()
                .map(|state| state.puzzle.word.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameState {
    pub room_code: RoomCode,
    pub status: GameStatus,
    pub config: GameConfig,
    pub players: Vec<Player>,
    pub host_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub round: Option<RoundPlay>,
    #[ts(type = "Record<string, number>")]
    pub scores: Scoreboard,
    pub current_round: u32,
    pub round_winners: Vec<PlayerId>,
}

impl GameState {
    /// The empty lobby a room starts in and returns to after idle reclaim.
    pub fn new(room_code: RoomCode) -> Self {
        Self {
            room_code,
            status: GameStatus::Lobby,
            config: GameConfig::default(),
            players: Vec::new(),
            host_id: String::new(),
            round: None,
            scores: Scoreboard::new(),
            current_round: 0,
            round_winners: Vec::new(),
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.player(player_id).is_some_and(|p| p.is_host)
    }

    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_connected).count()
    }

    /// Copies the scoreboard total into the matching player record.
    pub fn sync_player_score(&mut self, player_id: &str) {
        let total = self.scores.get(player_id).unwrap_or(0);
        if let Some(player) = self.player_mut(player_id) {
            player.score = total;
        }
    }
}
