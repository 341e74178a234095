use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Why an inbound action was refused. The display text is what the requester
/// receives in its `error` message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    #[error("Only host can {action}")]
    NotHost { action: String },
    #[error("Cannot update config during game")]
    ConfigLocked,
    #[error("Game is not in progress")]
    GameNotInProgress,
    #[error("Game already in progress")]
    GameAlreadyInProgress,
    #[error("Cannot start next round now")]
    CannotStartNextRound,
    #[error("Need at least {required} players for this mode")]
    NotEnoughPlayers { required: usize },
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Letter already guessed: {letter}")]
    LetterAlreadyGuessed { letter: char },
    #[error("Invalid letter: {letter:?}")]
    InvalidLetter { letter: String },
    #[error("You have already finished this round")]
    AlreadyFinished,
    #[error("You are not playing in this round")]
    NotInRound,
    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },
    #[error("Cannot kick yourself")]
    CannotKickSelf,
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[error("A session id is required to join")]
    MissingSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    State,
    Validation,
}

impl GameError {
    pub fn not_host(action: &str) -> Self {
        GameError::NotHost {
            action: action.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::NotHost { .. } => ErrorKind::Authorization,
            GameError::ConfigLocked
            | GameError::GameNotInProgress
            | GameError::GameAlreadyInProgress
            | GameError::CannotStartNextRound
            | GameError::NotEnoughPlayers { .. } => ErrorKind::State,
            _ => ErrorKind::Validation,
        }
    }
}
