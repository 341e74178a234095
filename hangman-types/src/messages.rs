use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::{GameConfigPatch, GameState, Player, PlayerId, Scoreboard};

/// Frames sent by clients: `{ "type": ..., "payload": ... }`. Variants
/// without data may omit the payload or send `null` or `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
#[ts(export)]
pub enum ClientMessage {
    Join {
        name: String,
        avatar: String,
        session_id: PlayerId,
    },
    Leave,
    UpdateConfig(GameConfigPatch),
    StartGame,
    GuessLetter {
        letter: String,
    },
    NextRound,
    RestartGame,
    KickPlayer {
        player_id: PlayerId,
    },
}

/// Inbound wire shape. Payload-less messages carry an optional empty object.
#[derive(Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
enum ClientFrame {
    Join {
        name: String,
        avatar: String,
        session_id: PlayerId,
    },
    Leave(Option<NoPayload>),
    UpdateConfig(GameConfigPatch),
    StartGame(Option<NoPayload>),
    GuessLetter {
        letter: String,
    },
    NextRound(Option<NoPayload>),
    RestartGame(Option<NoPayload>),
    KickPlayer {
        player_id: PlayerId,
    },
}

#[derive(Deserialize)]
struct NoPayload {}

impl From<ClientFrame> for ClientMessage {
    fn from(frame: ClientFrame) -> Self {
        match frame {
            ClientFrame::Join {
                name,
                avatar,
                session_id,
            } => ClientMessage::Join {
                name,
                avatar,
                session_id,
            },
            ClientFrame::Leave(_) => ClientMessage::Leave,
            ClientFrame::UpdateConfig(patch) => ClientMessage::UpdateConfig(patch),
            ClientFrame::StartGame(_) => ClientMessage::StartGame,
            ClientFrame::GuessLetter { letter } => ClientMessage::GuessLetter { letter },
            ClientFrame::NextRound(_) => ClientMessage::NextRound,
            ClientFrame::RestartGame(_) => ClientMessage::RestartGame,
            ClientFrame::KickPlayer { player_id } => ClientMessage::KickPlayer { player_id },
        }
    }
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ClientFrame::deserialize(deserializer).map(Into::into)
    }
}

impl ClientMessage {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::Leave => "leave",
            ClientMessage::UpdateConfig(_) => "update_config",
            ClientMessage::StartGame => "start_game",
            ClientMessage::GuessLetter { .. } => "guess_letter",
            ClientMessage::NextRound => "next_round",
            ClientMessage::RestartGame => "restart_game",
            ClientMessage::KickPlayer { .. } => "kick_player",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
#[ts(export)]
pub enum ServerMessage {
    StateUpdate(GameState),
    PlayerJoined(Player),
    PlayerLeft {
        player_id: PlayerId,
    },
    LetterGuessed {
        player_id: PlayerId,
        letter: char,
        correct: bool,
    },
    RoundEnded {
        winner: Option<PlayerId>,
        word: String,
    },
    GameEnded {
        winner: Option<PlayerId>,
        #[ts(type = "Record<string, number>")]
        scores: Scoreboard,
    },
    TurnTimeout {
        player_id: PlayerId,
    },
    Error {
        message: String,
    },
}
