use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::PlayerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub avatar: String,
    pub score: i32,
    pub is_host: bool,
    pub is_connected: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String, avatar: String, is_host: bool) -> Self {
        Self {
            id,
            name,
            avatar,
            score: 0,
            is_host,
            is_connected: true,
        }
    }
}
