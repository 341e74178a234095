use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::PlayerId;

/// Cumulative scores keyed by player id.
///
/// Serialized as a plain JSON object, but iteration always follows the order
/// in which each id first received a score. Game-winner tie-breaking relies on
/// that order, so a hash map is not an option here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    entries: Vec<(PlayerId, i32)>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player_id: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(id, _)| id == player_id)
            .map(|(_, score)| *score)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.get(player_id).is_some()
    }

    /// Sets a score, appending the id if it has never been scored before.
    pub fn set(&mut self, player_id: &str, score: i32) {
        match self.entries.iter_mut().find(|(id, _)| id == player_id) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((player_id.to_string(), score)),
        }
    }

    /// Adds points and returns the new total.
    pub fn add(&mut self, player_id: &str, points: i32) -> i32 {
        let total = self.get(player_id).unwrap_or(0) + points;
        self.set(player_id, total);
        total
    }

    pub fn remove(&mut self, player_id: &str) -> Option<i32> {
        let index = self.entries.iter().position(|(id, _)| id == player_id)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, i32)> {
        self.entries.iter().map(|(id, score)| (id, *score))
    }

    /// The id holding the strictly highest score. Ties go to the entry that
    /// was scored first.
    pub fn leader(&self) -> Option<&PlayerId> {
        let mut best: Option<(&PlayerId, i32)> = None;
        for (id, score) in self.iter() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((id, score)),
            }
        }
        best.map(|(id, _)| id)
    }
}

impl Serialize for Scoreboard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, score) in &self.entries {
            map.serialize_entry(id, score)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Scoreboard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoreboardVisitor;

        impl<'de> Visitor<'de> for ScoreboardVisitor {
            type Value = Scoreboard;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of player ids to scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Scoreboard, A::Error> {
                let mut board = Scoreboard::new();
                while let Some((id, score)) = access.next_entry::<PlayerId, i32>()? {
                    board.set(&id, score);
                }
                Ok(board)
            }
        }

        deserializer.deserialize_map(ScoreboardVisitor)
    }
}
