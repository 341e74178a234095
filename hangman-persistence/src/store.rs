use anyhow::Result;
use async_trait::async_trait;
use hangman_types::GameState;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Whole-state snapshots keyed by room code. Saves replace wholesale.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, room_code: &str) -> Result<Option<GameState>>;
    async fn save(&self, state: &GameState) -> Result<()>;
}

/// Keeps serialized snapshots in process memory. Used when no database is
/// configured and in tests.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, String>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self, room_code: &str) -> Result<Option<GameState>> {
        let snapshots = self.snapshots.read().await;
        match snapshots.get(room_code) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, state: &GameState) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.snapshots
            .write()
            .await
            .insert(state.room_code.clone(), raw);
        Ok(())
    }
}
