use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use tracing::debug;

use crate::entities::{prelude::*, room_snapshots};
use crate::store::SnapshotStore;
use hangman_types::GameState;

pub struct SnapshotRepository {
    db: DatabaseConnection,
}

impl SnapshotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnapshotStore for SnapshotRepository {
    async fn load(&self, room_code: &str) -> Result<Option<GameState>> {
        let model = RoomSnapshots::find_by_id(room_code.to_string())
            .one(&self.db)
            .await?;

        match model {
            Some(model) => Ok(Some(serde_json::from_str(&model.state)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, state: &GameState) -> Result<()> {
        let snapshot = room_snapshots::ActiveModel {
            room_code: ActiveValue::Set(state.room_code.clone()),
            state: ActiveValue::Set(serde_json::to_string(state)?),
            updated_at: ActiveValue::Set(chrono::Utc::now().into()),
        };

        RoomSnapshots::insert(snapshot)
            .on_conflict(
                OnConflict::column(room_snapshots::Column::RoomCode)
                    .update_columns([
                        room_snapshots::Column::State,
                        room_snapshots::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        debug!(room = %state.room_code, status = %state.status, "Snapshot saved");
        Ok(())
    }
}
