pub mod connection;
pub mod entities;
pub mod repositories;
pub mod store;

pub use repositories::snapshot_repository::SnapshotRepository;
pub use store::{InMemorySnapshotStore, SnapshotStore};

use sea_orm::{DatabaseConnection, DbErr};

pub struct DatabaseManager {
    connection: DatabaseConnection,
}

impl DatabaseManager {
    /// Connects to `database_url` and runs pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, DbErr> {
        let connection = connection::connect_and_migrate(database_url).await?;
        Ok(Self { connection })
    }

    pub fn get_connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    pub fn snapshot_repository(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.connection.clone())
    }
}
