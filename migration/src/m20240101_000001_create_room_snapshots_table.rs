use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoomSnapshots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoomSnapshots::RoomCode)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    // Whole serialized game state, replaced on every save
                    .col(ColumnDef::new(RoomSnapshots::State).text().not_null())
                    .col(
                        ColumnDef::new(RoomSnapshots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoomSnapshots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RoomSnapshots {
    Table,
    RoomCode,
    State,
    UpdatedAt,
}
