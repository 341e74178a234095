use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "room_snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub room_code: String,
    #[sea_orm(column_type = "Text")]
    pub state: String,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
