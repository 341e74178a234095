pub use super::room_snapshots::Entity as RoomSnapshots;
