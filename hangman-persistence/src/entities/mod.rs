pub mod prelude;

pub mod room_snapshots;
