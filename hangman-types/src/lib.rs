pub mod errors;
pub mod game;
pub mod messages;
pub mod player;
pub mod scoreboard;

// Re-export all types
pub use errors::*;
pub use game::*;
pub use messages::*;
pub use player::*;
pub use scoreboard::*;

/// Durable, client-supplied session identity. Doubles as the player id.
pub type PlayerId = String;

/// Opaque, case-insensitive room address supplied by the transport.
pub type RoomCode = String;
