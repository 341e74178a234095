pub mod cleanup;
pub mod game_events;
pub mod game_state;
pub mod normalization;
pub mod registry;
pub mod scoring;
pub mod words;

// Re-export main components
pub use cleanup::*;
pub use game_events::*;
pub use game_state::*;
pub use normalization::*;
pub use registry::*;
pub use scoring::*;
pub use words::*;
