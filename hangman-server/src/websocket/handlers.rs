use hangman_types::{ClientMessage, ServerMessage};
use tracing::{error, warn};
use warp::ws::Message;

use super::connection::ConnectionId;

/// Decodes an inbound frame. Non-text frames are ignored; text that is not a
/// valid client message is logged and dropped.
pub fn decode_client_message(msg: &Message, connection_id: ConnectionId) -> Option<ClientMessage> {
    if !msg.is_text() {
        return None;
    }

    let text = msg.to_str().ok()?;
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(connection = %connection_id, "Dropping malformed message: {}", e);
            None
        }
    }
}

pub fn encode_server_message(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::text(json)),
        Err(e) => {
            error!("Failed to serialize message: {:?}", e);
            None
        }
    }
}
