use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::ws::WebSocket;

use crate::room::RoomManager;

pub mod connection;
pub mod handlers;


use connection::ConnectionId;
use handlers::{decode_client_message, encode_server_message};

/// Pumps one socket into its room until either side goes away.
pub async fn handle_connection(websocket: WebSocket, room_code: String, rooms: Arc<RoomManager>) {
    let connection_id = ConnectionId::new();
    info!(connection = %connection_id, room = %room_code, "New WebSocket connection");

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let (message_sender, mut message_receiver) = connection::outbound_channel();

    let room = match rooms.connect(&room_code, connection_id, message_sender).await {
        Ok(room) => room,
        Err(e) => {
            error!(connection = %connection_id, "Could not attach to room: {}", e);
            let _ = ws_sender.close().await;
            return;
        }
    };

    // Handle incoming messages
    let incoming_handler = {
        let room = room.clone();
        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) => {
                        if msg.is_close() {
                            break;
                        }
                        let Some(message) = decode_client_message(&msg, connection_id) else {
                            continue;
                        };
                        if let Err(e) = room.send_message(connection_id, message).await {
                            error!(connection = %connection_id, "Room rejected message: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(connection = %connection_id, "WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    };

    // Handle outgoing messages
    let outgoing_handler = async move {
        while let Some(message) = message_receiver.recv().await {
            let Some(frame) = encode_server_message(&message) else {
                continue;
            };
            if let Err(e) = ws_sender.send(frame).await {
                warn!(connection = %connection_id, "Failed to send message: {:?}", e);
                break;
            }
        }
    };

    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    info!(connection = %connection_id, room = %room.room_code(), "Connection closed");
    if let Err(e) = room.disconnect(connection_id).await {
        warn!(connection = %connection_id, "Room already gone on disconnect: {}", e);
    }
}
