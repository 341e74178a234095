use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

pub mod config;
pub mod room;
pub mod websocket;

use room::{RoomError, RoomManager, normalize_room_code};

pub fn create_routes(
    rooms: Arc<RoomManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let rooms_filter = warp::any().map({
        let rooms = rooms.clone();
        move || rooms.clone()
    });

    // WebSocket endpoint, one room per path segment
    let websocket = warp::path!("ws" / String)
        .and(warp::ws())
        .and(rooms_filter.clone())
        .map(
            |room_code: String, ws: warp::ws::Ws, rooms: Arc<RoomManager>| {
                match normalize_room_code(&room_code) {
                    Ok(code) => {
                        let reply = ws.on_upgrade(move |socket| {
                            websocket::handle_connection(socket, code, rooms)
                        });
                        Box::new(reply) as Box<dyn warp::Reply>
                    }
                    Err(e) => {
                        Box::new(error_reply(&e, StatusCode::BAD_REQUEST)) as Box<dyn warp::Reply>
                    }
                }
            },
        );

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let room_state = warp::path!("rooms" / String / "state")
        .and(warp::get())
        .and(rooms_filter.clone())
        .and_then(handle_room_state_request);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(room_state)
        .with(cors)
        .with(warp::log("hangman"))
}

fn error_reply(error: &RoomError, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": error.to_string()
        })),
        status,
    )
}

async fn handle_room_state_request(
    room_code: String,
    rooms: Arc<RoomManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match rooms.snapshot(&room_code).await {
        Ok(state) => Ok(warp::reply::with_status(
            warp::reply::json(&state),
            StatusCode::OK,
        )),
        Err(e @ RoomError::InvalidRoomCode(_)) => Ok(error_reply(&e, StatusCode::BAD_REQUEST)),
        Err(e @ RoomError::Unavailable(_)) => {
            tracing::error!("Failed to read room state: {}", e);
            Ok(error_reply(&e, StatusCode::SERVICE_UNAVAILABLE))
        }
    }
}
