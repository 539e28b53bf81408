use crate::auth::verify_token;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use bookclub_protocol::{ClientMessage, ServerMessage};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Failed to serialize {}: {}", message.kind(), e);
            None
        }
    }
}

/// Reply on the raw socket, before the connection has an outbound queue
async fn reply(sender: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) -> bool {
    match encode(message) {
        Some(frame) => sender.send(frame).await.is_ok(),
        None => false,
    }
}

async fn reject(sender: &mut SplitSink<WebSocket, Message>, reason: &str) {
    reply(
        sender,
        &ServerMessage::Error {
            message: reason.to_string(),
        },
    )
    .await;
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // First message should be authentication
    let auth_msg = match receiver.next().await {
        Some(Ok(Message::Text(text))) => text,
        _ => {
            tracing::warn!("WebSocket closed before authentication");
            return;
        }
    };

    let user_id = match serde_json::from_str::<ClientMessage>(auth_msg.as_str()) {
        Ok(ClientMessage::Authenticate { token }) => {
            match verify_token(&token, &state.config.jwt_secret) {
                Ok(claims) => claims.sub,
                Err(e) => {
                    tracing::warn!("Rejected WebSocket token: {}", e);
                    reject(&mut sender, "Invalid token").await;
                    return;
                }
            }
        }
        Ok(_) => {
            reject(&mut sender, "First message must be authentication").await;
            return;
        }
        Err(e) => {
            tracing::warn!("Invalid auth message: {}", e);
            reject(&mut sender, "Invalid message format").await;
            return;
        }
    };

    let connection_id = Uuid::new_v4();
    if !reply(&mut sender, &ServerMessage::Authenticated { connection_id }).await {
        return;
    }

    tracing::info!("User {} authenticated on WebSocket", user_id);

    // Everything after this point goes through the ordered outbound queue
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.connections.connect(connection_id, user_id, tx).await;

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let client_msg: ClientMessage = match serde_json::from_str(text.as_str()) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!("Invalid message from {}: {}", user_id, e);
                        state
                            .connections
                            .send_to_connection(
                                connection_id,
                                &ServerMessage::Error {
                                    message: "Invalid message format".to_string(),
                                },
                            )
                            .await;
                        continue;
                    }
                };

                handle_client_message(&state, user_id, connection_id, client_msg).await;
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::error!("WebSocket error for user {}: {}", user_id, e);
                break;
            }
            _ => {}
        }
    }

    state.connections.disconnect(connection_id).await;
    send_task.abort();

    tracing::info!("User {} disconnected from WebSocket", user_id);
}

async fn handle_client_message(
    state: &AppState,
    user_id: Uuid,
    connection_id: Uuid,
    message: ClientMessage,
) {
    let response = match message {
        ClientMessage::Authenticate { .. } => {
            // Already authenticated
            return;
        }
        ClientMessage::JoinClubRoom { club_id } => {
            match may_join_room(state, club_id, user_id).await {
                Ok(()) => {
                    state.connections.join_room(connection_id, club_id).await;
                    ServerMessage::RoomJoined { club_id }
                }
                Err(reason) => {
                    tracing::warn!("User {} refused room {}: {}", user_id, club_id, reason);
                    ServerMessage::Error { message: reason }
                }
            }
        }
        ClientMessage::LeaveClubRoom { club_id } => {
            state.connections.leave_room(connection_id, club_id).await;
            ServerMessage::RoomLeft { club_id }
        }
        ClientMessage::Ping => ServerMessage::Pong,
    };

    state
        .connections
        .send_to_connection(connection_id, &response)
        .await;
}

async fn may_join_room(state: &AppState, club_id: Uuid, user_id: Uuid) -> Result<(), String> {
    if !state.config.room_requires_membership {
        return Ok(());
    }

    match state.membership_service.require_member(club_id, user_id).await {
        Ok(_) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}
