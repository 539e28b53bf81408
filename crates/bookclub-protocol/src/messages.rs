use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MessageData;

/// Messages sent from client to server via WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Authenticate with the server. Must be the first frame.
    Authenticate { token: String },

    /// Start receiving events for a club's chat room
    JoinClubRoom { club_id: Uuid },

    /// Stop receiving events for a club's chat room
    LeaveClubRoom { club_id: Uuid },

    /// Ping to keep connection alive
    Ping,
}

/// Messages sent from server to client via WebSocket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Authentication successful
    Authenticated { connection_id: Uuid },

    /// Error message
    Error { message: String },

    /// Pong response to ping
    Pong,

    /// Joined a club room
    RoomJoined { club_id: Uuid },

    /// Left a club room
    RoomLeft { club_id: Uuid },

    /// New chat message persisted in the room's club. The message fields
    /// sit next to `type` rather than under a nested key.
    MessageReceived(MessageData),

    /// Chat message removed from the room's club
    MessageDeleted { message_id: Uuid, club_id: Uuid },

    /// A user joined the club as a member
    MemberJoined {
        club_id: Uuid,
        user_id: Uuid,
        name: String,
    },
}

impl ServerMessage {
    /// Event name as it appears in the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Authenticated { .. } => "authenticated",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Pong => "pong",
            ServerMessage::RoomJoined { .. } => "room-joined",
            ServerMessage::RoomLeft { .. } => "room-left",
            ServerMessage::MessageReceived(_) => "message-received",
            ServerMessage::MessageDeleted { .. } => "message-deleted",
            ServerMessage::MemberJoined { .. } => "member-joined",
        }
    }
}
