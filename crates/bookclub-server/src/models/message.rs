use bookclub_protocol::MessageData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub club_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    /// Reserved for image attachments
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Message with the sender's display projection resolved
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredMessage {
    pub id: Uuid,
    pub club_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sender_name: String,
    pub sender_avatar_url: Option<String>,
}

impl From<StoredMessage> for MessageData {
    fn from(msg: StoredMessage) -> Self {
        MessageData {
            id: msg.id,
            club_id: msg.club_id,
            text: msg.text,
            sender_id: msg.sender_id,
            sender_display_name: msg.sender_name,
            sender_avatar_url: msg.sender_avatar_url,
            timestamp: msg.created_at,
        }
    }
}

/// Body of `POST /api/messages`. Fields are optional so that absence is
/// reported as a validation error rather than a JSON rejection.
#[derive(Debug, Deserialize)]
pub struct CreateMessage {
    pub club_id: Option<Uuid>,
    pub text: Option<String>,
}
