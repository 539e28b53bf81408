use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::CreateMessage;
use crate::services::chat::Delivery;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use bookclub_protocol::MessageData;
use serde::Serialize;
use uuid::Uuid;

/// A persisted message plus what happened to its live fan-out
#[derive(Debug, Serialize)]
pub struct SentMessage {
    #[serde(flatten)]
    pub message: MessageData,
    pub live_delivery: bool,
    pub recipients: usize,
}

#[derive(Debug, Serialize)]
pub struct DeletedMessage {
    pub message_id: Uuid,
    pub live_delivery: bool,
}

pub async fn list_club_messages(
    State(state): State<AppState>,
    _auth: AuthUser,
    WithRejection(Path(club_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Vec<MessageData>>> {
    let messages = state.chat_gateway.fetch_history(club_id).await?;
    Ok(Json(messages.into_iter().map(MessageData::from).collect()))
}

pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(input), _): WithRejection<Json<CreateMessage>, AppError>,
) -> Result<(StatusCode, Json<SentMessage>)> {
    // A token for an account that no longer exists counts as no sender
    let sender_id = state
        .user_service
        .find_by_id(auth.user_id)
        .await?
        .map(|user| user.id);

    let outcome = state
        .chat_gateway
        .send_message(input.club_id, sender_id, input.text.as_deref())
        .await?;

    let recipients = match outcome.delivery {
        Delivery::Broadcast { recipients } => recipients,
        Delivery::Failed(_) => 0,
    };

    Ok((
        StatusCode::CREATED,
        Json(SentMessage {
            live_delivery: outcome.delivery.is_live(),
            message: outcome.message.into(),
            recipients,
        }),
    ))
}

pub async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Path(message_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<DeletedMessage>> {
    let delivery = state
        .chat_gateway
        .delete_message(message_id, auth.user_id)
        .await?;

    Ok(Json(DeletedMessage {
        message_id,
        live_delivery: delivery.is_live(),
    }))
}
