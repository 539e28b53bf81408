//! Save-then-broadcast sequencing for club chat.
//!
//! A send persists the message and then fans it out to the club's room while
//! holding the club's chat lock, so every live peer sees messages in the same
//! order the store appended them. A failed fan-out never undoes the append.

use crate::error::{ChatError, Result};
use crate::models::{Role, StoredMessage};
use crate::services::locks::ClubLocks;
use crate::services::membership::MembershipService;
use crate::services::message::MessageService;
use crate::ws::{BroadcastError, Broadcaster};
use bookclub_protocol::{MessageData, ServerMessage};
use std::sync::Arc;
use uuid::Uuid;

/// What happened to the live fan-out of an already-persisted event
#[derive(Debug)]
pub enum Delivery {
    /// Queued for this many connections in the room
    Broadcast { recipients: usize },
    /// Persisted, but live peers may not have seen it
    Failed(BroadcastError),
}

impl Delivery {
    fn from_result(result: std::result::Result<usize, BroadcastError>) -> Self {
        match result {
            Ok(recipients) => Delivery::Broadcast { recipients },
            Err(e) => Delivery::Failed(e),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Delivery::Broadcast { .. })
    }
}

#[derive(Debug)]
pub struct SendOutcome {
    pub message: StoredMessage,
    pub delivery: Delivery,
}

#[derive(Clone)]
pub struct ChatGateway {
    messages: MessageService,
    membership: MembershipService,
    broadcaster: Arc<dyn Broadcaster>,
    locks: ClubLocks,
}

impl ChatGateway {
    pub fn new(
        messages: MessageService,
        membership: MembershipService,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            messages,
            membership,
            broadcaster,
            locks: ClubLocks::new(),
        }
    }

    pub async fn send_message(
        &self,
        club_id: Option<Uuid>,
        sender_id: Option<Uuid>,
        text: Option<&str>,
    ) -> Result<SendOutcome> {
        let (Some(club_id), Some(text)) = (club_id, text) else {
            return Err(ChatError::MissingFields.into());
        };
        let sender_id = sender_id.ok_or(ChatError::Unauthenticated)?;

        // Unknown clubs never reach the lock map
        self.membership.club(club_id).await?;
        let _guard = self.locks.lock(club_id).await;

        let message = self
            .messages
            .append(Some(club_id), Some(sender_id), Some(text))
            .await?;

        let event = ServerMessage::MessageReceived(MessageData::from(message.clone()));
        let delivery = Delivery::from_result(self.broadcaster.broadcast(club_id, &event).await);

        match &delivery {
            Delivery::Broadcast { recipients } => tracing::debug!(
                "Message {} in club {} delivered to {} connections",
                message.id,
                club_id,
                recipients
            ),
            Delivery::Failed(e) => tracing::error!(
                "Message {} in club {} persisted but not broadcast: {}",
                message.id,
                club_id,
                e
            ),
        }

        Ok(SendOutcome { message, delivery })
    }

    pub async fn fetch_history(&self, club_id: Uuid) -> Result<Vec<StoredMessage>> {
        self.messages.list_by_club(club_id).await
    }

    /// Delete a message. Allowed for its sender and for admins of its club.
    pub async fn delete_message(&self, message_id: Uuid, acting_user_id: Uuid) -> Result<Delivery> {
        let message = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or(ChatError::MessageNotFound)?;
        let club_id = message.club_id;

        if message.sender_id != acting_user_id {
            let role = self.membership.role_of(club_id, acting_user_id).await?;
            if role != Some(Role::Admin) {
                return Err(ChatError::NotAllowed.into());
            }
        }

        let _guard = self.locks.lock(club_id).await;

        if !self.messages.delete_by_id(message_id).await? {
            return Err(ChatError::MessageNotFound.into());
        }

        tracing::info!(
            "Message {} in club {} deleted by {}",
            message_id,
            club_id,
            acting_user_id
        );

        let event = ServerMessage::MessageDeleted {
            message_id,
            club_id,
        };
        let delivery = Delivery::from_result(self.broadcaster.broadcast(club_id, &event).await);
        if let Delivery::Failed(e) = &delivery {
            tracing::error!("Deletion of message {} not broadcast: {}", message_id, e);
        }

        Ok(delivery)
    }
}
