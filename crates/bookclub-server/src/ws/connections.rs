use async_trait::async_trait;
use bookclub_protocol::ServerMessage;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Room-scoped fan-out, injected into whatever needs to notify live clients.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Deliver `event` to every connection currently in the club's room.
    /// Returns how many connections it was queued for.
    async fn broadcast(&self, club_id: Uuid, event: &ServerMessage) -> Result<usize, BroadcastError>;
}

struct Connection {
    user_id: Uuid,
    sender: mpsc::UnboundedSender<String>,
    rooms: HashSet<Uuid>,
}

#[derive(Default)]
struct Registry {
    /// Connection ID to its outbound queue and joined rooms
    connections: HashMap<Uuid, Connection>,
    /// Club ID to the connections in its room
    rooms: HashMap<Uuid, HashSet<Uuid>>,
}

impl Registry {
    fn leave(&mut self, connection_id: Uuid, club_id: Uuid) {
        if let Some(members) = self.rooms.get_mut(&club_id) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(&club_id);
            }
        }
    }
}

/// Live connections and the club rooms they have joined.
///
/// Room membership comes only from explicit join/leave calls; it is never
/// derived from persisted club roles. Each connection owns an ordered
/// outbound queue, so events broadcast one after another reach every member
/// of the room in that order.
pub struct ConnectionManager {
    registry: RwLock<Registry>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    pub async fn connect(
        &self,
        connection_id: Uuid,
        user_id: Uuid,
        sender: mpsc::UnboundedSender<String>,
    ) {
        self.registry.write().await.connections.insert(
            connection_id,
            Connection {
                user_id,
                sender,
                rooms: HashSet::new(),
            },
        );

        tracing::debug!(
            "User {} connected with connection ID {}",
            user_id,
            connection_id
        );
    }

    pub async fn disconnect(&self, connection_id: Uuid) {
        let mut registry = self.registry.write().await;

        if let Some(connection) = registry.connections.remove(&connection_id) {
            for club_id in &connection.rooms {
                registry.leave(connection_id, *club_id);
            }

            tracing::debug!(
                "User {} disconnected (connection ID {}), left {} rooms",
                connection.user_id,
                connection_id,
                connection.rooms.len()
            );
        }
    }

    /// Idempotent. Returns false if the connection is not registered.
    pub async fn join_room(&self, connection_id: Uuid, club_id: Uuid) -> bool {
        let mut registry = self.registry.write().await;

        let Some(connection) = registry.connections.get_mut(&connection_id) else {
            return false;
        };
        connection.rooms.insert(club_id);

        registry
            .rooms
            .entry(club_id)
            .or_default()
            .insert(connection_id);

        tracing::debug!("Connection {} joined room {}", connection_id, club_id);
        true
    }

    /// Idempotent; leaving a room that was never joined is a no-op.
    pub async fn leave_room(&self, connection_id: Uuid, club_id: Uuid) {
        let mut registry = self.registry.write().await;

        if let Some(connection) = registry.connections.get_mut(&connection_id) {
            connection.rooms.remove(&club_id);
        }
        registry.leave(connection_id, club_id);
    }

    pub async fn broadcast_to_room(
        &self,
        club_id: Uuid,
        message: &ServerMessage,
    ) -> Result<usize, BroadcastError> {
        let json = serde_json::to_string(message)?;
        let registry = self.registry.read().await;

        let Some(members) = registry.rooms.get(&club_id) else {
            tracing::debug!("No connections in room {}", club_id);
            return Ok(0);
        };

        tracing::debug!(
            "Broadcasting {} to {} connections in room {}",
            message.kind(),
            members.len(),
            club_id
        );

        let mut delivered = 0;
        for conn_id in members {
            if let Some(connection) = registry.connections.get(conn_id) {
                match connection.sender.send(json.clone()) {
                    Ok(()) => delivered += 1,
                    Err(e) => tracing::error!("Failed to send message to {}: {}", conn_id, e),
                }
            }
        }

        Ok(delivered)
    }

    pub async fn send_to_connection(&self, connection_id: Uuid, message: &ServerMessage) {
        let json = match serde_json::to_string(message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!("Failed to serialize message: {}", e);
                return;
            }
        };

        let registry = self.registry.read().await;

        if let Some(connection) = registry.connections.get(&connection_id) {
            if let Err(e) = connection.sender.send(json) {
                tracing::error!("Failed to send message to {}: {}", connection_id, e);
            }
        }
    }

    pub async fn rooms_of(&self, connection_id: Uuid) -> HashSet<Uuid> {
        self.registry
            .read()
            .await
            .connections
            .get(&connection_id)
            .map(|c| c.rooms.clone())
            .unwrap_or_default()
    }

    pub async fn room_size(&self, club_id: Uuid) -> usize {
        self.registry
            .read()
            .await
            .rooms
            .get(&club_id)
            .map(HashSet::len)
            .unwrap_or(0)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broadcaster for ConnectionManager {
    async fn broadcast(&self, club_id: Uuid, event: &ServerMessage) -> Result<usize, BroadcastError> {
        self.broadcast_to_room(club_id, event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connected(manager: &ConnectionManager) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();
        manager.connect(connection_id, Uuid::new_v4(), tx).await;
        (connection_id, rx)
    }

    fn decode(raw: String) -> ServerMessage {
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn broadcast_reaches_only_the_room() {
        let manager = ConnectionManager::new();
        let fiction = Uuid::new_v4();
        let poetry = Uuid::new_v4();
        let (reader, mut reader_rx) = connected(&manager).await;
        let (poet, mut poet_rx) = connected(&manager).await;

        manager.join_room(reader, fiction).await;
        manager.join_room(poet, poetry).await;

        let event = ServerMessage::RoomJoined { club_id: fiction };
        assert_eq!(manager.broadcast_to_room(fiction, &event).await.unwrap(), 1);

        assert_eq!(decode(reader_rx.try_recv().unwrap()), event);
        assert!(poet_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn join_and_leave_are_idempotent() {
        let manager = ConnectionManager::new();
        let club = Uuid::new_v4();
        let (conn, _rx) = connected(&manager).await;

        assert!(manager.join_room(conn, club).await);
        assert!(manager.join_room(conn, club).await);
        assert_eq!(manager.room_size(club).await, 1);

        manager.leave_room(conn, club).await;
        manager.leave_room(conn, club).await;
        assert_eq!(manager.room_size(club).await, 0);
        assert!(manager.rooms_of(conn).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_connection_cannot_join() {
        let manager = ConnectionManager::new();
        let club = Uuid::new_v4();

        assert!(!manager.join_room(Uuid::new_v4(), club).await);
        assert_eq!(manager.room_size(club).await, 0);
    }

    #[tokio::test]
    async fn disconnect_leaves_every_room() {
        let manager = ConnectionManager::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let (conn, mut rx) = connected(&manager).await;

        manager.join_room(conn, first).await;
        manager.join_room(conn, second).await;
        manager.disconnect(conn).await;

        assert_eq!(manager.room_size(first).await, 0);
        assert_eq!(manager.room_size(second).await, 0);

        let event = ServerMessage::Pong;
        assert_eq!(manager.broadcast_to_room(first, &event).await.unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn room_members_see_broadcast_order() {
        let manager = ConnectionManager::new();
        let club = Uuid::new_v4();
        let (a, mut a_rx) = connected(&manager).await;
        let (b, mut b_rx) = connected(&manager).await;
        manager.join_room(a, club).await;
        manager.join_room(b, club).await;

        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            let event = ServerMessage::MessageDeleted {
                message_id: *id,
                club_id: club,
            };
            manager.broadcast(club, &event).await.unwrap();
        }

        for rx in [&mut a_rx, &mut b_rx] {
            let seen: Vec<Uuid> = ids
                .iter()
                .map(|_| match decode(rx.try_recv().unwrap()) {
                    ServerMessage::MessageDeleted { message_id, .. } => message_id,
                    other => panic!("unexpected event {:?}", other),
                })
                .collect();
            assert_eq!(seen, ids);
        }
    }

    #[tokio::test]
    async fn closed_receivers_are_not_counted() {
        let manager = ConnectionManager::new();
        let club = Uuid::new_v4();
        let (open, _open_rx) = connected(&manager).await;
        let (closed, closed_rx) = connected(&manager).await;
        manager.join_room(open, club).await;
        manager.join_room(closed, club).await;
        drop(closed_rx);

        let delivered = manager
            .broadcast_to_room(club, &ServerMessage::Pong)
            .await
            .unwrap();
        assert_eq!(delivered, 1);
    }
}
