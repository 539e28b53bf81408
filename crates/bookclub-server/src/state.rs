use crate::services::{
    chat::ChatGateway, club::ClubService, membership::MembershipService, message::MessageService,
    user::UserService,
};
use crate::ws::{Broadcaster, ConnectionManager};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    /// Upper bound on waiting for a pooled connection or a locked database
    pub db_timeout: Duration,
    /// Reject `join-club-room` from users without a role in the club
    pub room_requires_membership: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:bookclub.db".to_string());

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using default (insecure for production!)");
            "dev-secret-change-in-production".to_string()
        });

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let db_timeout = match std::env::var("DB_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .map_err(|e| anyhow::anyhow!("Invalid DB_TIMEOUT_SECS {:?}: {}", raw, e))?,
            ),
            Err(_) => Duration::from_secs(5),
        };

        let room_requires_membership = match std::env::var("ROOM_REQUIRES_MEMBERSHIP") {
            Ok(raw) => raw.parse().map_err(|e| {
                anyhow::anyhow!("Invalid ROOM_REQUIRES_MEMBERSHIP {:?}: {}", raw, e)
            })?,
            Err(_) => false,
        };

        Ok(Config {
            bind_address,
            database_url,
            jwt_secret,
            db_timeout,
            room_requires_membership,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: SqlitePool,
    pub connections: Arc<ConnectionManager>,
    pub user_service: UserService,
    pub club_service: ClubService,
    pub membership_service: MembershipService,
    pub chat_gateway: ChatGateway,
}

impl AppState {
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let connections = Arc::new(ConnectionManager::new());
        let broadcaster: Arc<dyn Broadcaster> = connections.clone();

        let user_service = UserService::new(db.clone());
        let club_service = ClubService::new(db.clone());
        let membership_service = MembershipService::new(db.clone(), broadcaster.clone());
        let chat_gateway = ChatGateway::new(
            MessageService::new(db.clone()),
            membership_service.clone(),
            broadcaster,
        );

        Self {
            config,
            db,
            connections,
            user_service,
            club_service,
            membership_service,
            chat_gateway,
        }
    }
}
