use crate::db;
use crate::models::{Club, CreateClub, CreateUser, User};
use crate::services::club::ClubService;
use crate::services::user::UserService;
use sqlx::SqlitePool;
use std::time::Duration;

/// Fresh in-memory database with the schema applied
pub struct TestDb {
    pub pool: SqlitePool,
}

impl TestDb {
    pub async fn new() -> Self {
        let pool = db::init_pool("sqlite::memory:", Duration::from_secs(5))
            .await
            .expect("in-memory pool");
        db::run_migrations(&pool).await.expect("migrations");
        Self { pool }
    }

    pub async fn user(&self, first_name: &str, last_name: &str) -> User {
        UserService::new(self.pool.clone())
            .create(CreateUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: format!(
                    "{}.{}@example.com",
                    first_name.to_lowercase(),
                    uuid::Uuid::new_v4().simple()
                ),
                avatar_url: None,
                location: Some("Lisbon".to_string()),
            })
            .await
            .expect("create user")
    }

    pub async fn club(&self, creator: &User, name: &str) -> Club {
        ClubService::new(self.pool.clone())
            .create(
                creator,
                CreateClub {
                    name: name.to_string(),
                    description: None,
                    image_url: None,
                },
            )
            .await
            .expect("create club")
    }
}
