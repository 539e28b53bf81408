use crate::db;
use crate::error::{AppError, Result};
use crate::models::{CreateUser, User};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Read side of the identity provider: user id to identity attributes.
#[derive(Clone)]
pub struct UserService {
    db: SqlitePool,
}

impl UserService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Provision an account record. Signup itself lives with the identity provider.
    pub async fn create(&self, input: CreateUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, first_name, last_name, email, avatar_url, location, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, first_name, last_name, email, avatar_url, location, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.avatar_url)
        .bind(&input.location)
        .bind(db::timestamp(&db::now()))
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("Email already registered".to_string())
            }
            other => AppError::Database(other),
        })?;

        tracing::info!("Provisioned user {} ({})", user.id, user.full_name());
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, avatar_url, location, created_at
            FROM users WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
