use bookclub_protocol::UserData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// "First Last", the name clubs display for their main admin
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        UserData {
            name: user.full_name(),
            id: user.id,
            email: user.email,
            avatar_url: user.avatar_url,
            location: user.location,
        }
    }
}

/// Account provisioning input, used by the identity provider side
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
}
