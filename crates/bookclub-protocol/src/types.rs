use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rank of a user inside a club. There are exactly two.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

/// Identity attributes of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
}

/// One entry of a club's role list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleData {
    pub user_id: Uuid,
    pub role: Role,
}

/// Club snapshot returned by every membership mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubData {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub admin_name: String,
    pub main_admin_id: Uuid,
    pub roles: Vec<RoleData>,
    #[serde(with = "crate::time")]
    pub created_at: DateTime<Utc>,
}

impl ClubData {
    pub fn role_of(&self, user_id: Uuid) -> Option<Role> {
        self.roles
            .iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.role)
    }
}

/// Member list entry: a role assignment joined with identity attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberData {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub role: Role,
}

/// Chat message as seen by clients, both over REST and in realtime events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageData {
    pub id: Uuid,
    pub club_id: Uuid,
    pub text: String,
    pub sender_id: Uuid,
    pub sender_display_name: String,
    pub sender_avatar_url: Option<String>,
    #[serde(with = "crate::time")]
    pub timestamp: DateTime<Utc>,
}
