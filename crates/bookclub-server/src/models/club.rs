use bookclub_protocol::{ClubData, RoleData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Full name of the main admin, refreshed on ownership transfer
    pub admin_name: String,
    pub main_admin_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Club {
    pub fn is_main_admin(&self, user_id: Uuid) -> bool {
        self.main_admin_id == user_id
    }

    pub fn into_data(self, roles: Vec<RoleAssignment>) -> ClubData {
        ClubData {
            id: self.id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            admin_name: self.admin_name,
            main_admin_id: self.main_admin_id,
            roles: roles.into_iter().map(RoleData::from).collect(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl From<Role> for bookclub_protocol::Role {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => bookclub_protocol::Role::Admin,
            Role::Member => bookclub_protocol::Role::Member,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleAssignment {
    pub club_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub position: i64,
}

impl From<RoleAssignment> for RoleData {
    fn from(assignment: RoleAssignment) -> Self {
        RoleData {
            user_id: assignment.user_id,
            role: assignment.role.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateClub {
    /// Missing and blank names are both rejected by the club directory
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}
