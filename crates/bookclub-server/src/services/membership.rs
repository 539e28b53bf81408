//! Who may join, leave, promote, demote, remove and transfer a club.
//!
//! Every mutation takes the club's lock for its whole read/decide/write
//! sequence, and every rejection happens before the first write. The main
//! admin is identified by user id; `admin_name` on the club is only the
//! display form of that identity.

use crate::error::{MembershipError, Result};
use crate::models::{Club, Role, User};
use crate::services::club::ClubService;
use crate::services::locks::{ClubGuard, ClubLocks};
use crate::services::roles::RoleStore;
use crate::services::user::UserService;
use crate::ws::Broadcaster;
use bookclub_protocol::{ClubData, MemberData, ServerMessage};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct MemberRow {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    avatar_url: Option<String>,
    location: Option<String>,
    role: Role,
}

impl From<MemberRow> for MemberData {
    fn from(row: MemberRow) -> Self {
        MemberData {
            user_id: row.user_id,
            name: format!("{} {}", row.first_name, row.last_name),
            email: row.email,
            avatar_url: row.avatar_url,
            location: row.location,
            role: row.role.into(),
        }
    }
}

#[derive(Clone)]
pub struct MembershipService {
    db: SqlitePool,
    clubs: ClubService,
    roles: RoleStore,
    users: UserService,
    broadcaster: Arc<dyn Broadcaster>,
    locks: ClubLocks,
}

impl MembershipService {
    pub fn new(db: SqlitePool, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            clubs: ClubService::new(db.clone()),
            roles: RoleStore::new(db.clone()),
            users: UserService::new(db.clone()),
            db,
            broadcaster,
            locks: ClubLocks::new(),
        }
    }

    async fn resolve(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| MembershipError::UserNotFound.into())
    }

    async fn ensure_admin(&self, club_id: Uuid, user_id: Uuid) -> Result<()> {
        match self.roles.find_role(club_id, user_id).await? {
            Some(assignment) if assignment.role == Role::Admin => Ok(()),
            _ => Err(MembershipError::NotClubAdmin.into()),
        }
    }

    /// Lock an existing club and read it fresh under the lock. Unknown clubs
    /// are rejected before a lock entry is created for them.
    async fn lock_club(&self, club_id: Uuid) -> Result<(ClubGuard, Club)> {
        self.clubs.get(club_id).await?;
        let guard = self.locks.lock(club_id).await;
        let club = self.clubs.get(club_id).await?;
        Ok((guard, club))
    }

    /// Any existing club, for callers outside the membership authority
    pub async fn club(&self, club_id: Uuid) -> Result<Club> {
        self.clubs.get(club_id).await
    }

    async fn snapshot(&self, club: Club) -> Result<ClubData> {
        let roles = self.roles.list_roles(club.id).await?;
        Ok(club.into_data(roles))
    }

    pub async fn role_of(&self, club_id: Uuid, user_id: Uuid) -> Result<Option<Role>> {
        Ok(self
            .roles
            .find_role(club_id, user_id)
            .await?
            .map(|assignment| assignment.role))
    }

    /// Guard for member-only routes
    pub async fn require_member(&self, club_id: Uuid, user_id: Uuid) -> Result<Role> {
        self.clubs.get(club_id).await?;
        self.role_of(club_id, user_id)
            .await?
            .ok_or_else(|| MembershipError::NotClubMember.into())
    }

    /// Guard for admin-only routes
    pub async fn require_admin(&self, club_id: Uuid, user_id: Uuid) -> Result<()> {
        self.clubs.get(club_id).await?;
        self.ensure_admin(club_id, user_id).await
    }

    pub async fn join(&self, club_id: Uuid, user_id: Uuid) -> Result<ClubData> {
        let (snapshot, user) = {
            let (_guard, club) = self.lock_club(club_id).await?;
            let user = self.resolve(user_id).await?;

            if self.roles.find_role(club_id, user_id).await?.is_some() {
                return Err(MembershipError::AlreadyMember.into());
            }

            self.roles.add_role(club_id, Role::Member, user_id).await?;
            (self.snapshot(club).await?, user)
        };

        tracing::info!("User {} joined club {}", user_id, club_id);

        // Best effort: the join already happened
        let event = ServerMessage::MemberJoined {
            club_id,
            user_id,
            name: user.full_name(),
        };
        if let Err(e) = self.broadcaster.broadcast(club_id, &event).await {
            tracing::warn!("Failed to announce {} joining club {}: {}", user_id, club_id, e);
        }

        Ok(snapshot)
    }

    pub async fn leave(&self, club_id: Uuid, user_id: Uuid) -> Result<ClubData> {
        let (_guard, club) = self.lock_club(club_id).await?;
        if club.is_main_admin(user_id) {
            return Err(MembershipError::MainAdminCannotLeave.into());
        }

        if !self.roles.remove_role(club_id, user_id).await? {
            return Err(MembershipError::NotAMember.into());
        }

        tracing::info!("User {} left club {}", user_id, club_id);
        self.snapshot(club).await
    }

    /// Promote a member to admin. An admin target is not a member and fails.
    pub async fn promote(&self, club_id: Uuid, acting_user_id: Uuid, target_user_id: Uuid) -> Result<ClubData> {
        let (_guard, club) = self.lock_club(club_id).await?;
        self.ensure_admin(club_id, acting_user_id).await?;

        match self.roles.find_role(club_id, target_user_id).await? {
            Some(assignment) if assignment.role == Role::Member => {}
            _ => return Err(MembershipError::MemberNotFound.into()),
        }

        self.roles.set_role(club_id, target_user_id, Role::Admin).await?;

        tracing::info!(
            "User {} promoted {} to admin in club {}",
            acting_user_id,
            target_user_id,
            club_id
        );
        self.snapshot(club).await
    }

    pub async fn demote(&self, club_id: Uuid, acting_user_id: Uuid, target_user_id: Uuid) -> Result<ClubData> {
        let (_guard, club) = self.lock_club(club_id).await?;
        self.ensure_admin(club_id, acting_user_id).await?;
        let target = self.resolve(target_user_id).await?;

        if club.is_main_admin(target.id) {
            return Err(MembershipError::CannotDemoteMainAdmin.into());
        }

        match self.roles.find_role(club_id, target.id).await? {
            Some(assignment) if assignment.role == Role::Admin => {}
            _ => return Err(MembershipError::AdminNotFound.into()),
        }

        self.roles.set_role(club_id, target.id, Role::Member).await?;

        tracing::info!(
            "User {} demoted {} to member in club {}",
            acting_user_id,
            target.id,
            club_id
        );
        self.snapshot(club).await
    }

    pub async fn remove(&self, club_id: Uuid, acting_user_id: Uuid, target_user_id: Uuid) -> Result<ClubData> {
        let (_guard, club) = self.lock_club(club_id).await?;
        self.ensure_admin(club_id, acting_user_id).await?;
        let target = self.resolve(target_user_id).await?;

        if club.is_main_admin(target.id) {
            return Err(MembershipError::CannotRemoveMainAdmin.into());
        }

        if !self.roles.remove_role(club_id, target.id).await? {
            return Err(MembershipError::MemberNotFound.into());
        }

        tracing::info!(
            "User {} removed {} from club {}",
            acting_user_id,
            target.id,
            club_id
        );
        self.snapshot(club).await
    }

    /// Make `new_admin_user_id` the main admin. The outgoing main admin keeps
    /// whatever role assignment they had.
    pub async fn transfer_ownership(
        &self,
        club_id: Uuid,
        acting_user_id: Uuid,
        new_admin_user_id: Uuid,
    ) -> Result<ClubData> {
        let (_guard, club) = self.lock_club(club_id).await?;
        if !club.is_main_admin(acting_user_id) {
            return Err(MembershipError::NotMainAdmin.into());
        }

        let new_admin = self.resolve(new_admin_user_id).await?;
        self.roles
            .set_main_admin(club_id, new_admin.id, &new_admin.full_name())
            .await?;

        tracing::info!(
            "Club {} transferred from {} to {}",
            club_id,
            acting_user_id,
            new_admin.id
        );

        let club = self.clubs.get(club_id).await?;
        self.snapshot(club).await
    }

    /// Role list joined with identity attributes, in role-list order
    pub async fn list_members(&self, club_id: Uuid) -> Result<Vec<MemberData>> {
        self.clubs.get(club_id).await?;

        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT r.user_id, u.first_name, u.last_name, u.email, u.avatar_url, u.location, r.role
            FROM club_roles r
            INNER JOIN users u ON u.id = r.user_id
            WHERE r.club_id = ?
            ORDER BY r.position
            "#,
        )
        .bind(club_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(MemberData::from).collect())
    }
}
