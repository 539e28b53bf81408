use crate::db;
use crate::error::{AppError, MembershipError, Result};
use crate::models::{Club, CreateClub, Role, User};
use crate::services::roles::RoleStore;
use bookclub_protocol::ClubData;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ClubService {
    db: SqlitePool,
    roles: RoleStore,
}

impl ClubService {
    pub fn new(db: SqlitePool) -> Self {
        let roles = RoleStore::new(db.clone());
        Self { db, roles }
    }

    /// Create a club with `creator` as its main admin, seeded with role=admin.
    pub async fn create(&self, creator: &User, input: CreateClub) -> Result<Club> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Club name is required".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let club = sqlx::query_as::<_, Club>(
            r#"
            INSERT INTO clubs (id, name, description, image_url, admin_name, main_admin_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, description, image_url, admin_name, main_admin_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(creator.full_name())
        .bind(creator.id)
        .bind(db::timestamp(&db::now()))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO club_roles (club_id, user_id, role) VALUES (?, ?, ?)")
            .bind(club.id)
            .bind(creator.id)
            .bind(Role::Admin)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Club {} ({}) created by {}", club.id, club.name, creator.id);
        Ok(club)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Club>> {
        let club = sqlx::query_as::<_, Club>(
            r#"
            SELECT id, name, description, image_url, admin_name, main_admin_id, created_at
            FROM clubs WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(club)
    }

    pub async fn get(&self, id: Uuid) -> Result<Club> {
        self.find(id)
            .await?
            .ok_or_else(|| MembershipError::ClubNotFound.into())
    }

    pub async fn list(&self) -> Result<Vec<Club>> {
        let clubs = sqlx::query_as::<_, Club>(
            r#"
            SELECT id, name, description, image_url, admin_name, main_admin_id, created_at
            FROM clubs ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(clubs)
    }

    /// Club record with its current role list
    pub async fn snapshot(&self, id: Uuid) -> Result<ClubData> {
        let club = self.get(id).await?;
        let roles = self.roles.list_roles(id).await?;
        Ok(club.into_data(roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::TestDb;

    #[tokio::test]
    async fn creator_becomes_main_admin() {
        let db = TestDb::new().await;
        let alice = db.user("Alice", "Lee").await;
        let clubs = ClubService::new(db.pool.clone());

        let club = clubs
            .create(
                &alice,
                CreateClub {
                    name: "Fiction Fans".to_string(),
                    description: Some("Novels, mostly".to_string()),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let snapshot = clubs.snapshot(club.id).await.unwrap();
        assert_eq!(snapshot.admin_name, "Alice Lee");
        assert_eq!(snapshot.main_admin_id, alice.id);
        assert_eq!(
            snapshot.role_of(alice.id),
            Some(bookclub_protocol::Role::Admin)
        );
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let db = TestDb::new().await;
        let alice = db.user("Alice", "Lee").await;
        let clubs = ClubService::new(db.pool.clone());

        let result = clubs
            .create(
                &alice,
                CreateClub {
                    name: "   ".to_string(),
                    description: None,
                    image_url: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(clubs.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_club_is_not_found() {
        let db = TestDb::new().await;
        let clubs = ClubService::new(db.pool.clone());

        let result = clubs.snapshot(Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(AppError::Membership(MembershipError::ClubNotFound))
        ));
    }
}
