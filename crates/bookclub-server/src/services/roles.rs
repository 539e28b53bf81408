use crate::error::Result;
use crate::models::{Role, RoleAssignment};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Persisted role list of each club plus its main admin.
///
/// Every operation is scoped to one club. Writes are visible to the next read
/// on the same pool; callers that read-decide-write hold the club's lock.
#[derive(Clone)]
pub struct RoleStore {
    db: SqlitePool,
}

impl RoleStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn find_role(&self, club_id: Uuid, user_id: Uuid) -> Result<Option<RoleAssignment>> {
        let assignment = sqlx::query_as::<_, RoleAssignment>(
            r#"
            SELECT club_id, user_id, role, position
            FROM club_roles WHERE club_id = ? AND user_id = ?
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(assignment)
    }

    pub async fn add_role(&self, club_id: Uuid, role: Role, user_id: Uuid) -> Result<RoleAssignment> {
        let assignment = sqlx::query_as::<_, RoleAssignment>(
            r#"
            INSERT INTO club_roles (club_id, user_id, role)
            VALUES (?, ?, ?)
            RETURNING club_id, user_id, role, position
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.db)
        .await?;

        Ok(assignment)
    }

    /// Returns false if the user had no assignment.
    pub async fn remove_role(&self, club_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM club_roles WHERE club_id = ? AND user_id = ?")
            .bind(club_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false if the user had no assignment.
    pub async fn set_role(&self, club_id: Uuid, user_id: Uuid, role: Role) -> Result<bool> {
        let result = sqlx::query("UPDATE club_roles SET role = ? WHERE club_id = ? AND user_id = ?")
            .bind(role)
            .bind(club_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_roles(&self, club_id: Uuid) -> Result<Vec<RoleAssignment>> {
        let roles = sqlx::query_as::<_, RoleAssignment>(
            r#"
            SELECT club_id, user_id, role, position
            FROM club_roles WHERE club_id = ?
            ORDER BY position
            "#,
        )
        .bind(club_id)
        .fetch_all(&self.db)
        .await?;

        Ok(roles)
    }

    /// Hand the club to a new main admin and make sure they hold `admin`.
    ///
    /// An existing assignment keeps its position; the previous main admin's
    /// assignment is not touched.
    pub async fn set_main_admin(&self, club_id: Uuid, user_id: Uuid, admin_name: &str) -> Result<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE clubs SET main_admin_id = ?, admin_name = ? WHERE id = ?")
            .bind(user_id)
            .bind(admin_name)
            .bind(club_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO club_roles (club_id, user_id, role)
            VALUES (?, ?, ?)
            ON CONFLICT (club_id, user_id) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(club_id)
        .bind(user_id)
        .bind(Role::Admin)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::TestDb;

    #[tokio::test]
    async fn removal_keeps_survivor_order() {
        let db = TestDb::new().await;
        let alice = db.user("Alice", "Lee").await;
        let bob = db.user("Bob", "Tan").await;
        let cara = db.user("Cara", "Diaz").await;
        let club = db.club(&alice, "Fiction Fans").await;
        let roles = RoleStore::new(db.pool.clone());

        roles.add_role(club.id, Role::Member, bob.id).await.unwrap();
        roles.add_role(club.id, Role::Member, cara.id).await.unwrap();
        assert!(roles.remove_role(club.id, bob.id).await.unwrap());
        assert!(!roles.remove_role(club.id, bob.id).await.unwrap());

        let users: Vec<Uuid> = roles
            .list_roles(club.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(users, vec![alice.id, cara.id]);
    }

    #[tokio::test]
    async fn duplicate_assignment_is_rejected_by_the_store() {
        let db = TestDb::new().await;
        let alice = db.user("Alice", "Lee").await;
        let club = db.club(&alice, "Fiction Fans").await;
        let roles = RoleStore::new(db.pool.clone());

        let result = roles.add_role(club.id, Role::Member, alice.id).await;
        assert!(result.is_err());
        assert_eq!(roles.list_roles(club.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_role_reads_back_immediately() {
        let db = TestDb::new().await;
        let alice = db.user("Alice", "Lee").await;
        let bob = db.user("Bob", "Tan").await;
        let club = db.club(&alice, "Fiction Fans").await;
        let roles = RoleStore::new(db.pool.clone());

        roles.add_role(club.id, Role::Member, bob.id).await.unwrap();
        assert!(roles.set_role(club.id, bob.id, Role::Admin).await.unwrap());

        let found = roles.find_role(club.id, bob.id).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
    }

    #[tokio::test]
    async fn set_main_admin_upserts_without_moving_position() {
        let db = TestDb::new().await;
        let alice = db.user("Alice", "Lee").await;
        let bob = db.user("Bob", "Tan").await;
        let club = db.club(&alice, "Fiction Fans").await;
        let roles = RoleStore::new(db.pool.clone());

        let before = roles.add_role(club.id, Role::Member, bob.id).await.unwrap();
        roles
            .set_main_admin(club.id, bob.id, &bob.full_name())
            .await
            .unwrap();

        let after = roles.find_role(club.id, bob.id).await.unwrap().unwrap();
        assert_eq!(after.role, Role::Admin);
        assert_eq!(after.position, before.position);

        let alice_role = roles.find_role(club.id, alice.id).await.unwrap().unwrap();
        assert_eq!(alice_role.role, Role::Admin);
    }
}
