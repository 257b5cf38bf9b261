use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Row};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Project, User, UserProfile, Workspace};
use crate::database::repository::Repository;
use crate::database::store::{Store, Upserted};

const USER_COLUMNS: &str = "id, email, name, image, created_at, updated_at";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, profile: &UserProfile) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (id, email, name, image) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&profile.id)
            .bind(&profile.email)
            .bind(&profile.name)
            .bind(&profile.image)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "UPDATE users SET email = $2, name = $3, image = $4, updated_at = NOW()
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&profile.id)
            .bind(&profile.email)
            .bind(&profile.name)
            .bind(&profile.image)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<Upserted, DatabaseError> {
        // xmax is 0 only for a freshly inserted tuple
        let sql = format!(
            "INSERT INTO users (id, email, name, image) VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                updated_at = NOW()
             RETURNING {USER_COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query(&sql)
            .bind(&profile.id)
            .bind(&profile.email)
            .bind(&profile.name)
            .bind(&profile.image)
            .fetch_one(&self.pool)
            .await?;

        let user = User::from_row(&row)?;
        let inserted: bool = row.try_get("inserted")?;
        Ok(Upserted { user, inserted })
    }

    async fn delete_user(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, DatabaseError> {
        Repository::<Workspace>::new("workspaces", self.pool.clone())
            .select_all()
            .await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        Repository::<Project>::new("projects", self.pool.clone())
            .select_all()
            .await
    }
}
