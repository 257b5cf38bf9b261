use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Project, User, UserProfile, Workspace};
use crate::database::store::{Store, Upserted};

/// In-process store with the same per-statement semantics as `PgStore`.
/// Used by tests and by development runs without `DATABASE_URL`.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    workspaces: RwLock<Vec<Workspace>>,
    projects: RwLock<Vec<Project>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the listing tables
    pub fn with_catalog(workspaces: Vec<Workspace>, projects: Vec<Project>) -> Self {
        Self {
            users: RwLock::default(),
            workspaces: RwLock::new(workspaces),
            projects: RwLock::new(projects),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn insert_user(&self, profile: &UserProfile) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.contains_key(&profile.id) {
            return Err(DatabaseError::Conflict(format!(
                "duplicate key value violates unique constraint \"users_pkey\" (id={})",
                profile.id
            )));
        }
        let user = User::from_profile(profile, Utc::now());
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<Option<User>, DatabaseError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&profile.id).map(|user| {
            user.apply(profile, Utc::now());
            user.clone()
        }))
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<Upserted, DatabaseError> {
        let mut users = self.users.write().await;
        let now = Utc::now();
        match users.get_mut(&profile.id) {
            Some(user) => {
                user.apply(profile, now);
                Ok(Upserted {
                    user: user.clone(),
                    inserted: false,
                })
            }
            None => {
                let user = User::from_profile(profile, now);
                users.insert(user.id.clone(), user.clone());
                Ok(Upserted {
                    user,
                    inserted: true,
                })
            }
        }
    }

    async fn delete_user(&self, id: &str) -> Result<bool, DatabaseError> {
        Ok(self.users.write().await.remove(id).is_some())
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, DatabaseError> {
        let mut rows = self.workspaces.read().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let mut rows = self.projects.read().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, name: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            email: Some(format!("{id}@example.com")),
            name: Some(name.to_string()),
            image: None,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let store = MemoryStore::new();
        store.insert_user(&profile("user_1", "Ada")).await.unwrap();
        let err = store.insert_user(&profile("user_1", "Ada")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.update_user(&profile("ghost", "Nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_overwrites_all_profile_fields() {
        let store = MemoryStore::new();
        store.insert_user(&profile("user_1", "Ada")).await.unwrap();

        let cleared = UserProfile {
            id: "user_1".to_string(),
            ..Default::default()
        };
        let user = store.update_user(&cleared).await.unwrap().unwrap();
        assert_eq!(user.email, None);
        assert_eq!(user.name, None);
        assert!(user.updated_at >= user.created_at);
    }

    #[tokio::test]
    async fn upsert_reports_insert_then_update() {
        let store = MemoryStore::new();
        let first = store.upsert_user(&profile("user_1", "Ada")).await.unwrap();
        assert!(first.inserted);
        let second = store.upsert_user(&profile("user_1", "Ada Lovelace")).await.unwrap();
        assert!(!second.inserted);
        assert_eq!(second.user.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(second.user.created_at, first.user.created_at);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = MemoryStore::new();
        store.insert_user(&profile("user_1", "Ada")).await.unwrap();
        assert!(store.delete_user("user_1").await.unwrap());
        assert!(!store.delete_user("user_1").await.unwrap());
    }

    #[tokio::test]
    async fn empty_catalog_lists_nothing() {
        let store = MemoryStore::new();
        assert!(store.list_workspaces().await.unwrap().is_empty());
        assert!(store.list_projects().await.unwrap().is_empty());
    }
}
