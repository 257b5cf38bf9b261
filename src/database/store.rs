use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{Project, User, UserProfile, Workspace};

/// Result of an insert-or-update keyed by user id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub user: User,
    pub inserted: bool,
}

/// Persistence seam for the handlers. Every method is a single statement
/// against the backing store; ordering between concurrent calls for the same
/// id is whatever the store serialises them into.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, DatabaseError>;

    /// Fails with `Conflict` when the id already exists
    async fn insert_user(&self, profile: &UserProfile) -> Result<User, DatabaseError>;

    /// Overwrites email, name and image. `None` when no row has that id
    async fn update_user(&self, profile: &UserProfile) -> Result<Option<User>, DatabaseError>;

    async fn upsert_user(&self, profile: &UserProfile) -> Result<Upserted, DatabaseError>;

    /// Returns whether a row was removed
    async fn delete_user(&self, id: &str) -> Result<bool, DatabaseError>;

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, DatabaseError>;

    async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError>;
}
