use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::SyncMode;
use crate::database::models::UserProfile;
use crate::database::{DatabaseError, Store};
use crate::webhooks::EventKind;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// What a handler did to the users table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Inserted,
    Updated,
    Deleted,
    /// Delete of an id that was not stored (idempotent mode only)
    AlreadyAbsent,
}

/// Applies user lifecycle events to the store, one statement per event
pub struct UserSyncService {
    store: Arc<dyn Store>,
    mode: SyncMode,
}

impl UserSyncService {
    pub fn new(store: Arc<dyn Store>, mode: SyncMode) -> Self {
        Self { store, mode }
    }

    pub async fn apply(&self, kind: EventKind, profile: &UserProfile) -> Result<SyncOutcome, SyncError> {
        let outcome = match kind {
            EventKind::UserCreated => self.created(profile).await,
            EventKind::UserUpdated => self.updated(profile).await,
            EventKind::UserDeleted => self.deleted(&profile.id).await,
        }?;

        info!(
            event = kind.as_str(),
            user_id = %profile.id,
            outcome = ?outcome,
            mode = ?self.mode,
            "Applied identity event"
        );
        Ok(outcome)
    }

    /// Strict: insert, failing on an existing id. Idempotent: upsert.
    pub async fn created(&self, profile: &UserProfile) -> Result<SyncOutcome, SyncError> {
        match self.mode {
            SyncMode::Strict => match self.store.insert_user(profile).await {
                Ok(_) => Ok(SyncOutcome::Inserted),
                Err(DatabaseError::Conflict(_)) => Err(SyncError::AlreadyExists(profile.id.clone())),
                Err(e) => Err(e.into()),
            },
            SyncMode::Idempotent => self.upsert(profile).await,
        }
    }

    /// Strict: overwrite, failing on a missing id. Idempotent: upsert.
    pub async fn updated(&self, profile: &UserProfile) -> Result<SyncOutcome, SyncError> {
        match self.mode {
            SyncMode::Strict => match self.store.update_user(profile).await? {
                Some(_) => Ok(SyncOutcome::Updated),
                None => Err(SyncError::NotFound(profile.id.clone())),
            },
            SyncMode::Idempotent => self.upsert(profile).await,
        }
    }

    /// Strict: a missing id is an error. Idempotent: a missing id is already the desired state.
    pub async fn deleted(&self, id: &str) -> Result<SyncOutcome, SyncError> {
        let removed = self.store.delete_user(id).await?;
        match (removed, self.mode) {
            (true, _) => Ok(SyncOutcome::Deleted),
            (false, SyncMode::Idempotent) => Ok(SyncOutcome::AlreadyAbsent),
            (false, SyncMode::Strict) => Err(SyncError::NotFound(id.to_string())),
        }
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<SyncOutcome, SyncError> {
        let upserted = self.store.upsert_user(profile).await?;
        Ok(if upserted.inserted {
            SyncOutcome::Inserted
        } else {
            SyncOutcome::Updated
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service(mode: SyncMode) -> (UserSyncService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (UserSyncService::new(store.clone(), mode), store)
    }

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            id: "user_2abc".to_string(),
            email: Some("ada@example.com".to_string()),
            name: Some(name.to_string()),
            image: Some("https://img.example.com/ada.png".to_string()),
        }
    }

    #[tokio::test]
    async fn create_then_update_reads_back_updated_fields() {
        for mode in [SyncMode::Strict, SyncMode::Idempotent] {
            let (sync, store) = service(mode);
            sync.created(&profile("Ada")).await.unwrap();

            let changed = UserProfile {
                email: Some("countess@example.com".to_string()),
                image: None,
                ..profile("Ada Lovelace")
            };
            assert_eq!(sync.updated(&changed).await.unwrap(), SyncOutcome::Updated);

            let user = store.find_user("user_2abc").await.unwrap().unwrap();
            assert_eq!(user.email.as_deref(), Some("countess@example.com"));
            assert_eq!(user.name.as_deref(), Some("Ada Lovelace"));
            assert_eq!(user.image, None);
        }
    }

    #[tokio::test]
    async fn strict_create_twice_fails() {
        let (sync, _) = service(SyncMode::Strict);
        assert_eq!(sync.created(&profile("Ada")).await.unwrap(), SyncOutcome::Inserted);
        let err = sync.created(&profile("Ada")).await.unwrap_err();
        assert!(matches!(err, SyncError::AlreadyExists(id) if id == "user_2abc"));
    }

    #[tokio::test]
    async fn strict_update_of_missing_user_fails() {
        let (sync, store) = service(SyncMode::Strict);
        let err = sync.updated(&profile("Ada")).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
        assert!(store.find_user("user_2abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn strict_delete_of_missing_user_fails() {
        let (sync, _) = service(SyncMode::Strict);
        let err = sync.deleted("user_missing").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(id) if id == "user_missing"));
    }

    #[tokio::test]
    async fn idempotent_redelivery_is_a_no_op() {
        let (sync, store) = service(SyncMode::Idempotent);
        assert_eq!(sync.created(&profile("Ada")).await.unwrap(), SyncOutcome::Inserted);
        assert_eq!(sync.created(&profile("Ada")).await.unwrap(), SyncOutcome::Updated);

        assert_eq!(sync.deleted("user_2abc").await.unwrap(), SyncOutcome::Deleted);
        assert_eq!(sync.deleted("user_2abc").await.unwrap(), SyncOutcome::AlreadyAbsent);
        assert!(store.find_user("user_2abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn idempotent_update_before_create_inserts() {
        let (sync, store) = service(SyncMode::Idempotent);
        assert_eq!(sync.updated(&profile("Ada")).await.unwrap(), SyncOutcome::Inserted);
        assert!(store.find_user("user_2abc").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn apply_dispatches_by_kind() {
        let (sync, store) = service(SyncMode::Strict);
        let p = profile("Ada");
        assert_eq!(sync.apply(EventKind::UserCreated, &p).await.unwrap(), SyncOutcome::Inserted);
        assert_eq!(sync.apply(EventKind::UserUpdated, &p).await.unwrap(), SyncOutcome::Updated);
        assert_eq!(sync.apply(EventKind::UserDeleted, &p).await.unwrap(), SyncOutcome::Deleted);
        assert!(store.find_user("user_2abc").await.unwrap().is_none());
    }
}
