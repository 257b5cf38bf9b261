use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Local mirror of an identity-provider user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The provider-derived fields written on create and overwritten on update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl User {
    /// Fresh row for a profile, timestamps set to `now`
    pub fn from_profile(profile: &UserProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: profile.id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            image: profile.image.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Full overwrite of the provider-derived fields
    pub fn apply(&mut self, profile: &UserProfile, now: DateTime<Utc>) {
        self.email = profile.email.clone();
        self.name = profile.name.clone();
        self.image = profile.image.clone();
        self.updated_at = now;
    }
}
