//! Identity-provider event envelope and the user payload it carries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::database::models::UserProfile;

/// The user lifecycle events this service reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "user.created")]
    UserCreated,
    #[serde(rename = "user.updated")]
    UserUpdated,
    #[serde(rename = "user.deleted")]
    UserDeleted,
}

impl EventKind {
    /// Accepts `user.created` as well as a source-prefixed `clerk/user.created`
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.rsplit_once('/').map_or(name, |(_, rest)| rest);
        match name {
            "user.created" => Some(EventKind::UserCreated),
            "user.updated" => Some(EventKind::UserUpdated),
            "user.deleted" => Some(EventKind::UserDeleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::UserCreated => "user.created",
            EventKind::UserUpdated => "user.updated",
            EventKind::UserDeleted => "user.deleted",
        }
    }
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event payload: {0}")]
    InvalidJson(String),

    #[error("{0} event is missing data.id")]
    MissingId(&'static str),
}

/// Envelope as delivered. `type` is the webhook field name, `name` the
/// event-bus one.
#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type", alias = "name")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailAddress {
    pub email_address: Option<String>,
}

/// The `data` object of a user event. Everything but the id is optional and
/// missing fields end up as nulls in storage.
#[derive(Debug, Default, Deserialize)]
pub struct UserData {
    pub id: Option<String>,
    pub email_addresses: Option<Vec<EmailAddress>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

impl UserData {
    pub fn into_profile(self, kind: EventKind) -> Result<UserProfile, EventError> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(EventError::MissingId(kind.as_str()))?;

        let email = self
            .email_addresses
            .and_then(|addresses| addresses.into_iter().next())
            .and_then(|first| first.email_address);

        Ok(UserProfile {
            id,
            email,
            name: display_name(self.first_name.as_deref(), self.last_name.as_deref()),
            image: self.image_url,
        })
    }
}

/// Given and family name joined by a space; absent or blank parts are skipped
pub fn display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// A decoded delivery
#[derive(Debug)]
pub enum Delivery {
    User { kind: EventKind, profile: UserProfile },
    /// An event type nobody subscribes to; acknowledged and dropped
    Ignored { event_type: String },
}

/// Decode a raw webhook body into the event it carries
pub fn decode(body: &[u8]) -> Result<Delivery, EventError> {
    let event: IdentityEvent =
        serde_json::from_slice(body).map_err(|e| EventError::InvalidJson(e.to_string()))?;

    let Some(kind) = EventKind::parse(&event.event_type) else {
        return Ok(Delivery::Ignored {
            event_type: event.event_type,
        });
    };

    let data: UserData = match event.data {
        Value::Null => UserData::default(),
        value => serde_json::from_value(value).map_err(|e| EventError::InvalidJson(e.to_string()))?,
    };

    Ok(Delivery::User {
        kind,
        profile: data.into_profile(kind)?,
    })
}
