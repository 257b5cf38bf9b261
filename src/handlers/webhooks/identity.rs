// handlers/webhooks/identity.rs - POST /api/webhooks/identity
//
// Receives user lifecycle events from the identity provider. The raw body is
// needed for signature verification, so it is taken as bytes and decoded
// only after the signature checks out.

use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use tracing::{debug, warn};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SyncOutcome;
use crate::state::AppState;
use crate::webhooks::{self, Delivery};

#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SyncOutcome>,
    pub ignored: bool,
}

/// Verify, decode, and apply exactly one mutation. A non-2xx answer makes the
/// provider redeliver; nothing here retries.
pub async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> ApiResult<Acknowledgement> {
    if let Some(verifier) = state.webhooks.as_deref() {
        verifier.verify(&headers, &body)?;
    }

    match webhooks::decode(&body)? {
        Delivery::Ignored { event_type } => {
            debug!(event = %event_type, "Ignoring unsubscribed identity event");
            Ok(ApiResponse::success(Acknowledgement {
                event: event_type,
                user_id: None,
                outcome: None,
                ignored: true,
            }))
        }
        Delivery::User { kind, profile } => {
            let outcome = state.sync.apply(kind, &profile).await.map_err(|e| {
                warn!(event = kind.as_str(), user_id = %profile.id, "Identity sync failed: {}", e);
                e
            })?;

            Ok(ApiResponse::success(Acknowledgement {
                event: kind.as_str().to_string(),
                user_id: Some(profile.id),
                outcome: Some(outcome),
                ignored: false,
            }))
        }
    }
}
