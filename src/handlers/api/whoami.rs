// handlers/api/whoami.rs - GET /api/auth/whoami

use axum::extract::State;
use serde::Serialize;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthSession};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub session: AuthSession,
    /// Local mirror of the session's user; null until the created event has been synced
    pub user: Option<User>,
}

/// Requires a verified session (401 otherwise)
pub async fn whoami(State(state): State<AppState>, session: AuthSession) -> ApiResult<WhoAmI> {
    let user = state.store.find_user(&session.user_id).await?;
    Ok(ApiResponse::success(WhoAmI { session, user }))
}
