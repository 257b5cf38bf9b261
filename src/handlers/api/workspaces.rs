use axum::extract::State;

use crate::database::models::Workspace;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/workspaces - all workspaces, newest first. An empty table is an empty array.
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Workspace>> {
    let workspaces = state.store.list_workspaces().await?;
    Ok(ApiResponse::success(workspaces))
}
