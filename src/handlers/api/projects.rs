use axum::extract::State;

use crate::database::models::Project;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/projects - all projects across every workspace
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Project>> {
    let projects = state.store.list_projects().await?;
    Ok(ApiResponse::success(projects))
}
