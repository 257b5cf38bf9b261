use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Verified session attached to the request by `session_auth_middleware`
#[derive(Clone, Debug, Serialize)]
pub struct AuthSession {
    pub user_id: String,
    pub session_id: Option<String>,
    pub org_id: Option<String>,
}

impl From<Claims> for AuthSession {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            session_id: claims.sid,
            org_id: claims.org_id,
        }
    }
}

/// Session middleware applied to every route. Requests without a bearer
/// token pass through anonymously; a token that fails verification ends the
/// request with 401 before any handler runs.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(&headers).map_err(ApiError::unauthorized)? else {
        return Ok(next.run(request).await);
    };

    let verifier = state
        .sessions
        .as_ref()
        .ok_or_else(|| ApiError::unauthorized("Session verification is not configured"))?;

    let claims = verifier.verify(&token)?;
    tracing::debug!(user_id = %claims.sub, "Authenticated session");

    request.extensions_mut().insert(AuthSession::from(claims));
    Ok(next.run(request).await)
}

/// Bearer token from the Authorization header, `Ok(None)` when the header is absent
fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

/// Handlers that take `AuthSession` require a verified session
#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
