//! Bearer token authentication with a role allow-list per route group.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use model::entities::user::UserRole;
use tracing::{debug, trace};

use crate::auth::{session::verify_session_token, CurrentUser};
use crate::errors::ApiError;
use crate::schemas::AppState;

/// Routes only super admins may call.
pub async fn require_super_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request = authorize(&state, request, &[UserRole::SuperAdmin])?;
    Ok(next.run(request).await)
}

/// Routes any signed-in user may call.
pub async fn require_member(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request = authorize(&state, request, &[UserRole::SuperAdmin, UserRole::User])?;
    Ok(next.run(request).await)
}

fn authorize(state: &AppState, mut request: Request, allowed: &[UserRole]) -> Result<Request, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing or malformed authorization header".to_string()))?;

    let current = verify_session_token(token, &state.config)?;
    if !allowed.contains(&current.role) {
        debug!(user_id = current.id, role = current.role.as_str(), "Role not allowed on route");
        return Err(ApiError::Forbidden("Insufficient role for this resource".to_string()));
    }

    trace!(user_id = current.id, "Request authenticated");
    request.extensions_mut().insert::<CurrentUser>(current);
    Ok(request)
}
