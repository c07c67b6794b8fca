use axum::{extract::State, http::StatusCode, response::Json, Extension};
use chrono::{Duration, Utc};
use compute::permissions::resolve_user_permissions;
use model::entities::user::{self, UserRole};
use sea_orm::{ActiveModelTrait, ColumnTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{
    password::{generate_otp, hash_password, verify_password},
    session::create_session_token,
    CurrentUser,
};
use crate::errors::{ApiError, ApiResult};
use crate::handlers::users::{PermissionsResponse, UserResponse};
use crate::helpers::ValidatedJson;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for self-registration
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct OtpRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct OtpVerifyRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(equal = 6, message = "One-time password must have 6 digits"))]
    pub otp: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_live_user_by_email(state: &AppState, email: &str) -> ApiResult<Option<user::Model>> {
    Ok(user::Entity::find_active()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?)
}

/// Register a new account with the `user` role
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    trace!("Entering register function");
    let email = normalize_email(&request.email);

    if find_live_user_by_email(&state, &email).await?.is_some() {
        warn!("Registration attempted with an existing email");
        return Err(ApiError::Conflict("Email is already registered".to_string()));
    }

    let created = user::ActiveModel {
        name: Set(request.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(hash_password(&request.password)?),
        role: Set(UserRole::User),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User registered with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResponse::from(created), "Registration successful")),
    ))
}

/// Exchange credentials for a session token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    trace!("Entering login function");
    let email = normalize_email(&request.email);
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let account = find_live_user_by_email(&state, &email).await?.ok_or_else(invalid)?;
    if !verify_password(&request.password, &account.password_hash)? {
        debug!(user_id = account.id, "Password mismatch");
        return Err(invalid());
    }

    let token = create_session_token(&account, &state.config)?;
    info!(user_id = account.id, "User logged in");
    Ok(Json(ApiResponse::ok(
        LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.jwt_expiry_hours * 3600,
            user: UserResponse::from(account),
        },
        "Login successful",
    )))
}

/// The signed-in user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let account = user::Entity::find_active_by_id(current.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(Json(ApiResponse::ok(UserResponse::from(account), "User retrieved successfully")))
}

/// Effective permissions of the signed-in user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me/permissions",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Resolved permissions", body = PermissionsResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn my_permissions(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<PermissionsResponse>>> {
    let resolved = resolve_user_permissions(&state.db, current.id).await?;
    Ok(Json(ApiResponse::ok(
        PermissionsResponse::new(current.id, resolved),
        "Permissions retrieved successfully",
    )))
}

/// Request a one-time password for a password reset.
///
/// Always answers 200 so the endpoint cannot be used to probe for accounts.
#[utoipa::path(
    post,
    path = "/api/v1/auth/otp/request",
    tag = "auth",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "Request accepted"),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn request_otp(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<OtpRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let email = normalize_email(&request.email);
    let accepted = || {
        Json(ApiResponse::ok(
            (),
            "If the account exists, a one-time password has been sent",
        ))
    };

    let Some(account) = find_live_user_by_email(&state, &email).await? else {
        debug!("OTP requested for unknown email");
        return Ok(accepted());
    };

    let otp = generate_otp();
    let mut active: user::ActiveModel = account.into();
    active.otp = Set(Some(otp.clone()));
    active.otp_expires_at = Set(Some(
        Utc::now().naive_utc() + Duration::minutes(state.config.otp_ttl_minutes),
    ));
    let saved = active.update(&state.db).await?;

    if let Err(e) = state.notifier.send_otp(&saved.email, &otp).await {
        error!(user_id = saved.id, "Failed to deliver one-time password: {:#}", e);
    }
    info!(user_id = saved.id, "One-time password stored");
    Ok(accepted())
}

/// Reset the password with a previously issued one-time password
#[utoipa::path(
    post,
    path = "/api/v1/auth/otp/verify",
    tag = "auth",
    request_body = OtpVerifyRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Invalid or expired one-time password", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<OtpVerifyRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let email = normalize_email(&request.email);
    let rejected = || ApiError::Validation("Invalid or expired one-time password".to_string());

    let account = find_live_user_by_email(&state, &email).await?.ok_or_else(rejected)?;
    let now = Utc::now().naive_utc();
    let valid = match (&account.otp, account.otp_expires_at) {
        (Some(stored), Some(expires_at)) => *stored == request.otp && expires_at > now,
        _ => false,
    };
    if !valid {
        debug!(user_id = account.id, "One-time password rejected");
        return Err(rejected());
    }

    let user_id = account.id;
    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(hash_password(&request.new_password)?);
    active.otp = Set(None);
    active.otp_expires_at = Set(None);
    active.update(&state.db).await?;

    info!(user_id, "Password reset with one-time password");
    Ok(Json(ApiResponse::ok((), "Password has been reset")))
}
