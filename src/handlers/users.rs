use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::NaiveDateTime;
use compute::permissions::{resolve_user_permissions, AccessDenial, EffectivePermissions};
use model::entities::user::{self, UserRole};
use model::entities::user_group::{self, CustomPermissions, DefaultPermissions};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{password::hash_password, CurrentUser};
use crate::errors::{ApiError, ApiResult};
use crate::handlers::auth::normalize_email;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

/// Request body for creating a new user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// `user` (default) or `super_admin`
    #[schema(value_type = Option<String>, example = "user")]
    pub role: Option<UserRole>,
    pub group_id: Option<i32>,
}

/// Request body for updating a user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    #[schema(value_type = Option<String>)]
    pub role: Option<UserRole>,
}

/// Request body for assigning a user to a group. `null` removes the group.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct AssignGroupRequest {
    pub group_id: Option<i32>,
}

/// Filters for the user list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    #[param(value_type = Option<String>)]
    pub role: Option<UserRole>,
    pub group_id: Option<i32>,
}

/// User response model
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[schema(value_type = String)]
    pub role: UserRole,
    pub group_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            group_id: model.group_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Resolved permissions of a user.
///
/// `default_permissions` and `custom_permissions` are null for super admins
/// and for users without access; `reason` tells the two denials apart.
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionsResponse {
    pub user_id: i32,
    pub role: String,
    pub full_access: bool,
    pub has_access: bool,
    /// `no_group_assigned` or `group_not_found` when access is denied
    pub reason: Option<String>,
    pub message: Option<String>,
    pub group_id: Option<i32>,
    pub group_title: Option<String>,
    pub group_is_active: Option<bool>,
    #[schema(value_type = Option<Object>)]
    pub default_permissions: Option<DefaultPermissions>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub custom_permissions: Option<CustomPermissions>,
}

impl PermissionsResponse {
    pub fn new(user_id: i32, resolved: EffectivePermissions) -> Self {
        let base = Self {
            user_id,
            role: UserRole::User.as_str().to_string(),
            full_access: false,
            has_access: false,
            reason: None,
            message: None,
            group_id: None,
            group_title: None,
            group_is_active: None,
            default_permissions: None,
            custom_permissions: None,
        };

        match resolved {
            EffectivePermissions::FullAccess => Self {
                role: UserRole::SuperAdmin.as_str().to_string(),
                full_access: true,
                has_access: true,
                ..base
            },
            EffectivePermissions::NoAccess(denial) => Self {
                reason: Some(
                    match denial {
                        AccessDenial::NoGroupAssigned => "no_group_assigned",
                        AccessDenial::GroupNotFound => "group_not_found",
                    }
                    .to_string(),
                ),
                message: Some(denial.message().to_string()),
                ..base
            },
            EffectivePermissions::Group {
                group,
                default_permissions,
                custom_permissions,
            } => Self {
                has_access: true,
                group_id: Some(group.id),
                group_title: Some(group.title),
                group_is_active: Some(group.is_active),
                default_permissions: Some(default_permissions),
                custom_permissions: Some(custom_permissions),
                ..base
            },
        }
    }
}

async fn ensure_email_free(db: &DatabaseConnection, email: &str, except: Option<i32>) -> ApiResult<()> {
    let mut query = user::Entity::find_active().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        warn!("Email already in use by another user");
        return Err(ApiError::Conflict(format!("User with email '{email}' already exists")));
    }
    Ok(())
}

pub(crate) async fn find_group(db: &DatabaseConnection, group_id: i32) -> ApiResult<user_group::Model> {
    user_group::Entity::find_active_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User group", group_id))
}

async fn find_user(db: &DatabaseConnection, user_id: i32) -> ApiResult<user::Model> {
    user::Entity::find_active_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user_id))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    trace!("Entering create_user function");
    let email = normalize_email(&request.email);
    ensure_email_free(&state.db, &email, None).await?;
    if let Some(group_id) = request.group_id {
        find_group(&state.db, group_id).await?;
    }

    let created = user::ActiveModel {
        name: Set(request.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(hash_password(&request.password)?),
        role: Set(request.role.unwrap_or(UserRole::User)),
        group_id: Set(request.group_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResponse::from(created), "User created successfully")),
    ))
}

/// Get all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(ListQuery, UserFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = [UserResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Json<PaginatedResponse<UserResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    debug!("Fetching users with {:?} and {:?}", params, filter);

    let mut select = user::Entity::find_active();
    if let Some(role) = filter.role {
        select = select.filter(user::Column::Role.eq(role));
    }
    if let Some(group_id) = filter.group_id {
        select = select.filter(user::Column::GroupId.eq(group_id));
    }
    let select = apply_list_params(
        select,
        &params,
        &[user::Column::Name, user::Column::Email],
        None,
        user::Column::Id,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(UserResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Users retrieved successfully",
    )))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let found = find_user(&state.db, user_id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(found), "User retrieved successfully")))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    trace!("Entering update_user function for user_id: {}", user_id);
    let existing = find_user(&state.db, user_id).await?;
    let mut active: user::ActiveModel = existing.into();

    if let Some(name) = request.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = request.email {
        let email = normalize_email(&email);
        ensure_email_free(&state.db, &email, Some(user_id)).await?;
        active.email = Set(email);
    }
    if let Some(password) = request.password {
        active.password_hash = Set(hash_password(&password)?);
    }
    if let Some(role) = request.role {
        active.role = Set(role);
    }

    let updated = active.update(&state.db).await?;
    info!("User {} updated successfully", user_id);
    Ok(Json(ApiResponse::ok(UserResponse::from(updated), "User updated successfully")))
}

/// Soft-delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 400, description = "Attempt to delete the own account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if current.id == user_id {
        return Err(ApiError::Validation("You cannot delete your own account".to_string()));
    }
    if !user::Entity::soft_delete(&state.db, user_id).await? {
        return Err(ApiError::not_found("User", user_id));
    }
    info!("User {} deleted", user_id);
    Ok(Json(ApiResponse::ok((), "User deleted successfully")))
}

/// Effective permissions of a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/permissions",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Resolved permissions", body = PermissionsResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_permissions(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<PermissionsResponse>>> {
    let resolved = resolve_user_permissions(&state.db, user_id).await?;
    Ok(Json(ApiResponse::ok(
        PermissionsResponse::new(user_id, resolved),
        "Permissions retrieved successfully",
    )))
}

/// Assign a user to a group, or remove the assignment
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/group",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = AssignGroupRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Group assignment updated", body = UserResponse),
        (status = 404, description = "User or group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn assign_user_group(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<AssignGroupRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let existing = find_user(&state.db, user_id).await?;
    if let Some(group_id) = request.group_id {
        find_group(&state.db, group_id).await?;
    }

    let mut active: user::ActiveModel = existing.into();
    active.group_id = Set(request.group_id);
    let updated = active.update(&state.db).await?;

    info!("User {} assigned to group {:?}", user_id, request.group_id);
    Ok(Json(ApiResponse::ok(UserResponse::from(updated), "Group assignment updated")))
}
