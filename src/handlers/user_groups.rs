use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use compute::permissions::{remove_custom_permission, upsert_custom_permission};
use model::entities::user;
use model::entities::user_group::{
    self, CustomPermission, CustomPermissions, DefaultPermissions, PermissionLevel,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::users::{find_group, UserResponse};
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    /// One level (`none`, `view`, `edit`, `full`) for each fixed module
    #[schema(value_type = Object)]
    pub default_permissions: DefaultPermissions,
    #[schema(value_type = Option<Vec<Object>>)]
    pub custom_permissions: Option<Vec<CustomPermission>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateUserGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub default_permissions: Option<DefaultPermissions>,
    /// Replaces the whole custom permission list
    #[schema(value_type = Option<Vec<Object>>)]
    pub custom_permissions: Option<Vec<CustomPermission>>,
    pub is_active: Option<bool>,
}

/// Adds a custom permission or changes the level of an existing one
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct GroupPermissionRequest {
    #[validate(length(min = 1, max = 50, message = "Module must be between 1 and 50 characters"))]
    pub module: String,
    #[schema(value_type = String, example = "view")]
    pub level: PermissionLevel,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserGroupFilter {
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserGroupResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub default_permissions: DefaultPermissions,
    #[schema(value_type = Vec<Object>)]
    pub custom_permissions: CustomPermissions,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<user_group::Model> for UserGroupResponse {
    fn from(model: user_group::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            default_permissions: model.default_permissions,
            custom_permissions: model.custom_permissions,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Builds a custom permission list without duplicate modules; later entries
/// win.
fn normalize_custom_permissions(entries: Vec<CustomPermission>) -> ApiResult<CustomPermissions> {
    let mut list = CustomPermissions::default();
    for entry in entries {
        upsert_custom_permission(&mut list, module_name(&entry.module)?, entry.level);
    }
    Ok(list)
}

/// Trimmed module name; blank names are rejected.
fn module_name(raw: &str) -> ApiResult<&str> {
    let module = raw.trim();
    if module.is_empty() {
        return Err(ApiError::Validation("Custom permission module is required".to_string()));
    }
    Ok(module)
}

async fn ensure_title_free(db: &DatabaseConnection, title: &str, except: Option<i32>) -> ApiResult<()> {
    let mut query = user_group::Entity::find_active().filter(user_group::Column::Title.eq(title));
    if let Some(id) = except {
        query = query.filter(user_group::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        warn!("User group title '{}' already taken", title);
        return Err(ApiError::Conflict(format!("User group with title '{title}' already exists")));
    }
    Ok(())
}

/// Create a user group
#[utoipa::path(
    post,
    path = "/api/v1/user-groups",
    tag = "user-groups",
    request_body = CreateUserGroupRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "User group created successfully", body = UserGroupResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Title already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_user_group(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserGroupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserGroupResponse>>)> {
    trace!("Entering create_user_group function");
    let title = request.title.trim().to_string();
    ensure_title_free(&state.db, &title, None).await?;
    let custom = normalize_custom_permissions(request.custom_permissions.unwrap_or_default())?;

    let created = user_group::ActiveModel {
        title: Set(title),
        description: Set(request.description),
        default_permissions: Set(request.default_permissions),
        custom_permissions: Set(custom),
        is_active: Set(request.is_active.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User group created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserGroupResponse::from(created), "User group created successfully")),
    ))
}

/// List user groups
#[utoipa::path(
    get,
    path = "/api/v1/user-groups",
    tag = "user-groups",
    params(ListQuery, UserGroupFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User groups retrieved successfully", body = [UserGroupResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_user_groups(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<UserGroupFilter>,
) -> ApiResult<Json<PaginatedResponse<UserGroupResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = user_group::Entity::find_active();
    if let Some(is_active) = filter.is_active {
        select = select.filter(user_group::Column::IsActive.eq(is_active));
    }
    let select = apply_list_params(
        select,
        &params,
        &[user_group::Column::Title, user_group::Column::Description],
        None,
        user_group::Column::Id,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} user groups", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(UserGroupResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "User groups retrieved successfully",
    )))
}

/// Get a user group by ID
#[utoipa::path(
    get,
    path = "/api/v1/user-groups/{group_id}",
    tag = "user-groups",
    params(("group_id" = i32, Path, description = "User group ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User group retrieved successfully", body = UserGroupResponse),
        (status = 404, description = "User group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_group(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<UserGroupResponse>>> {
    let group = find_group(&state.db, group_id).await?;
    Ok(Json(ApiResponse::ok(UserGroupResponse::from(group), "User group retrieved successfully")))
}

/// Update a user group
#[utoipa::path(
    put,
    path = "/api/v1/user-groups/{group_id}",
    tag = "user-groups",
    params(("group_id" = i32, Path, description = "User group ID")),
    request_body = UpdateUserGroupRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User group updated successfully", body = UserGroupResponse),
        (status = 404, description = "User group not found", body = ErrorResponse),
        (status = 409, description = "Title already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_user_group(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateUserGroupRequest>,
) -> ApiResult<Json<ApiResponse<UserGroupResponse>>> {
    let existing = find_group(&state.db, group_id).await?;
    let mut active: user_group::ActiveModel = existing.into();

    if let Some(title) = request.title {
        let title = title.trim().to_string();
        ensure_title_free(&state.db, &title, Some(group_id)).await?;
        active.title = Set(title);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(defaults) = request.default_permissions {
        active.default_permissions = Set(defaults);
    }
    if let Some(custom) = request.custom_permissions {
        active.custom_permissions = Set(normalize_custom_permissions(custom)?);
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active.update(&state.db).await?;
    info!("User group {} updated successfully", group_id);
    Ok(Json(ApiResponse::ok(UserGroupResponse::from(updated), "User group updated successfully")))
}

/// Soft-delete a user group. Refused while live users are assigned to it.
#[utoipa::path(
    delete,
    path = "/api/v1/user-groups/{group_id}",
    tag = "user-groups",
    params(("group_id" = i32, Path, description = "User group ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User group deleted successfully"),
        (status = 400, description = "Users are still assigned to the group", body = ErrorResponse),
        (status = 404, description = "User group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user_group(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    find_group(&state.db, group_id).await?;

    let assigned = user::Entity::find_active()
        .filter(user::Column::GroupId.eq(group_id))
        .count(&state.db)
        .await?;
    if assigned > 0 {
        warn!("Refusing to delete group {} with {} assigned users", group_id, assigned);
        return Err(ApiError::Validation(format!(
            "Cannot delete user group: {assigned} user(s) are still assigned to it"
        )));
    }

    user_group::Entity::soft_delete(&state.db, group_id).await?;
    info!("User group {} deleted", group_id);
    Ok(Json(ApiResponse::ok((), "User group deleted successfully")))
}

/// Users assigned to a group
#[utoipa::path(
    get,
    path = "/api/v1/user-groups/{group_id}/users",
    tag = "user-groups",
    params(("group_id" = i32, Path, description = "User group ID"), ListQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Users of the group", body = [UserResponse]),
        (status = 404, description = "User group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_group_users(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
    Query(list): Query<ListQuery>,
) -> ApiResult<Json<PaginatedResponse<UserResponse>>> {
    find_group(&state.db, group_id).await?;
    let params = list.resolve(10, SortOrder::Desc);

    let select = apply_list_params(
        user::Entity::find_active().filter(user::Column::GroupId.eq(group_id)),
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
        "Group users retrieved successfully",
    )))
}

/// Flip the active flag of a group
#[utoipa::path(
    patch,
    path = "/api/v1/user-groups/{group_id}/status",
    tag = "user-groups",
    params(("group_id" = i32, Path, description = "User group ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Status toggled", body = UserGroupResponse),
        (status = 404, description = "User group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn toggle_user_group_status(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<UserGroupResponse>>> {
    let existing = find_group(&state.db, group_id).await?;
    let is_active = !existing.is_active;
    let mut active: user_group::ActiveModel = existing.into();
    active.is_active = Set(is_active);
    let updated = active.update(&state.db).await?;

    info!("User group {} is_active set to {}", group_id, is_active);
    Ok(Json(ApiResponse::ok(UserGroupResponse::from(updated), "User group status updated")))
}

/// Add or replace one custom permission of a group
#[utoipa::path(
    post,
    path = "/api/v1/user-groups/{group_id}/permissions",
    tag = "user-groups",
    params(("group_id" = i32, Path, description = "User group ID")),
    request_body = GroupPermissionRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Permission saved", body = UserGroupResponse),
        (status = 400, description = "Invalid module name", body = ErrorResponse),
        (status = 404, description = "User group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn upsert_group_permission(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<GroupPermissionRequest>,
) -> ApiResult<Json<ApiResponse<UserGroupResponse>>> {
    let module = module_name(&request.module)?;
    let existing = find_group(&state.db, group_id).await?;
    let mut permissions = existing.custom_permissions.clone();
    upsert_custom_permission(&mut permissions, module, request.level);

    let mut active: user_group::ActiveModel = existing.into();
    active.custom_permissions = Set(permissions);
    let updated = active.update(&state.db).await?;

    info!("Permission for module '{}' saved on group {}", module, group_id);
    Ok(Json(ApiResponse::ok(UserGroupResponse::from(updated), "Permission saved successfully")))
}

/// Remove one custom permission from a group
#[utoipa::path(
    delete,
    path = "/api/v1/user-groups/{group_id}/permissions/{module}",
    tag = "user-groups",
    params(
        ("group_id" = i32, Path, description = "User group ID"),
        ("module" = String, Path, description = "Module name"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Permission removed", body = UserGroupResponse),
        (status = 404, description = "Group or permission not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn remove_group_permission(
    State(state): State<AppState>,
    Path((group_id, module)): Path<(i32, String)>,
) -> ApiResult<Json<ApiResponse<UserGroupResponse>>> {
    let module = module.trim();
    let existing = find_group(&state.db, group_id).await?;
    let mut permissions = existing.custom_permissions.clone();
    if !remove_custom_permission(&mut permissions, module) {
        debug!("Group {} has no custom permission for '{}'", group_id, module);
        return Err(ApiError::NotFound("Permission for module not found".to_string()));
    }

    let mut active: user_group::ActiveModel = existing.into();
    active.custom_permissions = Set(permissions);
    let updated = active.update(&state.db).await?;

    info!("Permission for module '{}' removed from group {}", module, group_id);
    Ok(Json(ApiResponse::ok(UserGroupResponse::from(updated), "Permission removed successfully")))
}
