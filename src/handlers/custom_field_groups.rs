use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::custom_field_group;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::subcategories::find_subcategory;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCustomFieldGroupRequest {
    pub subcategory_id: i32,
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateCustomFieldGroupRequest {
    pub subcategory_id: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomFieldGroupFilter {
    pub subcategory_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomFieldGroupResponse {
    pub id: i32,
    pub subcategory_id: i32,
    pub title: String,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<custom_field_group::Model> for CustomFieldGroupResponse {
    fn from(model: custom_field_group::Model) -> Self {
        Self {
            id: model.id,
            subcategory_id: model.subcategory_id,
            title: model.title,
            sort_order: model.sort_order,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub(crate) async fn find_field_group(db: &DatabaseConnection, group_id: i32) -> ApiResult<custom_field_group::Model> {
    custom_field_group::Entity::find_active_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Custom field group", group_id))
}

#[utoipa::path(
    post,
    path = "/api/v1/custom-field-groups",
    tag = "taxonomy",
    request_body = CreateCustomFieldGroupRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Custom field group created successfully", body = CustomFieldGroupResponse),
        (status = 404, description = "Subcategory not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_custom_field_group(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCustomFieldGroupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CustomFieldGroupResponse>>)> {
    find_subcategory(&state.db, request.subcategory_id).await?;

    let created = custom_field_group::ActiveModel {
        subcategory_id: Set(request.subcategory_id),
        title: Set(request.title.trim().to_string()),
        sort_order: Set(request.sort_order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Custom field group created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            CustomFieldGroupResponse::from(created),
            "Custom field group created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/custom-field-groups",
    tag = "taxonomy",
    params(ListQuery, CustomFieldGroupFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field groups retrieved successfully", body = [CustomFieldGroupResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_custom_field_groups(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<CustomFieldGroupFilter>,
) -> ApiResult<Json<PaginatedResponse<CustomFieldGroupResponse>>> {
    let params = list.resolve(20, SortOrder::Asc);
    let mut select = custom_field_group::Entity::find_active();
    if let Some(subcategory_id) = filter.subcategory_id {
        select = select.filter(custom_field_group::Column::SubcategoryId.eq(subcategory_id));
    }
    let select = apply_list_params(
        select,
        &params,
        &[custom_field_group::Column::Title],
        None,
        custom_field_group::Column::SortOrder,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(CustomFieldGroupResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Custom field groups retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/custom-field-groups/{group_id}",
    tag = "taxonomy",
    params(("group_id" = i32, Path, description = "Custom field group ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field group retrieved successfully", body = CustomFieldGroupResponse),
        (status = 404, description = "Custom field group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_custom_field_group(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<CustomFieldGroupResponse>>> {
    let group = find_field_group(&state.db, group_id).await?;
    Ok(Json(ApiResponse::ok(
        CustomFieldGroupResponse::from(group),
        "Custom field group retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/custom-field-groups/{group_id}",
    tag = "taxonomy",
    params(("group_id" = i32, Path, description = "Custom field group ID")),
    request_body = UpdateCustomFieldGroupRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field group updated successfully", body = CustomFieldGroupResponse),
        (status = 404, description = "Group or subcategory not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_custom_field_group(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateCustomFieldGroupRequest>,
) -> ApiResult<Json<ApiResponse<CustomFieldGroupResponse>>> {
    let existing = find_field_group(&state.db, group_id).await?;
    let mut active: custom_field_group::ActiveModel = existing.into();

    if let Some(subcategory_id) = request.subcategory_id {
        find_subcategory(&state.db, subcategory_id).await?;
        active.subcategory_id = Set(subcategory_id);
    }
    if let Some(title) = request.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(sort_order) = request.sort_order {
        active.sort_order = Set(sort_order);
    }

    let updated = active.update(&state.db).await?;
    info!("Custom field group {} updated successfully", group_id);
    Ok(Json(ApiResponse::ok(
        CustomFieldGroupResponse::from(updated),
        "Custom field group updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/custom-field-groups/{group_id}",
    tag = "taxonomy",
    params(("group_id" = i32, Path, description = "Custom field group ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field group deleted successfully"),
        (status = 404, description = "Custom field group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_custom_field_group(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !custom_field_group::Entity::soft_delete(&state.db, group_id).await? {
        warn!("Custom field group with ID {} not found for deletion", group_id);
        return Err(ApiError::not_found("Custom field group", group_id));
    }
    info!("Custom field group {} deleted", group_id);
    Ok(Json(ApiResponse::ok((), "Custom field group deleted successfully")))
}
