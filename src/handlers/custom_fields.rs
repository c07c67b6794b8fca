use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::custom_field::{self, FieldOptions, FieldType};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::custom_field_groups::find_field_group;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCustomFieldRequest {
    pub group_id: i32,
    #[validate(length(min = 1, max = 100, message = "Label must be between 1 and 100 characters"))]
    pub label: String,
    /// `text`, `textarea`, `number`, `date`, `select` or `checkbox`
    #[schema(value_type = String, example = "text")]
    pub field_type: FieldType,
    /// Required and non-empty for `select` fields
    pub options: Option<Vec<String>>,
    pub is_required: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateCustomFieldRequest {
    pub group_id: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Label must be between 1 and 100 characters"))]
    pub label: Option<String>,
    #[schema(value_type = Option<String>)]
    pub field_type: Option<FieldType>,
    pub options: Option<Vec<String>>,
    pub is_required: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomFieldFilter {
    pub group_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomFieldResponse {
    pub id: i32,
    pub group_id: i32,
    pub label: String,
    #[schema(value_type = String)]
    pub field_type: FieldType,
    pub options: Vec<String>,
    pub is_required: bool,
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<custom_field::Model> for CustomFieldResponse {
    fn from(model: custom_field::Model) -> Self {
        Self {
            id: model.id,
            group_id: model.group_id,
            label: model.label,
            field_type: model.field_type,
            options: model.options.0,
            is_required: model.is_required,
            sort_order: model.sort_order,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Trims the options and drops blank ones. A `select` field must end up
/// with at least one.
fn clean_options(field_type: FieldType, options: Vec<String>) -> ApiResult<FieldOptions> {
    let options: Vec<String> = options
        .into_iter()
        .map(|option| option.trim().to_string())
        .filter(|option| !option.is_empty())
        .collect();
    if field_type == FieldType::Select && options.is_empty() {
        return Err(ApiError::Validation(
            "Select fields require at least one option".to_string(),
        ));
    }
    Ok(FieldOptions(options))
}

async fn find_custom_field(db: &DatabaseConnection, field_id: i32) -> ApiResult<custom_field::Model> {
    custom_field::Entity::find_active_by_id(field_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Custom field", field_id))
}

#[utoipa::path(
    post,
    path = "/api/v1/custom-fields",
    tag = "taxonomy",
    request_body = CreateCustomFieldRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Custom field created successfully", body = CustomFieldResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Custom field group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_custom_field(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCustomFieldRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CustomFieldResponse>>)> {
    let options = clean_options(request.field_type, request.options.unwrap_or_default())?;
    find_field_group(&state.db, request.group_id).await?;

    let created = custom_field::ActiveModel {
        group_id: Set(request.group_id),
        label: Set(request.label.trim().to_string()),
        field_type: Set(request.field_type),
        options: Set(options),
        is_required: Set(request.is_required.unwrap_or(false)),
        sort_order: Set(request.sort_order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Custom field created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CustomFieldResponse::from(created), "Custom field created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/custom-fields",
    tag = "taxonomy",
    params(ListQuery, CustomFieldFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom fields retrieved successfully", body = [CustomFieldResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_custom_fields(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<CustomFieldFilter>,
) -> ApiResult<Json<PaginatedResponse<CustomFieldResponse>>> {
    let params = list.resolve(20, SortOrder::Asc);
    let mut select = custom_field::Entity::find_active();
    if let Some(group_id) = filter.group_id {
        select = select.filter(custom_field::Column::GroupId.eq(group_id));
    }
    let select = apply_list_params(
        select,
        &params,
        &[custom_field::Column::Label],
        None,
        custom_field::Column::SortOrder,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(CustomFieldResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Custom fields retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/custom-fields/{field_id}",
    tag = "taxonomy",
    params(("field_id" = i32, Path, description = "Custom field ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field retrieved successfully", body = CustomFieldResponse),
        (status = 404, description = "Custom field not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_custom_field(
    State(state): State<AppState>,
    Path(field_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<CustomFieldResponse>>> {
    let field = find_custom_field(&state.db, field_id).await?;
    Ok(Json(ApiResponse::ok(CustomFieldResponse::from(field), "Custom field retrieved successfully")))
}

/// Update a custom field. Changing the type re-checks the options.
#[utoipa::path(
    put,
    path = "/api/v1/custom-fields/{field_id}",
    tag = "taxonomy",
    params(("field_id" = i32, Path, description = "Custom field ID")),
    request_body = UpdateCustomFieldRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field updated successfully", body = CustomFieldResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Custom field or group not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_custom_field(
    State(state): State<AppState>,
    Path(field_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateCustomFieldRequest>,
) -> ApiResult<Json<ApiResponse<CustomFieldResponse>>> {
    let existing = find_custom_field(&state.db, field_id).await?;
    let field_type = request.field_type.unwrap_or(existing.field_type);
    let options = match request.options {
        Some(options) => clean_options(field_type, options)?,
        None => clean_options(field_type, existing.options.0.clone())?,
    };
    let mut active: custom_field::ActiveModel = existing.into();

    if let Some(group_id) = request.group_id {
        find_field_group(&state.db, group_id).await?;
        active.group_id = Set(group_id);
    }
    if let Some(label) = request.label {
        active.label = Set(label.trim().to_string());
    }
    if let Some(is_required) = request.is_required {
        active.is_required = Set(is_required);
    }
    if let Some(sort_order) = request.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.field_type = Set(field_type);
    active.options = Set(options);

    let updated = active.update(&state.db).await?;
    info!("Custom field {} updated successfully", field_id);
    Ok(Json(ApiResponse::ok(CustomFieldResponse::from(updated), "Custom field updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/custom-fields/{field_id}",
    tag = "taxonomy",
    params(("field_id" = i32, Path, description = "Custom field ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Custom field deleted successfully"),
        (status = 404, description = "Custom field not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_custom_field(
    State(state): State<AppState>,
    Path(field_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !custom_field::Entity::soft_delete(&state.db, field_id).await? {
        warn!("Custom field with ID {} not found for deletion", field_id);
        return Err(ApiError::not_found("Custom field", field_id));
    }
    info!("Custom field {} deleted", field_id);
    Ok(Json(ApiResponse::ok((), "Custom field deleted successfully")))
}
