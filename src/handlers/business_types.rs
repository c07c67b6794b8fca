use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::business_type;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateBusinessTypeRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateBusinessTypeRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BusinessTypeFilter {
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessTypeResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<business_type::Model> for BusinessTypeResponse {
    fn from(model: business_type::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub(crate) async fn find_business_type(
    db: &DatabaseConnection,
    business_type_id: i32,
) -> ApiResult<business_type::Model> {
    business_type::Entity::find_active_by_id(business_type_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Business type", business_type_id))
}

async fn ensure_name_free(db: &DatabaseConnection, name: &str, except: Option<i32>) -> ApiResult<()> {
    let mut query = business_type::Entity::find_active().filter(business_type::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(business_type::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        warn!("Business type name '{}' already taken", name);
        return Err(ApiError::Conflict(format!("Business type with name '{name}' already exists")));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/business-types",
    tag = "taxonomy",
    request_body = CreateBusinessTypeRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Business type created successfully", body = BusinessTypeResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_business_type(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateBusinessTypeRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<BusinessTypeResponse>>)> {
    let name = request.name.trim().to_string();
    ensure_name_free(&state.db, &name, None).await?;

    let created = business_type::ActiveModel {
        name: Set(name),
        description: Set(request.description),
        is_active: Set(request.is_active.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Business type created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            BusinessTypeResponse::from(created),
            "Business type created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/business-types",
    tag = "taxonomy",
    params(ListQuery, BusinessTypeFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Business types retrieved successfully", body = [BusinessTypeResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_business_types(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<BusinessTypeFilter>,
) -> ApiResult<Json<PaginatedResponse<BusinessTypeResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = business_type::Entity::find_active();
    if let Some(is_active) = filter.is_active {
        select = select.filter(business_type::Column::IsActive.eq(is_active));
    }
    let select = apply_list_params(
        select,
        &params,
        &[business_type::Column::Name, business_type::Column::Description],
        None,
        business_type::Column::Id,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} business types", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(BusinessTypeResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Business types retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/business-types/{business_type_id}",
    tag = "taxonomy",
    params(("business_type_id" = i32, Path, description = "Business type ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Business type retrieved successfully", body = BusinessTypeResponse),
        (status = 404, description = "Business type not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_business_type(
    State(state): State<AppState>,
    Path(business_type_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<BusinessTypeResponse>>> {
    let business_type = find_business_type(&state.db, business_type_id).await?;
    Ok(Json(ApiResponse::ok(
        BusinessTypeResponse::from(business_type),
        "Business type retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/business-types/{business_type_id}",
    tag = "taxonomy",
    params(("business_type_id" = i32, Path, description = "Business type ID")),
    request_body = UpdateBusinessTypeRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Business type updated successfully", body = BusinessTypeResponse),
        (status = 404, description = "Business type not found", body = ErrorResponse),
        (status = 409, description = "Name already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_business_type(
    State(state): State<AppState>,
    Path(business_type_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateBusinessTypeRequest>,
) -> ApiResult<Json<ApiResponse<BusinessTypeResponse>>> {
    let existing = find_business_type(&state.db, business_type_id).await?;
    let mut active: business_type::ActiveModel = existing.into();

    if let Some(name) = request.name {
        let name = name.trim().to_string();
        ensure_name_free(&state.db, &name, Some(business_type_id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active.update(&state.db).await?;
    info!("Business type {} updated successfully", business_type_id);
    Ok(Json(ApiResponse::ok(
        BusinessTypeResponse::from(updated),
        "Business type updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/business-types/{business_type_id}",
    tag = "taxonomy",
    params(("business_type_id" = i32, Path, description = "Business type ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Business type deleted successfully"),
        (status = 404, description = "Business type not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_business_type(
    State(state): State<AppState>,
    Path(business_type_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !business_type::Entity::soft_delete(&state.db, business_type_id).await? {
        warn!("Business type with ID {} not found for deletion", business_type_id);
        return Err(ApiError::not_found("Business type", business_type_id));
    }
    info!("Business type {} deleted", business_type_id);
    Ok(Json(ApiResponse::ok((), "Business type deleted successfully")))
}
