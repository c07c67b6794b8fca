use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::business_entity;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::business_types::find_business_type;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateBusinessEntityRequest {
    pub business_type_id: i32,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateBusinessEntityRequest {
    pub business_type_id: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BusinessEntityFilter {
    pub business_type_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BusinessEntityResponse {
    pub id: i32,
    pub business_type_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<business_entity::Model> for BusinessEntityResponse {
    fn from(model: business_entity::Model) -> Self {
        Self {
            id: model.id,
            business_type_id: model.business_type_id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

async fn find_business_entity(db: &DatabaseConnection, id: i32) -> ApiResult<business_entity::Model> {
    business_entity::Entity::find_active_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Business entity", id))
}

#[utoipa::path(
    post,
    path = "/api/v1/business-entities",
    tag = "taxonomy",
    request_body = CreateBusinessEntityRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Business entity created successfully", body = BusinessEntityResponse),
        (status = 404, description = "Business type not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_business_entity(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateBusinessEntityRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<BusinessEntityResponse>>)> {
    find_business_type(&state.db, request.business_type_id).await?;

    let created = business_entity::ActiveModel {
        business_type_id: Set(request.business_type_id),
        name: Set(request.name.trim().to_string()),
        description: Set(request.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Business entity created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            BusinessEntityResponse::from(created),
            "Business entity created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/business-entities",
    tag = "taxonomy",
    params(ListQuery, BusinessEntityFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Business entities retrieved successfully", body = [BusinessEntityResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_business_entities(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<BusinessEntityFilter>,
) -> ApiResult<Json<PaginatedResponse<BusinessEntityResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = business_entity::Entity::find_active();
    if let Some(business_type_id) = filter.business_type_id {
        select = select.filter(business_entity::Column::BusinessTypeId.eq(business_type_id));
    }
    let select = apply_list_params(
        select,
        &params,
        &[business_entity::Column::Name, business_entity::Column::Description],
        None,
        business_entity::Column::Id,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} business entities", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(BusinessEntityResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Business entities retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/business-entities/{business_entity_id}",
    tag = "taxonomy",
    params(("business_entity_id" = i32, Path, description = "Business entity ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Business entity retrieved successfully", body = BusinessEntityResponse),
        (status = 404, description = "Business entity not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_business_entity(
    State(state): State<AppState>,
    Path(business_entity_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<BusinessEntityResponse>>> {
    let entity = find_business_entity(&state.db, business_entity_id).await?;
    Ok(Json(ApiResponse::ok(
        BusinessEntityResponse::from(entity),
        "Business entity retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/business-entities/{business_entity_id}",
    tag = "taxonomy",
    params(("business_entity_id" = i32, Path, description = "Business entity ID")),
    request_body = UpdateBusinessEntityRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Business entity updated successfully", body = BusinessEntityResponse),
        (status = 404, description = "Business entity or type not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_business_entity(
    State(state): State<AppState>,
    Path(business_entity_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateBusinessEntityRequest>,
) -> ApiResult<Json<ApiResponse<BusinessEntityResponse>>> {
    let existing = find_business_entity(&state.db, business_entity_id).await?;
    let mut active: business_entity::ActiveModel = existing.into();

    if let Some(business_type_id) = request.business_type_id {
        find_business_type(&state.db, business_type_id).await?;
        active.business_type_id = Set(business_type_id);
    }
    if let Some(name) = request.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }

    let updated = active.update(&state.db).await?;
    info!("Business entity {} updated successfully", business_entity_id);
    Ok(Json(ApiResponse::ok(
        BusinessEntityResponse::from(updated),
        "Business entity updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/business-entities/{business_entity_id}",
    tag = "taxonomy",
    params(("business_entity_id" = i32, Path, description = "Business entity ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Business entity deleted successfully"),
        (status = 404, description = "Business entity not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_business_entity(
    State(state): State<AppState>,
    Path(business_entity_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !business_entity::Entity::soft_delete(&state.db, business_entity_id).await? {
        warn!("Business entity with ID {} not found for deletion", business_entity_id);
        return Err(ApiError::not_found("Business entity", business_entity_id));
    }
    info!("Business entity {} deleted", business_entity_id);
    Ok(Json(ApiResponse::ok((), "Business entity deleted successfully")))
}
