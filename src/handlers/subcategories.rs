use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::subcategory;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::practice_areas::find_practice_area;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateSubcategoryRequest {
    pub practice_area_id: i32,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateSubcategoryRequest {
    pub practice_area_id: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubcategoryFilter {
    pub practice_area_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubcategoryResponse {
    pub id: i32,
    pub practice_area_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<subcategory::Model> for SubcategoryResponse {
    fn from(model: subcategory::Model) -> Self {
        Self {
            id: model.id,
            practice_area_id: model.practice_area_id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub(crate) async fn find_subcategory(db: &DatabaseConnection, subcategory_id: i32) -> ApiResult<subcategory::Model> {
    subcategory::Entity::find_active_by_id(subcategory_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Subcategory", subcategory_id))
}

#[utoipa::path(
    post,
    path = "/api/v1/subcategories",
    tag = "taxonomy",
    request_body = CreateSubcategoryRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Subcategory created successfully", body = SubcategoryResponse),
        (status = 404, description = "Practice area not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_subcategory(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateSubcategoryRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SubcategoryResponse>>)> {
    find_practice_area(&state.db, request.practice_area_id).await?;

    let created = subcategory::ActiveModel {
        practice_area_id: Set(request.practice_area_id),
        name: Set(request.name.trim().to_string()),
        description: Set(request.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Subcategory created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SubcategoryResponse::from(created), "Subcategory created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/subcategories",
    tag = "taxonomy",
    params(ListQuery, SubcategoryFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Subcategories retrieved successfully", body = [SubcategoryResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_subcategories(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<SubcategoryFilter>,
) -> ApiResult<Json<PaginatedResponse<SubcategoryResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = subcategory::Entity::find_active();
    if let Some(practice_area_id) = filter.practice_area_id {
        select = select.filter(subcategory::Column::PracticeAreaId.eq(practice_area_id));
    }
    let select = apply_list_params(
        select,
        &params,
        &[subcategory::Column::Name, subcategory::Column::Description],
        None,
        subcategory::Column::Id,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(SubcategoryResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Subcategories retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/subcategories/{subcategory_id}",
    tag = "taxonomy",
    params(("subcategory_id" = i32, Path, description = "Subcategory ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Subcategory retrieved successfully", body = SubcategoryResponse),
        (status = 404, description = "Subcategory not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_subcategory(
    State(state): State<AppState>,
    Path(subcategory_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<SubcategoryResponse>>> {
    let subcategory = find_subcategory(&state.db, subcategory_id).await?;
    Ok(Json(ApiResponse::ok(
        SubcategoryResponse::from(subcategory),
        "Subcategory retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/subcategories/{subcategory_id}",
    tag = "taxonomy",
    params(("subcategory_id" = i32, Path, description = "Subcategory ID")),
    request_body = UpdateSubcategoryRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Subcategory updated successfully", body = SubcategoryResponse),
        (status = 404, description = "Subcategory or practice area not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_subcategory(
    State(state): State<AppState>,
    Path(subcategory_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateSubcategoryRequest>,
) -> ApiResult<Json<ApiResponse<SubcategoryResponse>>> {
    let existing = find_subcategory(&state.db, subcategory_id).await?;
    let mut active: subcategory::ActiveModel = existing.into();

    if let Some(practice_area_id) = request.practice_area_id {
        find_practice_area(&state.db, practice_area_id).await?;
        active.practice_area_id = Set(practice_area_id);
    }
    if let Some(name) = request.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }

    let updated = active.update(&state.db).await?;
    info!("Subcategory {} updated successfully", subcategory_id);
    Ok(Json(ApiResponse::ok(SubcategoryResponse::from(updated), "Subcategory updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/subcategories/{subcategory_id}",
    tag = "taxonomy",
    params(("subcategory_id" = i32, Path, description = "Subcategory ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Subcategory deleted successfully"),
        (status = 404, description = "Subcategory not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_subcategory(
    State(state): State<AppState>,
    Path(subcategory_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !subcategory::Entity::soft_delete(&state.db, subcategory_id).await? {
        warn!("Subcategory with ID {} not found for deletion", subcategory_id);
        return Err(ApiError::not_found("Subcategory", subcategory_id));
    }
    info!("Subcategory {} deleted", subcategory_id);
    Ok(Json(ApiResponse::ok((), "Subcategory deleted successfully")))
}
