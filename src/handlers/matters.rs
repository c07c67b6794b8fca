use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use model::entities::matter::{self, MatterStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::customers::find_customer;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateMatterRequest {
    pub customer_id: i32,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub practice_area_id: Option<i32>,
    /// `open` (default), `pending` or `closed`
    #[schema(value_type = Option<String>, example = "open")]
    pub status: Option<MatterStatus>,
    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateMatterRequest {
    pub customer_id: Option<i32>,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub practice_area_id: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub status: Option<MatterStatus>,
    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MatterFilter {
    #[param(value_type = Option<String>)]
    pub status: Option<MatterStatus>,
    pub customer_id: Option<i32>,
    pub practice_area_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MatterResponse {
    pub id: i32,
    pub customer_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub practice_area_id: Option<i32>,
    #[schema(value_type = String)]
    pub status: MatterStatus,
    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<matter::Model> for MatterResponse {
    fn from(model: matter::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            title: model.title,
            description: model.description,
            practice_area_id: model.practice_area_id,
            status: model.status,
            open_date: model.open_date,
            close_date: model.close_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn check_dates(open: Option<NaiveDate>, close: Option<NaiveDate>) -> ApiResult<()> {
    match (open, close) {
        (Some(open), Some(close)) if close < open => Err(ApiError::Validation(
            "Close date cannot be before open date".to_string(),
        )),
        _ => Ok(()),
    }
}

async fn find_matter(db: &DatabaseConnection, matter_id: i32) -> ApiResult<matter::Model> {
    matter::Entity::find_active_by_id(matter_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Matter", matter_id))
}

/// Create a new matter for an existing customer
#[utoipa::path(
    post,
    path = "/api/v1/matters",
    tag = "matters",
    request_body = CreateMatterRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Matter created successfully", body = MatterResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_matter(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateMatterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MatterResponse>>)> {
    trace!("Entering create_matter function");
    check_dates(request.open_date, request.close_date)?;
    find_customer(&state.db, request.customer_id).await?;

    let created = matter::ActiveModel {
        customer_id: Set(request.customer_id),
        title: Set(request.title.trim().to_string()),
        description: Set(request.description),
        practice_area_id: Set(request.practice_area_id),
        status: Set(request.status.unwrap_or(MatterStatus::Open)),
        open_date: Set(request.open_date),
        close_date: Set(request.close_date),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Matter created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(MatterResponse::from(created), "Matter created successfully")),
    ))
}

/// List matters. A search term ranks exact and prefix title matches first.
#[utoipa::path(
    get,
    path = "/api/v1/matters",
    tag = "matters",
    params(ListQuery, MatterFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Matters retrieved successfully", body = [MatterResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_matters(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<MatterFilter>,
) -> ApiResult<Json<PaginatedResponse<MatterResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = matter::Entity::find_active();
    if let Some(status) = filter.status {
        select = select.filter(matter::Column::Status.eq(status));
    }
    if let Some(customer_id) = filter.customer_id {
        select = select.filter(matter::Column::CustomerId.eq(customer_id));
    }
    if let Some(practice_area_id) = filter.practice_area_id {
        select = select.filter(matter::Column::PracticeAreaId.eq(practice_area_id));
    }
    let select = apply_list_params(
        select,
        &params,
        &[matter::Column::Title, matter::Column::Description],
        Some(matter::Column::Title),
        matter::Column::CreatedAt,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} matters", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(MatterResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Matters retrieved successfully",
    )))
}

/// Get a matter by ID
#[utoipa::path(
    get,
    path = "/api/v1/matters/{matter_id}",
    tag = "matters",
    params(("matter_id" = i32, Path, description = "Matter ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Matter retrieved successfully", body = MatterResponse),
        (status = 404, description = "Matter not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_matter(
    State(state): State<AppState>,
    Path(matter_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<MatterResponse>>> {
    let matter = find_matter(&state.db, matter_id).await?;
    Ok(Json(ApiResponse::ok(MatterResponse::from(matter), "Matter retrieved successfully")))
}

/// Update a matter
#[utoipa::path(
    put,
    path = "/api/v1/matters/{matter_id}",
    tag = "matters",
    params(("matter_id" = i32, Path, description = "Matter ID")),
    request_body = UpdateMatterRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Matter updated successfully", body = MatterResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Matter or customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_matter(
    State(state): State<AppState>,
    Path(matter_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateMatterRequest>,
) -> ApiResult<Json<ApiResponse<MatterResponse>>> {
    let existing = find_matter(&state.db, matter_id).await?;
    check_dates(
        request.open_date.or(existing.open_date),
        request.close_date.or(existing.close_date),
    )?;
    let mut active: matter::ActiveModel = existing.into();

    if let Some(customer_id) = request.customer_id {
        find_customer(&state.db, customer_id).await?;
        active.customer_id = Set(customer_id);
    }
    if let Some(title) = request.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(practice_area_id) = request.practice_area_id {
        active.practice_area_id = Set(Some(practice_area_id));
    }
    if let Some(status) = request.status {
        active.status = Set(status);
    }
    if let Some(open_date) = request.open_date {
        active.open_date = Set(Some(open_date));
    }
    if let Some(close_date) = request.close_date {
        active.close_date = Set(Some(close_date));
    }

    let updated = active.update(&state.db).await?;
    info!("Matter {} updated successfully", matter_id);
    Ok(Json(ApiResponse::ok(MatterResponse::from(updated), "Matter updated successfully")))
}

/// Soft-delete a matter
#[utoipa::path(
    delete,
    path = "/api/v1/matters/{matter_id}",
    tag = "matters",
    params(("matter_id" = i32, Path, description = "Matter ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Matter deleted successfully"),
        (status = 404, description = "Matter not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_matter(
    State(state): State<AppState>,
    Path(matter_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !matter::Entity::soft_delete(&state.db, matter_id).await? {
        warn!("Matter with ID {} not found for deletion", matter_id);
        return Err(ApiError::not_found("Matter", matter_id));
    }
    info!("Matter {} deleted", matter_id);
    Ok(Json(ApiResponse::ok((), "Matter deleted successfully")))
}
