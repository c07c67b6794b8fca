use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::heads_up::{self, Frequency};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::customers::find_customer;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::validators::valid_time_of_day;
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateHeadsUpRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub message: Option<String>,
    pub customer_id: Option<i32>,
    /// `once`, `daily`, `weekly` or `monthly`
    #[schema(value_type = String, example = "weekly")]
    pub frequency: Frequency,
    #[validate(custom(function = "valid_time_of_day"))]
    #[schema(example = "09:00")]
    pub time_of_day: String,
    #[validate(length(min = 1, max = 64, message = "Timezone is required"))]
    #[schema(example = "Europe/Prague")]
    pub timezone: String,
    pub next_run_at: Option<NaiveDateTime>,
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateHeadsUpRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub message: Option<String>,
    pub customer_id: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub frequency: Option<Frequency>,
    #[validate(custom(function = "valid_time_of_day"))]
    pub time_of_day: Option<String>,
    #[validate(length(min = 1, max = 64, message = "Timezone is required"))]
    pub timezone: Option<String>,
    pub next_run_at: Option<NaiveDateTime>,
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HeadsUpFilter {
    #[param(value_type = Option<String>)]
    pub frequency: Option<Frequency>,
    pub customer_id: Option<i32>,
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HeadsUpResponse {
    pub id: i32,
    pub title: String,
    pub message: Option<String>,
    pub customer_id: Option<i32>,
    #[schema(value_type = String)]
    pub frequency: Frequency,
    pub time_of_day: String,
    pub timezone: String,
    pub next_run_at: Option<NaiveDateTime>,
    pub last_run_at: Option<NaiveDateTime>,
    pub is_enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<heads_up::Model> for HeadsUpResponse {
    fn from(model: heads_up::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            message: model.message,
            customer_id: model.customer_id,
            frequency: model.frequency,
            time_of_day: model.time_of_day,
            timezone: model.timezone,
            next_run_at: model.next_run_at,
            last_run_at: model.last_run_at,
            is_enabled: model.is_enabled,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

async fn find_heads_up(db: &DatabaseConnection, heads_up_id: i32) -> ApiResult<heads_up::Model> {
    heads_up::Entity::find_active_by_id(heads_up_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Heads-up", heads_up_id))
}

async fn set_enabled(db: &DatabaseConnection, heads_up_id: i32, enabled: bool) -> ApiResult<heads_up::Model> {
    let existing = find_heads_up(db, heads_up_id).await?;
    let mut active: heads_up::ActiveModel = existing.into();
    active.is_enabled = Set(enabled);
    let updated = active.update(db).await?;
    info!("Heads-up {} is_enabled set to {}", heads_up_id, enabled);
    Ok(updated)
}

/// Schedule a heads-up alert
#[utoipa::path(
    post,
    path = "/api/v1/heads-ups",
    tag = "heads-ups",
    request_body = CreateHeadsUpRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Heads-up created successfully", body = HeadsUpResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_heads_up(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateHeadsUpRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<HeadsUpResponse>>)> {
    if let Some(customer_id) = request.customer_id {
        find_customer(&state.db, customer_id).await?;
    }

    let created = heads_up::ActiveModel {
        title: Set(request.title.trim().to_string()),
        message: Set(request.message),
        customer_id: Set(request.customer_id),
        frequency: Set(request.frequency),
        time_of_day: Set(request.time_of_day),
        timezone: Set(request.timezone.trim().to_string()),
        next_run_at: Set(request.next_run_at),
        last_run_at: Set(None),
        is_enabled: Set(request.is_enabled.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Heads-up created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(HeadsUpResponse::from(created), "Heads-up created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/heads-ups",
    tag = "heads-ups",
    params(ListQuery, HeadsUpFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Heads-ups retrieved successfully", body = [HeadsUpResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_heads_ups(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<HeadsUpFilter>,
) -> ApiResult<Json<PaginatedResponse<HeadsUpResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = heads_up::Entity::find_active();
    if let Some(frequency) = filter.frequency {
        select = select.filter(heads_up::Column::Frequency.eq(frequency));
    }
    if let Some(customer_id) = filter.customer_id {
        select = select.filter(heads_up::Column::CustomerId.eq(customer_id));
    }
    if let Some(is_enabled) = filter.is_enabled {
        select = select.filter(heads_up::Column::IsEnabled.eq(is_enabled));
    }
    let select = apply_list_params(
        select,
        &params,
        &[heads_up::Column::Title, heads_up::Column::Message],
        None,
        heads_up::Column::Id,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} heads-ups", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(HeadsUpResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Heads-ups retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/heads-ups/{heads_up_id}",
    tag = "heads-ups",
    params(("heads_up_id" = i32, Path, description = "Heads-up ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Heads-up retrieved successfully", body = HeadsUpResponse),
        (status = 404, description = "Heads-up not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_heads_up(
    State(state): State<AppState>,
    Path(heads_up_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<HeadsUpResponse>>> {
    let heads_up = find_heads_up(&state.db, heads_up_id).await?;
    Ok(Json(ApiResponse::ok(HeadsUpResponse::from(heads_up), "Heads-up retrieved successfully")))
}

#[utoipa::path(
    put,
    path = "/api/v1/heads-ups/{heads_up_id}",
    tag = "heads-ups",
    params(("heads_up_id" = i32, Path, description = "Heads-up ID")),
    request_body = UpdateHeadsUpRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Heads-up updated successfully", body = HeadsUpResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Heads-up not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_heads_up(
    State(state): State<AppState>,
    Path(heads_up_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateHeadsUpRequest>,
) -> ApiResult<Json<ApiResponse<HeadsUpResponse>>> {
    let existing = find_heads_up(&state.db, heads_up_id).await?;
    let mut active: heads_up::ActiveModel = existing.into();

    if let Some(title) = request.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(message) = request.message {
        active.message = Set(Some(message));
    }
    if let Some(customer_id) = request.customer_id {
        find_customer(&state.db, customer_id).await?;
        active.customer_id = Set(Some(customer_id));
    }
    if let Some(frequency) = request.frequency {
        active.frequency = Set(frequency);
    }
    if let Some(time_of_day) = request.time_of_day {
        active.time_of_day = Set(time_of_day);
    }
    if let Some(timezone) = request.timezone {
        active.timezone = Set(timezone.trim().to_string());
    }
    if let Some(next_run_at) = request.next_run_at {
        active.next_run_at = Set(Some(next_run_at));
    }
    if let Some(is_enabled) = request.is_enabled {
        active.is_enabled = Set(is_enabled);
    }

    let updated = active.update(&state.db).await?;
    info!("Heads-up {} updated successfully", heads_up_id);
    Ok(Json(ApiResponse::ok(HeadsUpResponse::from(updated), "Heads-up updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/heads-ups/{heads_up_id}",
    tag = "heads-ups",
    params(("heads_up_id" = i32, Path, description = "Heads-up ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Heads-up deleted successfully"),
        (status = 404, description = "Heads-up not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_heads_up(
    State(state): State<AppState>,
    Path(heads_up_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !heads_up::Entity::soft_delete(&state.db, heads_up_id).await? {
        warn!("Heads-up with ID {} not found for deletion", heads_up_id);
        return Err(ApiError::not_found("Heads-up", heads_up_id));
    }
    info!("Heads-up {} deleted", heads_up_id);
    Ok(Json(ApiResponse::ok((), "Heads-up deleted successfully")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/heads-ups/{heads_up_id}/enable",
    tag = "heads-ups",
    params(("heads_up_id" = i32, Path, description = "Heads-up ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Heads-up enabled", body = HeadsUpResponse),
        (status = 404, description = "Heads-up not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn enable_heads_up(
    State(state): State<AppState>,
    Path(heads_up_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<HeadsUpResponse>>> {
    let updated = set_enabled(&state.db, heads_up_id, true).await?;
    Ok(Json(ApiResponse::ok(HeadsUpResponse::from(updated), "Heads-up enabled")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/heads-ups/{heads_up_id}/disable",
    tag = "heads-ups",
    params(("heads_up_id" = i32, Path, description = "Heads-up ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Heads-up disabled", body = HeadsUpResponse),
        (status = 404, description = "Heads-up not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn disable_heads_up(
    State(state): State<AppState>,
    Path(heads_up_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<HeadsUpResponse>>> {
    let updated = set_enabled(&state.db, heads_up_id, false).await?;
    Ok(Json(ApiResponse::ok(HeadsUpResponse::from(updated), "Heads-up disabled")))
}
