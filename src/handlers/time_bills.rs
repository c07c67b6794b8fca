use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use compute::time_bill::{
    calendar_summary, checked_line_amount, line_amount, parse_duration_hours, CalendarRange, CalendarSummary,
};
use model::entities::time_bill::{self, TimeBillStatus};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::handlers::customers::find_customer;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateTimeBillRequest {
    pub customer_id: i32,
    pub matter_id: Option<i32>,
    /// Defaults to the calling user
    pub user_id: Option<i32>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub date_of_work: Option<NaiveDate>,
    /// `H:MM` or decimal hours, e.g. `1:30` or `1.5`
    #[validate(length(min = 1, max = 20, message = "Duration is required"))]
    #[schema(example = "1:30")]
    pub duration: String,
    #[validate(length(min = 1, max = 20, message = "Hourly rate is required"))]
    #[schema(example = "100")]
    pub hourly_rate: String,
    /// `pending` (default), `approved` or `billed`
    #[schema(value_type = Option<String>, example = "pending")]
    pub status: Option<TimeBillStatus>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateTimeBillRequest {
    pub matter_id: Option<i32>,
    pub user_id: Option<i32>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub date_of_work: Option<NaiveDate>,
    #[validate(length(min = 1, max = 20, message = "Duration is required"))]
    pub duration: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Hourly rate is required"))]
    pub hourly_rate: Option<String>,
    #[schema(value_type = Option<String>)]
    pub status: Option<TimeBillStatus>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct BulkDeleteRequest {
    #[validate(length(min = 1, message = "At least one ID is required"))]
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}

/// Filters for the time-bill list. The date bounds apply to `date_of_work`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimeBillFilter {
    #[param(value_type = Option<String>)]
    pub status: Option<TimeBillStatus>,
    pub customer_id: Option<i32>,
    pub matter_id: Option<i32>,
    pub user_id: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Calendar range. Missing bounds default to the current month.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[param(value_type = Option<String>)]
    pub status: Option<TimeBillStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeBillResponse {
    pub id: i32,
    pub customer_id: i32,
    pub matter_id: Option<i32>,
    pub user_id: Option<i32>,
    pub description: Option<String>,
    pub date_of_work: Option<NaiveDate>,
    pub duration: String,
    pub hourly_rate: String,
    /// Duration in decimal hours
    #[schema(value_type = String)]
    pub hours: Decimal,
    /// Hours times hourly rate
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub status: TimeBillStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<time_bill::Model> for TimeBillResponse {
    fn from(model: time_bill::Model) -> Self {
        Self {
            hours: parse_duration_hours(&model.duration).round_dp(2),
            amount: line_amount(&model.duration, &model.hourly_rate).round_dp(2),
            id: model.id,
            customer_id: model.customer_id,
            matter_id: model.matter_id,
            user_id: model.user_id,
            description: model.description,
            date_of_work: model.date_of_work,
            duration: model.duration,
            hourly_rate: model.hourly_rate,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalendarDay {
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub total_hours: Decimal,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub entries: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalendarResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<CalendarDay>,
    #[schema(value_type = String)]
    pub total_hours: Decimal,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub total_entries: usize,
}

impl From<CalendarSummary> for CalendarResponse {
    fn from(summary: CalendarSummary) -> Self {
        Self {
            start_date: summary.range.start,
            end_date: summary.range.end,
            days: summary
                .days
                .into_iter()
                .map(|day| CalendarDay {
                    date: day.date,
                    total_hours: day.total_hours,
                    total_amount: day.total_amount,
                    entries: day.entries,
                })
                .collect(),
            total_hours: summary.total_hours,
            total_amount: summary.total_amount,
            total_entries: summary.total_entries,
        }
    }
}

fn ensure_amount_fits(duration: &str, hourly_rate: &str) -> ApiResult<()> {
    match checked_line_amount(duration, hourly_rate) {
        Some(_) => Ok(()),
        None => Err(ApiError::Validation(
            "Duration times hourly rate is too large".to_string(),
        )),
    }
}

async fn find_time_bill(db: &DatabaseConnection, time_bill_id: i32) -> ApiResult<time_bill::Model> {
    time_bill::Entity::find_active_by_id(time_bill_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Time bill", time_bill_id))
}

/// Record time worked for a customer
#[utoipa::path(
    post,
    path = "/api/v1/time-bills",
    tag = "time-bills",
    request_body = CreateTimeBillRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Time bill created successfully", body = TimeBillResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_time_bill(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ValidatedJson(request): ValidatedJson<CreateTimeBillRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TimeBillResponse>>)> {
    trace!("Entering create_time_bill function");
    find_customer(&state.db, request.customer_id).await?;
    let duration = request.duration.trim().to_string();
    let hourly_rate = request.hourly_rate.trim().to_string();
    ensure_amount_fits(&duration, &hourly_rate)?;

    let created = time_bill::ActiveModel {
        customer_id: Set(request.customer_id),
        matter_id: Set(request.matter_id),
        user_id: Set(Some(request.user_id.unwrap_or(current.id))),
        description: Set(request.description),
        date_of_work: Set(request.date_of_work),
        duration: Set(duration),
        hourly_rate: Set(hourly_rate),
        status: Set(request.status.unwrap_or(TimeBillStatus::Pending)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Time bill created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(TimeBillResponse::from(created), "Time bill created successfully")),
    ))
}

/// List time bills
#[utoipa::path(
    get,
    path = "/api/v1/time-bills",
    tag = "time-bills",
    params(ListQuery, TimeBillFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Time bills retrieved successfully", body = [TimeBillResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_time_bills(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<TimeBillFilter>,
) -> ApiResult<Json<PaginatedResponse<TimeBillResponse>>> {
    let params = list.resolve(20, SortOrder::Desc);
    let mut select = time_bill::Entity::find_active();
    if let Some(status) = filter.status {
        select = select.filter(time_bill::Column::Status.eq(status));
    }
    if let Some(customer_id) = filter.customer_id {
        select = select.filter(time_bill::Column::CustomerId.eq(customer_id));
    }
    if let Some(matter_id) = filter.matter_id {
        select = select.filter(time_bill::Column::MatterId.eq(matter_id));
    }
    if let Some(user_id) = filter.user_id {
        select = select.filter(time_bill::Column::UserId.eq(user_id));
    }
    if let Some(start_date) = filter.start_date {
        select = select.filter(time_bill::Column::DateOfWork.gte(start_date));
    }
    if let Some(end_date) = filter.end_date {
        select = select.filter(time_bill::Column::DateOfWork.lte(end_date));
    }
    let select = apply_list_params(
        select,
        &params,
        &[time_bill::Column::Description],
        None,
        time_bill::Column::CreatedAt,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} time bills", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(TimeBillResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Time bills retrieved successfully",
    )))
}

/// Get a time bill by ID
#[utoipa::path(
    get,
    path = "/api/v1/time-bills/{time_bill_id}",
    tag = "time-bills",
    params(("time_bill_id" = i32, Path, description = "Time bill ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Time bill retrieved successfully", body = TimeBillResponse),
        (status = 404, description = "Time bill not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_time_bill(
    State(state): State<AppState>,
    Path(time_bill_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<TimeBillResponse>>> {
    let bill = find_time_bill(&state.db, time_bill_id).await?;
    Ok(Json(ApiResponse::ok(TimeBillResponse::from(bill), "Time bill retrieved successfully")))
}

/// Update a time bill
#[utoipa::path(
    put,
    path = "/api/v1/time-bills/{time_bill_id}",
    tag = "time-bills",
    params(("time_bill_id" = i32, Path, description = "Time bill ID")),
    request_body = UpdateTimeBillRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Time bill updated successfully", body = TimeBillResponse),
        (status = 404, description = "Time bill not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_time_bill(
    State(state): State<AppState>,
    Path(time_bill_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateTimeBillRequest>,
) -> ApiResult<Json<ApiResponse<TimeBillResponse>>> {
    let existing = find_time_bill(&state.db, time_bill_id).await?;
    let duration = request
        .duration
        .as_deref()
        .map_or(existing.duration.clone(), |d| d.trim().to_string());
    let hourly_rate = request
        .hourly_rate
        .as_deref()
        .map_or(existing.hourly_rate.clone(), |r| r.trim().to_string());
    ensure_amount_fits(&duration, &hourly_rate)?;
    let mut active: time_bill::ActiveModel = existing.into();

    if let Some(matter_id) = request.matter_id {
        active.matter_id = Set(Some(matter_id));
    }
    if let Some(user_id) = request.user_id {
        active.user_id = Set(Some(user_id));
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(date_of_work) = request.date_of_work {
        active.date_of_work = Set(Some(date_of_work));
    }
    active.duration = Set(duration);
    active.hourly_rate = Set(hourly_rate);
    if let Some(status) = request.status {
        active.status = Set(status);
    }

    let updated = active.update(&state.db).await?;
    info!("Time bill {} updated successfully", time_bill_id);
    Ok(Json(ApiResponse::ok(TimeBillResponse::from(updated), "Time bill updated successfully")))
}

/// Permanently delete a time bill
#[utoipa::path(
    delete,
    path = "/api/v1/time-bills/{time_bill_id}",
    tag = "time-bills",
    params(("time_bill_id" = i32, Path, description = "Time bill ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Time bill deleted successfully"),
        (status = 404, description = "Time bill not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_time_bill(
    State(state): State<AppState>,
    Path(time_bill_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let result = time_bill::Entity::delete_by_id(time_bill_id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        warn!("Time bill with ID {} not found for deletion", time_bill_id);
        return Err(ApiError::not_found("Time bill", time_bill_id));
    }
    info!("Time bill {} deleted", time_bill_id);
    Ok(Json(ApiResponse::ok((), "Time bill deleted successfully")))
}

/// Permanently delete several time bills. Unknown IDs are skipped.
#[utoipa::path(
    post,
    path = "/api/v1/time-bills/bulk-delete",
    tag = "time-bills",
    request_body = BulkDeleteRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Time bills deleted", body = BulkDeleteResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn bulk_delete_time_bills(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<BulkDeleteRequest>,
) -> ApiResult<Json<ApiResponse<BulkDeleteResponse>>> {
    let result = time_bill::Entity::delete_many()
        .filter(time_bill::Column::Id.is_in(request.ids.clone()))
        .exec(&state.db)
        .await?;

    info!("Bulk deleted {} of {} requested time bills", result.rows_affected, request.ids.len());
    Ok(Json(ApiResponse::ok(
        BulkDeleteResponse {
            deleted: result.rows_affected,
        },
        "Time bills deleted successfully",
    )))
}

/// Per-day hours and amounts for a date range
#[utoipa::path(
    get,
    path = "/api/v1/time-bills/calendar",
    tag = "time-bills",
    params(CalendarQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Calendar summary", body = CalendarResponse),
        (status = 400, description = "Start date after end date", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_time_bill_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<ApiResponse<CalendarResponse>>> {
    let today = Utc::now().date_naive();
    let range = CalendarRange::resolve(query.start_date, query.end_date, today)?;
    let summary = calendar_summary(&state.db, range, query.status).await?;

    debug!(
        "Calendar {}..{}: {} entries over {} days",
        range.start,
        range.end,
        summary.total_entries,
        summary.days.len()
    );
    Ok(Json(ApiResponse::ok(
        CalendarResponse::from(summary),
        "Time bill calendar retrieved successfully",
    )))
}
