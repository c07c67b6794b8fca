use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use model::entities::installment::{self, InstallmentStatus};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::invoices::find_invoice;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::validators::positive_amount;
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

/// The customer is taken from the invoice.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateInstallmentRequest {
    pub invoice_id: i32,
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = String, example = "250.00")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateInstallmentRequest {
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    /// Setting `pending` clears `paid_at`
    #[schema(value_type = Option<String>)]
    pub status: Option<InstallmentStatus>,
}

/// Filters for the installment list. The date bounds apply to `due_date`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstallmentFilter {
    #[param(value_type = Option<String>)]
    pub status: Option<InstallmentStatus>,
    pub invoice_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstallmentResponse {
    pub id: i32,
    pub invoice_id: i32,
    pub customer_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[schema(value_type = String)]
    pub status: InstallmentStatus,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<installment::Model> for InstallmentResponse {
    fn from(model: installment::Model) -> Self {
        Self {
            id: model.id,
            invoice_id: model.invoice_id,
            customer_id: model.customer_id,
            amount: model.amount,
            due_date: model.due_date,
            status: model.status,
            paid_at: model.paid_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

async fn find_installment(db: &DatabaseConnection, installment_id: i32) -> ApiResult<installment::Model> {
    installment::Entity::find_active_by_id(installment_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Installment", installment_id))
}

/// Create an installment of an existing invoice
#[utoipa::path(
    post,
    path = "/api/v1/installments",
    tag = "invoices",
    request_body = CreateInstallmentRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Installment created successfully", body = InstallmentResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_installment(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateInstallmentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<InstallmentResponse>>)> {
    trace!("Entering create_installment function");
    let invoice = find_invoice(&state.db, request.invoice_id).await?;

    let created = installment::ActiveModel {
        invoice_id: Set(invoice.id),
        customer_id: Set(invoice.customer_id),
        amount: Set(request.amount),
        due_date: Set(request.due_date),
        status: Set(InstallmentStatus::Pending),
        paid_at: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Installment created with ID: {} for invoice {}", created.id, invoice.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(InstallmentResponse::from(created), "Installment created successfully")),
    ))
}

/// List installments, earliest due first
#[utoipa::path(
    get,
    path = "/api/v1/installments",
    tag = "invoices",
    params(ListQuery, InstallmentFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Installments retrieved successfully", body = [InstallmentResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_installments(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<InstallmentFilter>,
) -> ApiResult<Json<PaginatedResponse<InstallmentResponse>>> {
    let params = list.resolve(20, SortOrder::Asc);
    let mut select = installment::Entity::find_active();
    if let Some(status) = filter.status {
        select = select.filter(installment::Column::Status.eq(status));
    }
    if let Some(invoice_id) = filter.invoice_id {
        select = select.filter(installment::Column::InvoiceId.eq(invoice_id));
    }
    if let Some(customer_id) = filter.customer_id {
        select = select.filter(installment::Column::CustomerId.eq(customer_id));
    }
    if let Some(start_date) = filter.start_date {
        select = select.filter(installment::Column::DueDate.gte(start_date));
    }
    if let Some(end_date) = filter.end_date {
        select = select.filter(installment::Column::DueDate.lte(end_date));
    }
    // Installments carry no free text; `search` is accepted and ignored.
    let select = apply_list_params::<_, installment::Column>(
        select,
        &params,
        &[],
        None,
        installment::Column::DueDate,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} installments", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(InstallmentResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Installments retrieved successfully",
    )))
}

/// Get an installment by ID
#[utoipa::path(
    get,
    path = "/api/v1/installments/{installment_id}",
    tag = "invoices",
    params(("installment_id" = i32, Path, description = "Installment ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Installment retrieved successfully", body = InstallmentResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_installment(
    State(state): State<AppState>,
    Path(installment_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<InstallmentResponse>>> {
    let installment = find_installment(&state.db, installment_id).await?;
    Ok(Json(ApiResponse::ok(
        InstallmentResponse::from(installment),
        "Installment retrieved successfully",
    )))
}

/// Update an installment
#[utoipa::path(
    put,
    path = "/api/v1/installments/{installment_id}",
    tag = "invoices",
    params(("installment_id" = i32, Path, description = "Installment ID")),
    request_body = UpdateInstallmentRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Installment updated successfully", body = InstallmentResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_installment(
    State(state): State<AppState>,
    Path(installment_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateInstallmentRequest>,
) -> ApiResult<Json<ApiResponse<InstallmentResponse>>> {
    let existing = find_installment(&state.db, installment_id).await?;
    let mut active: installment::ActiveModel = existing.into();

    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(due_date) = request.due_date {
        active.due_date = Set(due_date);
    }
    match request.status {
        Some(InstallmentStatus::Paid) => {
            active.status = Set(InstallmentStatus::Paid);
            active.paid_at = Set(Some(Utc::now().naive_utc()));
        }
        Some(InstallmentStatus::Pending) => {
            active.status = Set(InstallmentStatus::Pending);
            active.paid_at = Set(None);
        }
        None => {}
    }

    let updated = active.update(&state.db).await?;
    info!("Installment {} updated successfully", installment_id);
    Ok(Json(ApiResponse::ok(
        InstallmentResponse::from(updated),
        "Installment updated successfully",
    )))
}

/// Permanently delete an installment
#[utoipa::path(
    delete,
    path = "/api/v1/installments/{installment_id}",
    tag = "invoices",
    params(("installment_id" = i32, Path, description = "Installment ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Installment deleted successfully"),
        (status = 404, description = "Installment not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_installment(
    State(state): State<AppState>,
    Path(installment_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let result = installment::Entity::delete_by_id(installment_id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        warn!("Installment with ID {} not found for deletion", installment_id);
        return Err(ApiError::not_found("Installment", installment_id));
    }
    info!("Installment {} deleted", installment_id);
    Ok(Json(ApiResponse::ok((), "Installment deleted successfully")))
}

/// Mark an installment as paid now
#[utoipa::path(
    patch,
    path = "/api/v1/installments/{installment_id}/pay",
    tag = "invoices",
    params(("installment_id" = i32, Path, description = "Installment ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Installment marked as paid", body = InstallmentResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn pay_installment(
    State(state): State<AppState>,
    Path(installment_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<InstallmentResponse>>> {
    let existing = find_installment(&state.db, installment_id).await?;
    let mut active: installment::ActiveModel = existing.into();
    active.status = Set(InstallmentStatus::Paid);
    active.paid_at = Set(Some(Utc::now().naive_utc()));

    let updated = active.update(&state.db).await?;
    info!("Installment {} marked as paid", installment_id);
    Ok(Json(ApiResponse::ok(InstallmentResponse::from(updated), "Installment marked as paid")))
}
