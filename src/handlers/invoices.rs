use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use model::entities::invoice::{self, InvoiceStatus};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::customers::find_customer;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::validators::{iso_currency_code, positive_amount};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateInvoiceRequest {
    pub customer_id: i32,
    pub matter_id: Option<i32>,
    #[validate(length(min = 1, max = 50, message = "Invoice number must be between 1 and 50 characters"))]
    pub invoice_number: String,
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = String, example = "1250.00")]
    pub amount: Decimal,
    #[validate(custom(function = "iso_currency_code"))]
    #[schema(example = "USD")]
    pub currency_code: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// `draft` (default), `sent`, `paid`, `overdue` or `cancelled`
    #[schema(value_type = Option<String>, example = "draft")]
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateInvoiceRequest {
    pub matter_id: Option<i32>,
    #[validate(length(min = 1, max = 50, message = "Invoice number must be between 1 and 50 characters"))]
    pub invoice_number: Option<String>,
    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    #[validate(custom(function = "iso_currency_code"))]
    pub currency_code: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

/// Filters for the invoice list. The date bounds apply to `issue_date`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    #[param(value_type = Option<String>)]
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<i32>,
    pub matter_id: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: i32,
    pub customer_id: i32,
    pub matter_id: Option<i32>,
    pub invoice_number: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub currency_code: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    #[schema(value_type = String)]
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<invoice::Model> for InvoiceResponse {
    fn from(model: invoice::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            matter_id: model.matter_id,
            invoice_number: model.invoice_number,
            amount: model.amount,
            currency_code: model.currency_code,
            issue_date: model.issue_date,
            due_date: model.due_date,
            status: model.status,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub(crate) async fn find_invoice(db: &DatabaseConnection, invoice_id: i32) -> ApiResult<invoice::Model> {
    invoice::Entity::find_active_by_id(invoice_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", invoice_id))
}

fn check_due_date(issue_date: NaiveDate, due_date: Option<NaiveDate>) -> ApiResult<()> {
    match due_date {
        Some(due) if due < issue_date => Err(ApiError::Validation(
            "Due date cannot be before issue date".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Create a new invoice for an existing customer
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    tag = "invoices",
    request_body = CreateInvoiceRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Invoice created successfully", body = InvoiceResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_invoice(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<InvoiceResponse>>)> {
    trace!("Entering create_invoice function");
    check_due_date(request.issue_date, request.due_date)?;
    find_customer(&state.db, request.customer_id).await?;

    let created = invoice::ActiveModel {
        customer_id: Set(request.customer_id),
        matter_id: Set(request.matter_id),
        invoice_number: Set(request.invoice_number.trim().to_string()),
        amount: Set(request.amount),
        currency_code: Set(request.currency_code.trim().to_ascii_uppercase()),
        issue_date: Set(request.issue_date),
        due_date: Set(request.due_date),
        status: Set(request.status.unwrap_or(InvoiceStatus::Draft)),
        notes: Set(request.notes),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Invoice {} created with ID: {}", created.invoice_number, created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(InvoiceResponse::from(created), "Invoice created successfully")),
    ))
}

/// List invoices
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    tag = "invoices",
    params(ListQuery, InvoiceFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Invoices retrieved successfully", body = [InvoiceResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_invoices(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<InvoiceFilter>,
) -> ApiResult<Json<PaginatedResponse<InvoiceResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = invoice::Entity::find_active();
    if let Some(status) = filter.status {
        select = select.filter(invoice::Column::Status.eq(status));
    }
    if let Some(customer_id) = filter.customer_id {
        select = select.filter(invoice::Column::CustomerId.eq(customer_id));
    }
    if let Some(matter_id) = filter.matter_id {
        select = select.filter(invoice::Column::MatterId.eq(matter_id));
    }
    if let Some(start_date) = filter.start_date {
        select = select.filter(invoice::Column::IssueDate.gte(start_date));
    }
    if let Some(end_date) = filter.end_date {
        select = select.filter(invoice::Column::IssueDate.lte(end_date));
    }
    let select = apply_list_params(
        select,
        &params,
        &[invoice::Column::InvoiceNumber, invoice::Column::Notes],
        None,
        invoice::Column::CreatedAt,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} invoices", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(InvoiceResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Invoices retrieved successfully",
    )))
}

/// Get an invoice by ID
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{invoice_id}",
    tag = "invoices",
    params(("invoice_id" = i32, Path, description = "Invoice ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Invoice retrieved successfully", body = InvoiceResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<InvoiceResponse>>> {
    let invoice = find_invoice(&state.db, invoice_id).await?;
    Ok(Json(ApiResponse::ok(InvoiceResponse::from(invoice), "Invoice retrieved successfully")))
}

/// Update an invoice
#[utoipa::path(
    put,
    path = "/api/v1/invoices/{invoice_id}",
    tag = "invoices",
    params(("invoice_id" = i32, Path, description = "Invoice ID")),
    request_body = UpdateInvoiceRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Invoice updated successfully", body = InvoiceResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateInvoiceRequest>,
) -> ApiResult<Json<ApiResponse<InvoiceResponse>>> {
    let existing = find_invoice(&state.db, invoice_id).await?;
    check_due_date(
        request.issue_date.unwrap_or(existing.issue_date),
        request.due_date.or(existing.due_date),
    )?;
    let mut active: invoice::ActiveModel = existing.into();

    if let Some(matter_id) = request.matter_id {
        active.matter_id = Set(Some(matter_id));
    }
    if let Some(invoice_number) = request.invoice_number {
        active.invoice_number = Set(invoice_number.trim().to_string());
    }
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(currency_code) = request.currency_code {
        active.currency_code = Set(currency_code.trim().to_ascii_uppercase());
    }
    if let Some(issue_date) = request.issue_date {
        active.issue_date = Set(issue_date);
    }
    if let Some(due_date) = request.due_date {
        active.due_date = Set(Some(due_date));
    }
    if let Some(status) = request.status {
        active.status = Set(status);
    }
    if let Some(notes) = request.notes {
        active.notes = Set(Some(notes));
    }

    let updated = active.update(&state.db).await?;
    info!("Invoice {} updated successfully", invoice_id);
    Ok(Json(ApiResponse::ok(InvoiceResponse::from(updated), "Invoice updated successfully")))
}

/// Soft-delete an invoice
#[utoipa::path(
    delete,
    path = "/api/v1/invoices/{invoice_id}",
    tag = "invoices",
    params(("invoice_id" = i32, Path, description = "Invoice ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Invoice deleted successfully"),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !invoice::Entity::soft_delete(&state.db, invoice_id).await? {
        warn!("Invoice with ID {} not found for deletion", invoice_id);
        return Err(ApiError::not_found("Invoice", invoice_id));
    }
    info!("Invoice {} deleted", invoice_id);
    Ok(Json(ApiResponse::ok((), "Invoice deleted successfully")))
}
