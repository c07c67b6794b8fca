use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::currency;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::validators::{currency_defaults, iso_currency_code, non_negative_rate};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCurrencyRequest {
    /// ISO 4217 code, stored upper-case
    #[validate(custom(function = "iso_currency_code"))]
    #[schema(example = "EUR")]
    pub currency_code: String,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    /// Defaults to the ISO symbol of the code
    #[validate(length(max = 10, message = "Symbol must be at most 10 characters"))]
    pub symbol: Option<String>,
    /// Defaults to 1
    #[validate(custom(function = "non_negative_rate"))]
    #[schema(value_type = Option<String>, example = "1.08")]
    pub exchange_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateCurrencyRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 10, message = "Symbol must be at most 10 characters"))]
    pub symbol: Option<String>,
    #[validate(custom(function = "non_negative_rate"))]
    #[schema(value_type = Option<String>)]
    pub exchange_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct BulkCurrencyRequest {
    #[validate(length(min = 1, message = "At least one currency is required"))]
    pub currencies: Vec<CreateCurrencyRequest>,
}

/// A batch item that was not created
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BulkCurrencyError {
    /// Position of the item in the request
    pub index: usize,
    pub currency_code: String,
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkCurrencyResponse {
    pub created: Vec<CurrencyResponse>,
    pub errors: Vec<BulkCurrencyError>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CurrencyFilter {
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrencyResponse {
    pub id: i32,
    pub currency_code: String,
    pub name: String,
    pub symbol: Option<String>,
    #[schema(value_type = String)]
    pub exchange_rate: Decimal,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<currency::Model> for CurrencyResponse {
    fn from(model: currency::Model) -> Self {
        Self {
            id: model.id,
            currency_code: model.currency_code,
            name: model.name,
            symbol: model.symbol,
            exchange_rate: model.exchange_rate,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

async fn find_currency(db: &DatabaseConnection, currency_id: i32) -> ApiResult<currency::Model> {
    currency::Entity::find_active_by_id(currency_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Currency", currency_id))
}

/// Checks live-row uniqueness of the code, then inserts. The code must
/// already be validated.
async fn insert_currency(db: &DatabaseConnection, request: CreateCurrencyRequest) -> ApiResult<currency::Model> {
    let (code, iso_symbol) = currency_defaults(&request.currency_code);

    let taken = currency::Entity::find_active()
        .filter(currency::Column::CurrencyCode.eq(code.as_str()))
        .one(db)
        .await?;
    if taken.is_some() {
        warn!("Currency code {} already exists", code);
        return Err(ApiError::Conflict(format!("Currency with code '{code}' already exists")));
    }

    let symbol = request.symbol.or_else(|| iso_symbol.map(str::to_string));
    let created = currency::ActiveModel {
        currency_code: Set(code),
        name: Set(request.name.trim().to_string()),
        symbol: Set(symbol),
        exchange_rate: Set(request.exchange_rate.unwrap_or(Decimal::ONE)),
        is_active: Set(request.is_active.unwrap_or(true)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(created)
}

/// Create a currency
#[utoipa::path(
    post,
    path = "/api/v1/currencies",
    tag = "currencies",
    request_body = CreateCurrencyRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Currency created successfully", body = CurrencyResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Currency code already exists", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_currency(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCurrencyRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CurrencyResponse>>)> {
    trace!("Entering create_currency function");
    let created = insert_currency(&state.db, request).await?;

    info!("Currency {} created with ID: {}", created.currency_code, created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CurrencyResponse::from(created), "Currency created successfully")),
    ))
}

/// Create several currencies. Each item is validated and checked on its own;
/// rejected items are reported and the rest are still created.
#[utoipa::path(
    post,
    path = "/api/v1/currencies/bulk",
    tag = "currencies",
    request_body = BulkCurrencyRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "At least one currency created", body = BulkCurrencyResponse),
        (status = 200, description = "No currency created", body = BulkCurrencyResponse),
        (status = 400, description = "Empty batch", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn bulk_create_currencies(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<BulkCurrencyRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<BulkCurrencyResponse>>)> {
    let requested = request.currencies.len();
    let mut seen = HashSet::new();
    let mut created = Vec::new();
    let mut errors = Vec::new();

    for (index, item) in request.currencies.into_iter().enumerate() {
        let currency_code = item.currency_code.clone();
        let outcome = match item.validate() {
            Err(invalid) => Err(ApiError::from(invalid)),
            Ok(()) => {
                let (code, _) = currency_defaults(&item.currency_code);
                if seen.insert(code.clone()) {
                    insert_currency(&state.db, item).await
                } else {
                    Err(ApiError::Conflict(format!("Duplicate currency code '{code}' in request")))
                }
            }
        };

        match outcome {
            Ok(model) => created.push(CurrencyResponse::from(model)),
            Err(err @ (ApiError::Validation(_) | ApiError::Conflict(_))) => {
                debug!("Bulk currency item {} rejected: {}", index, err);
                errors.push(BulkCurrencyError {
                    index,
                    currency_code,
                    error: err.user_message(),
                });
            }
            Err(other) => return Err(other),
        }
    }

    info!("Bulk currency import: {} of {} created", created.len(), requested);
    let status = if created.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let message = format!("{} of {} currencies created", created.len(), requested);
    Ok((
        status,
        Json(ApiResponse::ok(BulkCurrencyResponse { created, errors }, &message)),
    ))
}

/// List currencies by code
#[utoipa::path(
    get,
    path = "/api/v1/currencies",
    tag = "currencies",
    params(ListQuery, CurrencyFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Currencies retrieved successfully", body = [CurrencyResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_currencies(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<CurrencyFilter>,
) -> ApiResult<Json<PaginatedResponse<CurrencyResponse>>> {
    let params = list.resolve(20, SortOrder::Asc);
    let mut select = currency::Entity::find_active();
    if let Some(is_active) = filter.is_active {
        select = select.filter(currency::Column::IsActive.eq(is_active));
    }
    let select = apply_list_params(
        select,
        &params,
        &[currency::Column::CurrencyCode, currency::Column::Name],
        None,
        currency::Column::CurrencyCode,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} currencies", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(CurrencyResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Currencies retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/currencies/{currency_id}",
    tag = "currencies",
    params(("currency_id" = i32, Path, description = "Currency ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Currency retrieved successfully", body = CurrencyResponse),
        (status = 404, description = "Currency not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_currency(
    State(state): State<AppState>,
    Path(currency_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<CurrencyResponse>>> {
    let currency = find_currency(&state.db, currency_id).await?;
    Ok(Json(ApiResponse::ok(CurrencyResponse::from(currency), "Currency retrieved successfully")))
}

/// Update a currency. The code itself cannot change.
#[utoipa::path(
    put,
    path = "/api/v1/currencies/{currency_id}",
    tag = "currencies",
    params(("currency_id" = i32, Path, description = "Currency ID")),
    request_body = UpdateCurrencyRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Currency updated successfully", body = CurrencyResponse),
        (status = 404, description = "Currency not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_currency(
    State(state): State<AppState>,
    Path(currency_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateCurrencyRequest>,
) -> ApiResult<Json<ApiResponse<CurrencyResponse>>> {
    let existing = find_currency(&state.db, currency_id).await?;
    let mut active: currency::ActiveModel = existing.into();

    if let Some(name) = request.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(symbol) = request.symbol {
        active.symbol = Set(Some(symbol));
    }
    if let Some(exchange_rate) = request.exchange_rate {
        active.exchange_rate = Set(exchange_rate);
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active.update(&state.db).await?;
    info!("Currency {} updated successfully", currency_id);
    Ok(Json(ApiResponse::ok(CurrencyResponse::from(updated), "Currency updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/currencies/{currency_id}",
    tag = "currencies",
    params(("currency_id" = i32, Path, description = "Currency ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Currency deleted successfully"),
        (status = 404, description = "Currency not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_currency(
    State(state): State<AppState>,
    Path(currency_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !currency::Entity::soft_delete(&state.db, currency_id).await? {
        warn!("Currency with ID {} not found for deletion", currency_id);
        return Err(ApiError::not_found("Currency", currency_id));
    }
    info!("Currency {} deleted", currency_id);
    Ok(Json(ApiResponse::ok((), "Currency deleted successfully")))
}

/// Flip the active flag of a currency
#[utoipa::path(
    patch,
    path = "/api/v1/currencies/{currency_id}/status",
    tag = "currencies",
    params(("currency_id" = i32, Path, description = "Currency ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Status toggled", body = CurrencyResponse),
        (status = 404, description = "Currency not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn toggle_currency_status(
    State(state): State<AppState>,
    Path(currency_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<CurrencyResponse>>> {
    let existing = find_currency(&state.db, currency_id).await?;
    let is_active = !existing.is_active;
    let mut active: currency::ActiveModel = existing.into();
    active.is_active = Set(is_active);
    let updated = active.update(&state.db).await?;

    info!("Currency {} is_active set to {}", currency_id, is_active);
    Ok(Json(ApiResponse::ok(CurrencyResponse::from(updated), "Currency status updated")))
}
