use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::customer::{self, CustomerStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 200, message = "Company must be at most 200 characters"))]
    pub company: Option<String>,
    pub address: Option<String>,
    pub business_type_id: Option<i32>,
    /// `active` (default), `inactive` or `lead`
    #[schema(value_type = Option<String>, example = "active")]
    pub status: Option<CustomerStatus>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 200, message = "Company must be at most 200 characters"))]
    pub company: Option<String>,
    pub address: Option<String>,
    pub business_type_id: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub status: Option<CustomerStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    #[param(value_type = Option<String>)]
    pub status: Option<CustomerStatus>,
    pub business_type_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub business_type_id: Option<i32>,
    #[schema(value_type = String)]
    pub status: CustomerStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<customer::Model> for CustomerResponse {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            company: model.company,
            address: model.address,
            business_type_id: model.business_type_id,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Live customer by id, used by every customer-owned resource before it
/// stores a `customer_id`.
pub(crate) async fn find_customer(db: &DatabaseConnection, customer_id: i32) -> ApiResult<customer::Model> {
    customer::Entity::find_active_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!("Customer with ID {} not found", customer_id);
            ApiError::not_found("Customer", customer_id)
        })
}

/// Create a new customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "customers",
    request_body = CreateCustomerRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Customer created successfully", body = CustomerResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_customer(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CustomerResponse>>)> {
    trace!("Entering create_customer function");

    let created = customer::ActiveModel {
        name: Set(request.name.trim().to_string()),
        email: Set(request.email),
        phone: Set(request.phone),
        company: Set(request.company),
        address: Set(request.address),
        business_type_id: Set(request.business_type_id),
        status: Set(request.status.unwrap_or(CustomerStatus::Active)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Customer created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CustomerResponse::from(created), "Customer created successfully")),
    ))
}

/// List customers. A search term ranks exact and prefix name matches first.
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    tag = "customers",
    params(ListQuery, CustomerFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Customers retrieved successfully", body = [CustomerResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_customers(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<CustomerFilter>,
) -> ApiResult<Json<PaginatedResponse<CustomerResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = customer::Entity::find_active();
    if let Some(status) = filter.status {
        select = select.filter(customer::Column::Status.eq(status));
    }
    if let Some(business_type_id) = filter.business_type_id {
        select = select.filter(customer::Column::BusinessTypeId.eq(business_type_id));
    }
    let select = apply_list_params(
        select,
        &params,
        &[
            customer::Column::Name,
            customer::Column::Email,
            customer::Column::Company,
            customer::Column::Phone,
        ],
        Some(customer::Column::Name),
        customer::Column::CreatedAt,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} customers", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(CustomerResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Customers retrieved successfully",
    )))
}

/// Get a customer by ID
#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer_id}",
    tag = "customers",
    params(("customer_id" = i32, Path, description = "Customer ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Customer retrieved successfully", body = CustomerResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<CustomerResponse>>> {
    let customer = find_customer(&state.db, customer_id).await?;
    Ok(Json(ApiResponse::ok(CustomerResponse::from(customer), "Customer retrieved successfully")))
}

/// Update a customer
#[utoipa::path(
    put,
    path = "/api/v1/customers/{customer_id}",
    tag = "customers",
    params(("customer_id" = i32, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Customer updated successfully", body = CustomerResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateCustomerRequest>,
) -> ApiResult<Json<ApiResponse<CustomerResponse>>> {
    let existing = find_customer(&state.db, customer_id).await?;
    let mut active: customer::ActiveModel = existing.into();

    if let Some(name) = request.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = request.email {
        active.email = Set(Some(email));
    }
    if let Some(phone) = request.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(company) = request.company {
        active.company = Set(Some(company));
    }
    if let Some(address) = request.address {
        active.address = Set(Some(address));
    }
    if let Some(business_type_id) = request.business_type_id {
        active.business_type_id = Set(Some(business_type_id));
    }
    if let Some(status) = request.status {
        active.status = Set(status);
    }

    let updated = active.update(&state.db).await?;
    info!("Customer {} updated successfully", customer_id);
    Ok(Json(ApiResponse::ok(CustomerResponse::from(updated), "Customer updated successfully")))
}

/// Soft-delete a customer
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{customer_id}",
    tag = "customers",
    params(("customer_id" = i32, Path, description = "Customer ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Customer deleted successfully"),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !customer::Entity::soft_delete(&state.db, customer_id).await? {
        warn!("Customer with ID {} not found for deletion", customer_id);
        return Err(ApiError::not_found("Customer", customer_id));
    }
    info!("Customer {} deleted", customer_id);
    Ok(Json(ApiResponse::ok((), "Customer deleted successfully")))
}
