use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

pub use common::{ApiResponse, ErrorResponse, PaginatedResponse};

use crate::auth::notifier::Notifier;
use crate::config::AppConfig;
use crate::handlers;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    /// Delivery channel for one-time passwords
    pub notifier: Arc<dyn Notifier>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::auth::my_permissions,
        handlers::auth::request_otp,
        handlers::auth::verify_otp,
        handlers::users::create_user,
        handlers::users::get_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::get_user_permissions,
        handlers::users::assign_user_group,
        handlers::user_groups::create_user_group,
        handlers::user_groups::get_user_groups,
        handlers::user_groups::get_user_group,
        handlers::user_groups::update_user_group,
        handlers::user_groups::delete_user_group,
        handlers::user_groups::get_group_users,
        handlers::user_groups::toggle_user_group_status,
        handlers::user_groups::upsert_group_permission,
        handlers::user_groups::remove_group_permission,
        handlers::customers::create_customer,
        handlers::customers::get_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::matters::create_matter,
        handlers::matters::get_matters,
        handlers::matters::get_matter,
        handlers::matters::update_matter,
        handlers::matters::delete_matter,
        handlers::invoices::create_invoice,
        handlers::invoices::get_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice,
        handlers::invoices::delete_invoice,
        handlers::installments::create_installment,
        handlers::installments::get_installments,
        handlers::installments::get_installment,
        handlers::installments::update_installment,
        handlers::installments::delete_installment,
        handlers::installments::pay_installment,
        handlers::time_bills::create_time_bill,
        handlers::time_bills::get_time_bills,
        handlers::time_bills::get_time_bill,
        handlers::time_bills::update_time_bill,
        handlers::time_bills::delete_time_bill,
        handlers::time_bills::bulk_delete_time_bills,
        handlers::time_bills::get_time_bill_calendar,
        handlers::notes::create_note,
        handlers::notes::get_notes,
        handlers::notes::get_note,
        handlers::notes::update_note,
        handlers::notes::delete_note,
        handlers::currencies::create_currency,
        handlers::currencies::bulk_create_currencies,
        handlers::currencies::get_currencies,
        handlers::currencies::get_currency,
        handlers::currencies::update_currency,
        handlers::currencies::delete_currency,
        handlers::currencies::toggle_currency_status,
        handlers::business_types::create_business_type,
        handlers::business_types::get_business_types,
        handlers::business_types::get_business_type,
        handlers::business_types::update_business_type,
        handlers::business_types::delete_business_type,
        handlers::business_entities::create_business_entity,
        handlers::business_entities::get_business_entities,
        handlers::business_entities::get_business_entity,
        handlers::business_entities::update_business_entity,
        handlers::business_entities::delete_business_entity,
        handlers::practice_areas::create_practice_area,
        handlers::practice_areas::get_practice_areas,
        handlers::practice_areas::get_practice_area,
        handlers::practice_areas::update_practice_area,
        handlers::practice_areas::delete_practice_area,
        handlers::practice_areas::get_practice_area_form,
        handlers::subcategories::create_subcategory,
        handlers::subcategories::get_subcategories,
        handlers::subcategories::get_subcategory,
        handlers::subcategories::update_subcategory,
        handlers::subcategories::delete_subcategory,
        handlers::custom_field_groups::create_custom_field_group,
        handlers::custom_field_groups::get_custom_field_groups,
        handlers::custom_field_groups::get_custom_field_group,
        handlers::custom_field_groups::update_custom_field_group,
        handlers::custom_field_groups::delete_custom_field_group,
        handlers::custom_fields::create_custom_field,
        handlers::custom_fields::get_custom_fields,
        handlers::custom_fields::get_custom_field,
        handlers::custom_fields::update_custom_field,
        handlers::custom_fields::delete_custom_field,
        handlers::heads_ups::create_heads_up,
        handlers::heads_ups::get_heads_ups,
        handlers::heads_ups::get_heads_up,
        handlers::heads_ups::update_heads_up,
        handlers::heads_ups::delete_heads_up,
        handlers::heads_ups::enable_heads_up,
        handlers::heads_ups::disable_heads_up,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            handlers::auth::RegisterRequest,
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            handlers::auth::OtpRequest,
            handlers::auth::OtpVerifyRequest,
            handlers::users::CreateUserRequest,
            handlers::users::UpdateUserRequest,
            handlers::users::AssignGroupRequest,
            handlers::users::UserResponse,
            handlers::users::PermissionsResponse,
            handlers::user_groups::CreateUserGroupRequest,
            handlers::user_groups::UpdateUserGroupRequest,
            handlers::user_groups::GroupPermissionRequest,
            handlers::user_groups::UserGroupResponse,
            handlers::customers::CreateCustomerRequest,
            handlers::customers::UpdateCustomerRequest,
            handlers::customers::CustomerResponse,
            handlers::matters::CreateMatterRequest,
            handlers::matters::UpdateMatterRequest,
            handlers::matters::MatterResponse,
            handlers::invoices::CreateInvoiceRequest,
            handlers::invoices::UpdateInvoiceRequest,
            handlers::invoices::InvoiceResponse,
            handlers::installments::CreateInstallmentRequest,
            handlers::installments::UpdateInstallmentRequest,
            handlers::installments::InstallmentResponse,
            handlers::time_bills::CreateTimeBillRequest,
            handlers::time_bills::UpdateTimeBillRequest,
            handlers::time_bills::BulkDeleteRequest,
            handlers::time_bills::BulkDeleteResponse,
            handlers::time_bills::TimeBillResponse,
            handlers::time_bills::CalendarDay,
            handlers::time_bills::CalendarResponse,
            handlers::notes::CreateNoteRequest,
            handlers::notes::UpdateNoteRequest,
            handlers::notes::NoteResponse,
            handlers::currencies::CreateCurrencyRequest,
            handlers::currencies::UpdateCurrencyRequest,
            handlers::currencies::BulkCurrencyRequest,
            handlers::currencies::BulkCurrencyError,
            handlers::currencies::BulkCurrencyResponse,
            handlers::currencies::CurrencyResponse,
            handlers::business_types::CreateBusinessTypeRequest,
            handlers::business_types::UpdateBusinessTypeRequest,
            handlers::business_types::BusinessTypeResponse,
            handlers::business_entities::CreateBusinessEntityRequest,
            handlers::business_entities::UpdateBusinessEntityRequest,
            handlers::business_entities::BusinessEntityResponse,
            handlers::practice_areas::CreatePracticeAreaRequest,
            handlers::practice_areas::UpdatePracticeAreaRequest,
            handlers::practice_areas::PracticeAreaResponse,
            handlers::practice_areas::PracticeAreaForm,
            handlers::practice_areas::SubcategoryForm,
            handlers::practice_areas::FieldGroupForm,
            handlers::subcategories::CreateSubcategoryRequest,
            handlers::subcategories::UpdateSubcategoryRequest,
            handlers::subcategories::SubcategoryResponse,
            handlers::custom_field_groups::CreateCustomFieldGroupRequest,
            handlers::custom_field_groups::UpdateCustomFieldGroupRequest,
            handlers::custom_field_groups::CustomFieldGroupResponse,
            handlers::custom_fields::CreateCustomFieldRequest,
            handlers::custom_fields::UpdateCustomFieldRequest,
            handlers::custom_fields::CustomFieldResponse,
            handlers::heads_ups::CreateHeadsUpRequest,
            handlers::heads_ups::UpdateHeadsUpRequest,
            handlers::heads_ups::HeadsUpResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and password reset"),
        (name = "users", description = "User administration"),
        (name = "user-groups", description = "User groups and their permissions"),
        (name = "customers", description = "Customer records"),
        (name = "matters", description = "Legal matters per customer"),
        (name = "invoices", description = "Invoices and installments"),
        (name = "time-bills", description = "Billable time and the calendar summary"),
        (name = "notes", description = "Customer notes"),
        (name = "currencies", description = "Currency catalogue"),
        (name = "taxonomy", description = "Business types, practice areas and intake form definitions"),
        (name = "heads-ups", description = "Notification schedules"),
    ),
    info(
        title = "LexDesk API",
        description = "Practice management API for law firms and business advisors",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
