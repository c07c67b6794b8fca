use crate::auth::middleware::{require_member, require_super_admin};
use crate::handlers::{
    auth::{login, me, my_permissions, register, request_otp, verify_otp},
    business_entities::{
        create_business_entity, delete_business_entity, get_business_entities, get_business_entity,
        update_business_entity,
    },
    business_types::{
        create_business_type, delete_business_type, get_business_type, get_business_types,
        update_business_type,
    },
    currencies::{
        bulk_create_currencies, create_currency, delete_currency, get_currencies, get_currency,
        toggle_currency_status, update_currency,
    },
    custom_field_groups::{
        create_custom_field_group, delete_custom_field_group, get_custom_field_group,
        get_custom_field_groups, update_custom_field_group,
    },
    custom_fields::{
        create_custom_field, delete_custom_field, get_custom_field, get_custom_fields, update_custom_field,
    },
    customers::{create_customer, delete_customer, get_customer, get_customers, update_customer},
    heads_ups::{
        create_heads_up, delete_heads_up, disable_heads_up, enable_heads_up, get_heads_up, get_heads_ups,
        update_heads_up,
    },
    health::health_check,
    installments::{
        create_installment, delete_installment, get_installment, get_installments, pay_installment,
        update_installment,
    },
    invoices::{create_invoice, delete_invoice, get_invoice, get_invoices, update_invoice},
    matters::{create_matter, delete_matter, get_matter, get_matters, update_matter},
    notes::{create_note, delete_note, get_note, get_notes, update_note},
    practice_areas::{
        create_practice_area, delete_practice_area, get_practice_area, get_practice_area_form,
        get_practice_areas, update_practice_area,
    },
    subcategories::{create_subcategory, delete_subcategory, get_subcategories, get_subcategory, update_subcategory},
    time_bills::{
        bulk_delete_time_bills, create_time_bill, delete_time_bill, get_time_bill, get_time_bill_calendar,
        get_time_bills, update_time_bill,
    },
    user_groups::{
        create_user_group, delete_user_group, get_group_users, get_user_group, get_user_groups,
        remove_group_permission, toggle_user_group_status, update_user_group, upsert_group_permission,
    },
    users::{
        assign_user_group, create_user, delete_user, get_user, get_user_permissions, get_users, update_user,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Routes reachable without a token.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/otp/request", post(request_otp))
        .route("/api/v1/auth/otp/verify", post(verify_otp))
}

/// Practice data, open to every signed-in user.
fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/auth/me/permissions", get(my_permissions))
        // Customers
        .route("/api/v1/customers", post(create_customer).get(get_customers))
        .route(
            "/api/v1/customers/:customer_id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        // Matters
        .route("/api/v1/matters", post(create_matter).get(get_matters))
        .route(
            "/api/v1/matters/:matter_id",
            get(get_matter).put(update_matter).delete(delete_matter),
        )
        // Invoices and installments
        .route("/api/v1/invoices", post(create_invoice).get(get_invoices))
        .route(
            "/api/v1/invoices/:invoice_id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/api/v1/installments", post(create_installment).get(get_installments))
        .route(
            "/api/v1/installments/:installment_id",
            get(get_installment).put(update_installment).delete(delete_installment),
        )
        .route("/api/v1/installments/:installment_id/pay", patch(pay_installment))
        // Time bills
        .route("/api/v1/time-bills", post(create_time_bill).get(get_time_bills))
        .route("/api/v1/time-bills/calendar", get(get_time_bill_calendar))
        .route("/api/v1/time-bills/bulk-delete", post(bulk_delete_time_bills))
        .route(
            "/api/v1/time-bills/:time_bill_id",
            get(get_time_bill).put(update_time_bill).delete(delete_time_bill),
        )
        // Notes
        .route("/api/v1/notes", post(create_note).get(get_notes))
        .route(
            "/api/v1/notes/:note_id",
            get(get_note).put(update_note).delete(delete_note),
        )
        // Heads-ups
        .route("/api/v1/heads-ups", post(create_heads_up).get(get_heads_ups))
        .route(
            "/api/v1/heads-ups/:heads_up_id",
            get(get_heads_up).put(update_heads_up).delete(delete_heads_up),
        )
        .route("/api/v1/heads-ups/:heads_up_id/enable", patch(enable_heads_up))
        .route("/api/v1/heads-ups/:heads_up_id/disable", patch(disable_heads_up))
}

/// Accounts, permissions, currencies and the practice taxonomy.
fn admin_routes() -> Router<AppState> {
    Router::new()
        // Users
        .route("/api/v1/users", post(create_user).get(get_users))
        .route(
            "/api/v1/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/v1/users/:user_id/permissions", get(get_user_permissions))
        .route("/api/v1/users/:user_id/group", put(assign_user_group))
        // User groups
        .route("/api/v1/user-groups", post(create_user_group).get(get_user_groups))
        .route(
            "/api/v1/user-groups/:group_id",
            get(get_user_group).put(update_user_group).delete(delete_user_group),
        )
        .route("/api/v1/user-groups/:group_id/users", get(get_group_users))
        .route("/api/v1/user-groups/:group_id/status", patch(toggle_user_group_status))
        .route("/api/v1/user-groups/:group_id/permissions", post(upsert_group_permission))
        .route(
            "/api/v1/user-groups/:group_id/permissions/:module",
            delete(remove_group_permission),
        )
        // Currencies
        .route("/api/v1/currencies", post(create_currency).get(get_currencies))
        .route("/api/v1/currencies/bulk", post(bulk_create_currencies))
        .route(
            "/api/v1/currencies/:currency_id",
            get(get_currency).put(update_currency).delete(delete_currency),
        )
        .route("/api/v1/currencies/:currency_id/status", patch(toggle_currency_status))
        // Taxonomy
        .route("/api/v1/business-types", post(create_business_type).get(get_business_types))
        .route(
            "/api/v1/business-types/:business_type_id",
            get(get_business_type).put(update_business_type).delete(delete_business_type),
        )
        .route("/api/v1/business-entities", post(create_business_entity).get(get_business_entities))
        .route(
            "/api/v1/business-entities/:business_entity_id",
            get(get_business_entity).put(update_business_entity).delete(delete_business_entity),
        )
        .route("/api/v1/practice-areas", post(create_practice_area).get(get_practice_areas))
        .route(
            "/api/v1/practice-areas/:practice_area_id",
            get(get_practice_area).put(update_practice_area).delete(delete_practice_area),
        )
        .route("/api/v1/practice-areas/:practice_area_id/form", get(get_practice_area_form))
        .route("/api/v1/subcategories", post(create_subcategory).get(get_subcategories))
        .route(
            "/api/v1/subcategories/:subcategory_id",
            get(get_subcategory).put(update_subcategory).delete(delete_subcategory),
        )
        .route(
            "/api/v1/custom-field-groups",
            post(create_custom_field_group).get(get_custom_field_groups),
        )
        .route(
            "/api/v1/custom-field-groups/:group_id",
            get(get_custom_field_group)
                .put(update_custom_field_group)
                .delete(delete_custom_field_group),
        )
        .route("/api/v1/custom-fields", post(create_custom_field).get(get_custom_fields))
        .route(
            "/api/v1/custom-fields/:field_id",
            get(get_custom_field).put(update_custom_field).delete(delete_custom_field),
        )
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let member = member_routes().route_layer(from_fn_with_state(state.clone(), require_member));
    let admin = admin_routes().route_layer(from_fn_with_state(state.clone(), require_super_admin));

    Router::new()
        .merge(public_routes())
        .merge(member)
        .merge(admin)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
