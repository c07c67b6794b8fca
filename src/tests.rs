use std::str::FromStr;

use axum::http::{header, StatusCode};
use model::entities::{installment, time_bill, user::UserRole, user_group};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::{json, Value};

use crate::test_utils::{bearer, setup_test_app, TestApp, TEST_PASSWORD};

fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

async fn post_json(app: &TestApp, token: &str, path: &str, body: Value) -> Value {
    let response = app
        .server
        .post(path)
        .add_header(header::AUTHORIZATION, bearer(token))
        .json(&body)
        .await;
    if response.status_code() != StatusCode::CREATED {
        panic!("Expected 201 Created from {path}, got {}: {}", response.status_code(), response.text());
    }
    response.json::<Value>()["data"].clone()
}

async fn create_customer(app: &TestApp, token: &str, name: &str) -> i64 {
    let data = post_json(app, token, "/api/v1/customers", json!({ "name": name })).await;
    data["id"].as_i64().unwrap()
}

async fn insert_group(app: &TestApp, title: &str) -> user_group::Model {
    user_group::ActiveModel {
        title: Set(title.to_string()),
        default_permissions: Set(user_group::DefaultPermissions::default()),
        custom_permissions: Set(user_group::CustomPermissions::default()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(app.db())
    .await
    .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app().await;

    let response = app.server.get("/health").await;

    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = setup_test_app().await;

    let response = app.server.get("/api/v1/customers").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["success"], false);

    let response = app
        .server
        .get("/api/v1/customers")
        .add_header(header::AUTHORIZATION, bearer("not-a-token"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_member_cannot_reach_admin_routes() {
    let app = setup_test_app().await;
    let (_, token) = app.member("member@example.com", None).await;

    let response = app
        .server
        .get("/api/v1/users")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Practice data stays reachable.
    let response = app
        .server
        .get("/api/v1/customers")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({ "name": "Dana", "email": "Dana@Example.com", "password": "long enough" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["email"], "dana@example.com");
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password_hash").is_none());

    // Same address in another case is a duplicate.
    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({ "name": "Dana", "email": "DANA@example.com", "password": "long enough" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "dana@example.com", "password": "wrong password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "dana@example.com", "password": "long enough" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");

    let response = app
        .server
        .get("/api/v1/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["email"], "dana@example.com");
}

#[tokio::test]
async fn test_otp_password_reset() {
    let app = setup_test_app().await;
    let (_, _) = app.member("reset@example.com", None).await;

    // Unknown addresses get the same answer and nothing is sent.
    let response = app
        .server
        .post("/api/v1/auth/otp/request")
        .json(&json!({ "email": "ghost@example.com" }))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(app.notifier.count(), 0);

    let response = app
        .server
        .post("/api/v1/auth/otp/request")
        .json(&json!({ "email": "reset@example.com" }))
        .await;
    response.assert_status(StatusCode::OK);
    let otp = app.notifier.last_otp_for("reset@example.com").unwrap();
    assert_eq!(otp.len(), 6);

    let wrong = if otp == "000000" { "111111" } else { "000000" };
    let response = app
        .server
        .post("/api/v1/auth/otp/verify")
        .json(&json!({ "email": "reset@example.com", "otp": wrong, "new_password": "brand new secret" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/api/v1/auth/otp/verify")
        .json(&json!({ "email": "reset@example.com", "otp": otp, "new_password": "brand new secret" }))
        .await;
    response.assert_status(StatusCode::OK);

    // The code is single use.
    let response = app
        .server
        .post("/api/v1/auth/otp/verify")
        .json(&json!({ "email": "reset@example.com", "otp": otp, "new_password": "another secret" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "reset@example.com", "password": TEST_PASSWORD }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "reset@example.com", "password": "brand new secret" }))
        .await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_super_admin_has_full_access_despite_group() {
    let app = setup_test_app().await;
    let group = insert_group(&app, "Locked").await;
    let boss = app
        .create_user("boss@example.com", UserRole::SuperAdmin, Some(group.id))
        .await;
    let token = app.token_for(&boss);

    let response = app
        .server
        .get("/api/v1/auth/me/permissions")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["full_access"], true);
    assert_eq!(body["data"]["has_access"], true);
    assert!(body["data"]["default_permissions"].is_null());
}

#[tokio::test]
async fn test_no_group_and_missing_group_are_reported_differently() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;
    let (loner, _) = app.member("loner@example.com", None).await;
    let (orphan, _) = app.member("orphan@example.com", Some(4242)).await;

    let response = app
        .server
        .get(&format!("/api/v1/users/{}/permissions", loner.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let no_group: Value = response.json();
    assert_eq!(no_group["data"]["has_access"], false);
    assert_eq!(no_group["data"]["reason"], "no_group_assigned");

    let response = app
        .server
        .get(&format!("/api/v1/users/{}/permissions", orphan.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let missing: Value = response.json();
    assert_eq!(missing["data"]["has_access"], false);
    assert_eq!(missing["data"]["reason"], "group_not_found");
    assert_ne!(no_group["data"]["message"], missing["data"]["message"]);
}

#[tokio::test]
async fn test_member_sees_group_permissions_verbatim() {
    let app = setup_test_app().await;
    let (_, admin_token) = app.admin().await;

    let group = post_json(
        &app,
        &admin_token,
        "/api/v1/user-groups",
        json!({
            "title": "Associates",
            "default_permissions": { "customers": "edit", "matters": "view" },
            "custom_permissions": [{ "module": "reports", "level": "view" }]
        }),
    )
    .await;
    let group_id = group["id"].as_i64().unwrap() as i32;
    assert_eq!(group["default_permissions"]["settings"], "none");

    let (_, token) = app.member("associate@example.com", Some(group_id)).await;
    let response = app
        .server
        .get("/api/v1/auth/me/permissions")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["full_access"], false);
    assert_eq!(body["data"]["has_access"], true);
    assert_eq!(body["data"]["group_title"], "Associates");
    assert_eq!(body["data"]["default_permissions"]["customers"], "edit");
    assert_eq!(body["data"]["custom_permissions"][0]["module"], "reports");
}

#[tokio::test]
async fn test_group_permission_upsert_and_remove() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;

    let group = post_json(
        &app,
        &token,
        "/api/v1/user-groups",
        json!({
            "title": "Paralegals",
            "default_permissions": {},
            "custom_permissions": [{ "module": "reports", "level": "view" }]
        }),
    )
    .await;
    let path = format!("/api/v1/user-groups/{}/permissions", group["id"]);

    // Existing module is replaced in place.
    let response = app
        .server
        .post(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "module": "reports", "level": "full" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let list = body["data"]["custom_permissions"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["level"], "full");

    // A new module is appended.
    let response = app
        .server
        .post(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "module": "calendar", "level": "edit" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let list = body["data"]["custom_permissions"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["module"], "reports");
    assert_eq!(list[1]["module"], "calendar");

    let response = app
        .server
        .delete(&format!("{path}/documents"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Permission for module not found");

    let response = app
        .server
        .delete(&format!("{path}/reports"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let list = body["data"]["custom_permissions"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["module"], "calendar");
}

#[tokio::test]
async fn test_group_delete_blocked_while_users_assigned() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;
    let group = insert_group(&app, "Interns").await;
    let (intern, _) = app.member("intern@example.com", Some(group.id)).await;
    let path = format!("/api/v1/user-groups/{}", group.id);

    let response = app
        .server
        .delete(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("1 user(s)"));

    let response = app
        .server
        .put(&format!("/api/v1/users/{}/group", intern.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "group_id": null }))
        .await;
    response.assert_status(StatusCode::OK);

    let response = app
        .server
        .delete(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);

    let response = app
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unique_names_conflict_among_live_rows() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;

    let first = post_json(&app, &token, "/api/v1/business-types", json!({ "name": "Retail" })).await;
    let response = app
        .server
        .post("/api/v1/business-types")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "Retail" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT");

    // Once the holder is soft-deleted the name is free again.
    let response = app
        .server
        .delete(&format!("/api/v1/business-types/{}", first["id"]))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    post_json(&app, &token, "/api/v1/business-types", json!({ "name": "Retail" })).await;

    post_json(&app, &token, "/api/v1/currencies", json!({ "currency_code": "USD", "name": "US Dollar" })).await;
    let response = app
        .server
        .post("/api/v1/currencies")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "currency_code": "usd", "name": "Dollar again" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    post_json(&app, &token, "/api/v1/user-groups", json!({ "title": "Partners", "default_permissions": {} })).await;
    let response = app
        .server
        .post("/api/v1/user-groups")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "Partners", "default_permissions": {} }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_currency_defaults_and_bulk_create() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;

    let euro = post_json(&app, &token, "/api/v1/currencies", json!({ "currency_code": "eur", "name": "Euro" })).await;
    assert_eq!(euro["currency_code"], "EUR");
    assert_eq!(euro["symbol"], "€");
    assert_eq!(dec(&euro["exchange_rate"]), Decimal::ONE);

    let response = app
        .server
        .post("/api/v1/currencies/bulk")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "currencies": [
                { "currency_code": "USD", "name": "US Dollar" },
                { "currency_code": "XYZ", "name": "Nonsense" },
                { "currency_code": "GBP", "name": "Pound", "exchange_rate": "0.79" }
            ]
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["created"].as_array().unwrap().len(), 2);
    let errors = body["data"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["index"], 1);
    assert_eq!(errors[0]["currency_code"], "XYZ");

    // Nothing new: every item fails, the answer is 200.
    let response = app
        .server
        .post("/api/v1/currencies/bulk")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "currencies": [
                { "currency_code": "USD", "name": "US Dollar" },
                { "currency_code": "EUR", "name": "Euro" }
            ]
        }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert!(body["data"]["created"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 2);

    // Duplicates inside one batch.
    let response = app
        .server
        .post("/api/v1/currencies/bulk")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "currencies": [
                { "currency_code": "JPY", "name": "Yen" },
                { "currency_code": "jpy", "name": "Yen again" }
            ]
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["created"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["errors"][0]["index"], 1);
}

#[tokio::test]
async fn test_soft_deleted_customer_disappears_but_row_remains() {
    let app = setup_test_app().await;
    let (_, token) = app.member("clerk@example.com", None).await;
    let kept = create_customer(&app, &token, "Kept Ltd").await;
    let gone = create_customer(&app, &token, "Gone Ltd").await;

    let response = app
        .server
        .delete(&format!("/api/v1/customers/{gone}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);

    let response = app
        .server
        .get(&format!("/api/v1/customers/{gone}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    // Deleting twice finds nothing live.
    let response = app
        .server
        .delete(&format!("/api/v1/customers/{gone}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .get("/api/v1/customers")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], kept);

    let raw = model::entities::customer::Entity::find_by_id(gone as i32)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert!(raw.is_delete);
}

#[tokio::test]
async fn test_time_bill_and_installment_deletes_are_physical() {
    let app = setup_test_app().await;
    let (_, token) = app.member("biller@example.com", None).await;
    let customer = create_customer(&app, &token, "Acme").await;

    let bill = post_json(
        &app,
        &token,
        "/api/v1/time-bills",
        json!({ "customer_id": customer, "duration": "1:00", "hourly_rate": "100" }),
    )
    .await;
    let bill_id = bill["id"].as_i64().unwrap() as i32;
    let response = app
        .server
        .delete(&format!("/api/v1/time-bills/{bill_id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    assert!(time_bill::Entity::find_by_id(bill_id).one(app.db()).await.unwrap().is_none());

    let invoice = post_json(
        &app,
        &token,
        "/api/v1/invoices",
        json!({
            "customer_id": customer,
            "invoice_number": "INV-1",
            "amount": "1000.00",
            "currency_code": "usd",
            "issue_date": "2024-05-01"
        }),
    )
    .await;
    let installment = post_json(
        &app,
        &token,
        "/api/v1/installments",
        json!({ "invoice_id": invoice["id"], "amount": "500", "due_date": "2024-06-01" }),
    )
    .await;
    let installment_id = installment["id"].as_i64().unwrap() as i32;
    let response = app
        .server
        .delete(&format!("/api/v1/installments/{installment_id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    assert!(
        installment::Entity::find_by_id(installment_id)
            .one(app.db())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_bulk_delete_time_bills_counts_removed_rows() {
    let app = setup_test_app().await;
    let (_, token) = app.member("biller@example.com", None).await;
    let customer = create_customer(&app, &token, "Acme").await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let bill = post_json(
            &app,
            &token,
            "/api/v1/time-bills",
            json!({ "customer_id": customer, "duration": "0.5", "hourly_rate": "80" }),
        )
        .await;
        ids.push(bill["id"].as_i64().unwrap());
    }
    ids.push(99_999);

    let response = app
        .server
        .post("/api/v1/time-bills/bulk-delete")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "ids": ids }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["deleted"], 2);

    let response = app
        .server
        .post("/api/v1/time-bills/bulk-delete")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "ids": [] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_time_bill_calendar_groups_by_day() {
    let app = setup_test_app().await;
    let (member, token) = app.member("biller@example.com", None).await;
    let customer = create_customer(&app, &token, "Acme").await;

    let first = post_json(
        &app,
        &token,
        "/api/v1/time-bills",
        json!({ "customer_id": customer, "date_of_work": "2024-05-10", "duration": "1:30", "hourly_rate": "100" }),
    )
    .await;
    assert_eq!(dec(&first["amount"]), Decimal::from(150));
    assert_eq!(first["user_id"], member.id);

    post_json(
        &app,
        &token,
        "/api/v1/time-bills",
        json!({ "customer_id": customer, "date_of_work": "2024-05-10", "duration": "2.5", "hourly_rate": "40" }),
    )
    .await;
    post_json(
        &app,
        &token,
        "/api/v1/time-bills",
        json!({
            "customer_id": customer,
            "date_of_work": "2024-05-12",
            "duration": "1",
            "hourly_rate": "50",
            "status": "approved"
        }),
    )
    .await;
    // Outside the range.
    post_json(
        &app,
        &token,
        "/api/v1/time-bills",
        json!({ "customer_id": customer, "date_of_work": "2024-06-01", "duration": "3", "hourly_rate": "10" }),
    )
    .await;

    let response = app
        .server
        .get("/api/v1/time-bills/calendar")
        .add_query_param("start_date", "2024-05-01")
        .add_query_param("end_date", "2024-05-31")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let days = body["data"]["days"].as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["date"], "2024-05-10");
    assert_eq!(days[0]["entries"], 2);
    assert_eq!(dec(&days[0]["total_hours"]), Decimal::from(4));
    assert_eq!(dec(&days[0]["total_amount"]), Decimal::from(250));
    assert_eq!(days[1]["date"], "2024-05-12");
    assert_eq!(dec(&body["data"]["total_amount"]), Decimal::from(300));
    assert_eq!(body["data"]["total_entries"], 3);

    let response = app
        .server
        .get("/api/v1/time-bills/calendar")
        .add_query_param("start_date", "2024-05-01")
        .add_query_param("end_date", "2024-05-31")
        .add_query_param("status", "approved")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["days"].as_array().unwrap().len(), 1);
    assert_eq!(dec(&body["data"]["total_amount"]), Decimal::from(50));

    let response = app
        .server
        .get("/api/v1/time-bills/calendar")
        .add_query_param("start_date", "2024-05-31")
        .add_query_param("end_date", "2024-05-01")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_time_bill_values_parse_leniently() {
    let app = setup_test_app().await;
    let (_, token) = app.member("biller@example.com", None).await;
    let customer = create_customer(&app, &token, "Acme").await;

    // Unparseable text counts as zero hours.
    let bill = post_json(
        &app,
        &token,
        "/api/v1/time-bills",
        json!({ "customer_id": customer, "duration": "soon", "hourly_rate": "100" }),
    )
    .await;
    assert_eq!(dec(&bill["amount"]), Decimal::ZERO);

    // Leading numbers are kept, trailing text ignored.
    let bill = post_json(
        &app,
        &token,
        "/api/v1/time-bills",
        json!({ "customer_id": customer, "duration": "2h", "hourly_rate": "75 EUR" }),
    )
    .await;
    assert_eq!(dec(&bill["amount"]), Decimal::from(150));

    let response = app
        .server
        .post("/api/v1/time-bills")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "customer_id": 777, "duration": "1", "hourly_rate": "100" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_pagination_and_search() {
    let app = setup_test_app().await;
    let (_, token) = app.member("clerk@example.com", None).await;
    for i in 1..=12 {
        create_customer(&app, &token, &format!("Client {i:02}")).await;
    }
    create_customer(&app, &token, "Old Smith").await;
    create_customer(&app, &token, "Smithfield").await;
    create_customer(&app, &token, "Smith").await;

    let response = app
        .server
        .get("/api/v1/customers")
        .add_query_param("page", "4")
        .add_query_param("limit", "4")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total"], 15);
    assert_eq!(body["total_pages"], 4);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let response = app
        .server
        .get("/api/v1/customers")
        .add_query_param("limit", "500")
        .add_query_param("page", "junk")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["limit"], 100);
    assert_eq!(body["page"], 1);

    // Exact match, then prefix, then anything containing the term.
    let response = app
        .server
        .get("/api/v1/customers")
        .add_query_param("search", "SMITH")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 3);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Smith", "Smithfield", "Old Smith"]);
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let app = setup_test_app().await;
    let (_, token) = app.member("clerk@example.com", None).await;

    let response = app
        .server
        .post("/api/v1/customers")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let response = app
        .server
        .post("/api/v1/heads-ups")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "title": "Renew lease",
            "frequency": "weekly",
            "time_of_day": "25:00",
            "timezone": "Europe/Prague"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_matter_requires_live_customer_and_ordered_dates() {
    let app = setup_test_app().await;
    let (_, token) = app.member("clerk@example.com", None).await;
    let customer = create_customer(&app, &token, "Acme").await;

    let response = app
        .server
        .post("/api/v1/matters")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "customer_id": 9999, "title": "Lease" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = app
        .server
        .post("/api/v1/matters")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "customer_id": customer,
            "title": "Lease",
            "open_date": "2024-05-10",
            "close_date": "2024-05-01"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let matter = post_json(
        &app,
        &token,
        "/api/v1/matters",
        json!({ "customer_id": customer, "title": "Lease" }),
    )
    .await;
    assert_eq!(matter["status"], "open");
}

#[tokio::test]
async fn test_installment_pay_and_customer_from_invoice() {
    let app = setup_test_app().await;
    let (_, token) = app.member("biller@example.com", None).await;
    let customer = create_customer(&app, &token, "Acme").await;
    let invoice = post_json(
        &app,
        &token,
        "/api/v1/invoices",
        json!({
            "customer_id": customer,
            "invoice_number": "INV-7",
            "amount": "900",
            "currency_code": "EUR",
            "issue_date": "2024-05-01"
        }),
    )
    .await;
    let installment = post_json(
        &app,
        &token,
        "/api/v1/installments",
        json!({ "invoice_id": invoice["id"], "amount": "300", "due_date": "2024-06-01" }),
    )
    .await;
    assert_eq!(installment["customer_id"], customer);
    assert_eq!(installment["status"], "pending");
    assert!(installment["paid_at"].is_null());

    let response = app
        .server
        .patch(&format!("/api/v1/installments/{}/pay", installment["id"]))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "paid");
    assert!(!body["data"]["paid_at"].is_null());

    let response = app
        .server
        .post("/api/v1/installments")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "invoice_id": invoice["id"], "amount": "0", "due_date": "2024-06-01" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_select_field_needs_options() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;
    let area = post_json(&app, &token, "/api/v1/practice-areas", json!({ "name": "Real estate" })).await;
    let sub = post_json(
        &app,
        &token,
        "/api/v1/subcategories",
        json!({ "practice_area_id": area["id"], "name": "Leases" }),
    )
    .await;
    let group = post_json(
        &app,
        &token,
        "/api/v1/custom-field-groups",
        json!({ "subcategory_id": sub["id"], "title": "Property" }),
    )
    .await;

    let response = app
        .server
        .post("/api/v1/custom-fields")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "group_id": group["id"], "label": "Kind", "field_type": "select" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let field = post_json(
        &app,
        &token,
        "/api/v1/custom-fields",
        json!({ "group_id": group["id"], "label": "Kind", "field_type": "select", "options": ["Flat", "House"] }),
    )
    .await;
    assert_eq!(field["options"], json!(["Flat", "House"]));
}

#[tokio::test]
async fn test_practice_area_form_tree() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;
    let area = post_json(&app, &token, "/api/v1/practice-areas", json!({ "name": "Family law" })).await;
    let sub = post_json(
        &app,
        &token,
        "/api/v1/subcategories",
        json!({ "practice_area_id": area["id"], "name": "Divorce" }),
    )
    .await;
    let second = post_json(
        &app,
        &token,
        "/api/v1/custom-field-groups",
        json!({ "subcategory_id": sub["id"], "title": "Assets", "sort_order": 2 }),
    )
    .await;
    let first = post_json(
        &app,
        &token,
        "/api/v1/custom-field-groups",
        json!({ "subcategory_id": sub["id"], "title": "Parties", "sort_order": 1 }),
    )
    .await;
    post_json(
        &app,
        &token,
        "/api/v1/custom-fields",
        json!({ "group_id": first["id"], "label": "Spouse name", "field_type": "text" }),
    )
    .await;
    let dropped = post_json(
        &app,
        &token,
        "/api/v1/custom-fields",
        json!({ "group_id": second["id"], "label": "House value", "field_type": "number" }),
    )
    .await;
    let response = app
        .server
        .delete(&format!("/api/v1/custom-fields/{}", dropped["id"]))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);

    let response = app
        .server
        .get(&format!("/api/v1/practice-areas/{}/form", area["id"]))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let subcategories = body["data"]["subcategories"].as_array().unwrap();
    assert_eq!(subcategories.len(), 1);
    let groups = subcategories[0]["field_groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["title"], "Parties");
    assert_eq!(groups[0]["fields"][0]["label"], "Spouse name");
    assert_eq!(groups[1]["title"], "Assets");
    assert!(groups[1]["fields"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_heads_up_enable_disable() {
    let app = setup_test_app().await;
    let (_, token) = app.member("clerk@example.com", None).await;
    let heads_up = post_json(
        &app,
        &token,
        "/api/v1/heads-ups",
        json!({
            "title": "Court hearing",
            "frequency": "once",
            "time_of_day": "09:30",
            "timezone": "Europe/Prague",
            "is_enabled": false
        }),
    )
    .await;
    assert_eq!(heads_up["is_enabled"], false);

    let response = app
        .server
        .patch(&format!("/api/v1/heads-ups/{}/enable", heads_up["id"]))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["is_enabled"], true);
    assert_eq!(body["message"], "Heads-up enabled");

    let response = app
        .server
        .patch(&format!("/api/v1/heads-ups/{}/disable", heads_up["id"]))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["is_enabled"], false);
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = setup_test_app().await;
    let (admin, token) = app.admin().await;

    let response = app
        .server
        .delete(&format!("/api/v1/users/{}", admin.id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_heads_up_update_checks_time_of_day() {
    let app = setup_test_app().await;
    let (_, token) = app.member("clerk@example.com", None).await;
    let heads_up = post_json(
        &app,
        &token,
        "/api/v1/heads-ups",
        json!({ "title": "Filing deadline", "frequency": "daily", "time_of_day": "08:00", "timezone": "UTC" }),
    )
    .await;
    let path = format!("/api/v1/heads-ups/{}", heads_up["id"]);

    let response = app
        .server
        .put(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "time_of_day": "8am" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .put(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "time_of_day": "17:45" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["time_of_day"], "17:45");
}

#[tokio::test]
async fn test_time_bill_amount_must_fit() {
    let app = setup_test_app().await;
    let (_, token) = app.member("biller@example.com", None).await;
    let customer = create_customer(&app, &token, "Acme").await;
    let huge = "99999999999999999999";

    let response = app
        .server
        .post("/api/v1/time-bills")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "customer_id": customer, "duration": huge, "hourly_rate": huge }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Duration times hourly rate is too large");

    let bill = post_json(
        &app,
        &token,
        "/api/v1/time-bills",
        json!({ "customer_id": customer, "duration": huge, "hourly_rate": "2" }),
    )
    .await;

    // The stored duration is checked against the new rate.
    let response = app
        .server
        .put(&format!("/api/v1/time-bills/{}", bill["id"]))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "hourly_rate": huge }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .get("/api/v1/time-bills")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["hourly_rate"], "2");
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let app = setup_test_app().await;
    let (_, token) = app.member("clerk@example.com", None).await;
    create_customer(&app, &token, "Acme").await;

    let response = app
        .server
        .get("/api/v1/customers")
        .add_query_param("page", "9223372036854775807")
        .add_query_param("limit", "100")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 1_000_000);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_permission_module_names_are_trimmed() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;
    let group = post_json(
        &app,
        &token,
        "/api/v1/user-groups",
        json!({ "title": "Clerks", "default_permissions": {} }),
    )
    .await;
    let path = format!("/api/v1/user-groups/{}/permissions", group["id"]);

    let response = app
        .server
        .post(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "module": "   ", "level": "view" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post(&path)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "module": " reports ", "level": "view" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["custom_permissions"], json!([{ "module": "reports", "level": "view" }]));

    let response = app
        .server
        .delete(&format!("{path}/%20reports%20"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert!(body["data"]["custom_permissions"].as_array().unwrap().is_empty());
}

/// Creates two rows under `path`, soft-deletes the first and checks that
/// only the second is listed.
async fn assert_deleted_row_leaves_list(app: &TestApp, token: &str, path: &str, first: Value, second: Value) {
    let gone = post_json(app, token, path, first).await;
    let kept = post_json(app, token, path, second).await;

    let response = app
        .server
        .delete(&format!("{path}/{}", gone["id"]))
        .add_header(header::AUTHORIZATION, bearer(token))
        .await;
    response.assert_status(StatusCode::OK);

    let response = app
        .server
        .get(path)
        .add_header(header::AUTHORIZATION, bearer(token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["total"], 1, "{path} still lists a deleted row");
    assert_eq!(body["data"][0]["id"], kept["id"]);

    let response = app
        .server
        .get(&format!("{path}/{}", gone["id"]))
        .add_header(header::AUTHORIZATION, bearer(token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_soft_deleted_rows_leave_every_list() {
    let app = setup_test_app().await;
    let (_, token) = app.admin().await;
    let customer = create_customer(&app, &token, "Acme").await;

    assert_deleted_row_leaves_list(
        &app,
        &token,
        "/api/v1/user-groups",
        json!({ "title": "Old team", "default_permissions": {} }),
        json!({ "title": "New team", "default_permissions": {} }),
    )
    .await;
    assert_deleted_row_leaves_list(
        &app,
        &token,
        "/api/v1/currencies",
        json!({ "currency_code": "CHF", "name": "Swiss Franc" }),
        json!({ "currency_code": "CZK", "name": "Czech Koruna" }),
    )
    .await;
    assert_deleted_row_leaves_list(
        &app,
        &token,
        "/api/v1/business-types",
        json!({ "name": "Retail" }),
        json!({ "name": "Wholesale" }),
    )
    .await;
    assert_deleted_row_leaves_list(
        &app,
        &token,
        "/api/v1/notes",
        json!({ "customer_id": customer, "title": "Call", "content": "Left a message" }),
        json!({ "customer_id": customer, "title": "Meeting", "content": "Signed the engagement letter" }),
    )
    .await;
    assert_deleted_row_leaves_list(
        &app,
        &token,
        "/api/v1/matters",
        json!({ "customer_id": customer, "title": "Lease dispute" }),
        json!({ "customer_id": customer, "title": "Incorporation" }),
    )
    .await;
}
