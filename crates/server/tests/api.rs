use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use server::ServerState;

const OWNER: (&str, &str) = ("owner", "owner-pass");
const ADMIN: (&str, &str) = ("admin", "admin-pass");
const STRANGER: (&str, &str) = ("eve", "eve-pass");

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    for (username, password, super_admin) in [
        (OWNER.0, OWNER.1, false),
        (ADMIN.0, ADMIN.1, true),
        (STRANGER.0, STRANGER.1, false),
    ] {
        engine
            .create_user(username, password, super_admin)
            .await
            .unwrap();
    }
    server::router(ServerState {
        engine: Arc::new(engine),
    })
}

fn basic(credentials: (&str, &str)) -> String {
    let raw = format!("{}:{}", credentials.0, credentials.1);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(raw)
    )
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    credentials: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, String, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(credentials) = credentials {
        builder = builder.header(header::AUTHORIZATION, basic(credentials));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (
        status,
        content_type,
        String::from_utf8(bytes.to_vec()).unwrap(),
    )
}

async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    credentials: (&str, &str),
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _, text) = send(app, method, uri, Some(credentials), body).await;
    let value = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap()
    };
    (status, value)
}

/// Creates a business with one shop, a product with `stock` units and a
/// customer. Returns `(slug, product_id, customer_id)`.
async fn seed(app: &Router, stock: i64) -> (String, String, String) {
    let (status, business) = send_json(
        app,
        Method::POST,
        "/businesses",
        OWNER,
        Some(json!({ "name": "Acme Furniture", "currency": "GHS" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let slug = business["slug"].as_str().unwrap().to_string();

    let (status, shop) = send_json(
        app,
        Method::POST,
        &format!("/businesses/{slug}/shops"),
        OWNER,
        Some(json!({ "name": "Main" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(shop["slug"], "main");

    let (status, product) = send_json(
        app,
        Method::POST,
        &format!("/businesses/{slug}/shops/main/products"),
        OWNER,
        Some(json!({
            "name": "Sofa",
            "price_minor": 100_000,
            "stock_quantity": stock,
            "sku": "SOFA-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, customer) = send_json(
        app,
        Method::POST,
        &format!("/businesses/{slug}/customers"),
        OWNER,
        Some(json!({ "name": "Ama Mensah", "phone": "024 000 1111" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (
        slug,
        product["id"].as_str().unwrap().to_string(),
        customer["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn requests_without_valid_credentials_are_rejected() {
    let app = app().await;
    let (status, _, _) = send(&app, Method::GET, "/businesses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/businesses",
        Some(("owner", "wrong")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(&app, Method::GET, "/businesses", OWNER, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn credit_sale_and_payment_flow() {
    let app = app().await;
    let (slug, product_id, customer_id) = seed(&app, 3).await;

    let (status, detail) = send_json(
        &app,
        Method::POST,
        &format!("/businesses/{slug}/purchases"),
        OWNER,
        Some(json!({
            "shop": "main",
            "customer_id": customer_id,
            "purchase_type": "credit",
            "lines": [{ "product_id": product_id, "quantity": 1 }],
            "down_payment_minor": 10_000,
            "installment_count": 3,
            "frequency": "monthly"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(detail["purchase"]["status"], "active");
    assert_eq!(detail["purchase"]["outstanding_minor"], 90_000);
    assert_eq!(detail["installments"].as_array().unwrap().len(), 3);
    let purchase_id = detail["purchase"]["id"].as_str().unwrap().to_string();

    let (status, payment) = send_json(
        &app,
        Method::POST,
        &format!("/businesses/{slug}/purchases/{purchase_id}/payments"),
        OWNER,
        Some(json!({ "amount_minor": 30_000, "method": "mobile_money", "reference": "MM-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["status"], "confirmed");

    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/businesses/{slug}/purchases/{purchase_id}/payments"),
        OWNER,
        Some(json!({ "amount_minor": 1_000, "method": "cash", "reference": "MM-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some());

    let (status, list) = send_json(
        &app,
        Method::GET,
        &format!("/businesses/{slug}/purchases?status=active&limit=10"),
        OWNER,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["purchases"].as_array().unwrap().len(), 1);
    assert_eq!(list["purchases"][0]["purchase"]["outstanding_minor"], 60_000);
    assert!(list["next_cursor"].is_null());

    let (status, content_type, csv) = send(
        &app,
        Method::GET,
        &format!("/businesses/{slug}/purchases/export"),
        Some(OWNER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/csv"));
    assert_eq!(csv.lines().count(), 2);

    let (status, dashboard) = send_json(
        &app,
        Method::GET,
        &format!("/businesses/{slug}/dashboard"),
        OWNER,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["currency"], "GHS");
    assert_eq!(dashboard["collected_minor"], 40_000);
}

#[tokio::test]
async fn engine_errors_map_to_statuses() {
    let app = app().await;
    let (slug, product_id, customer_id) = seed(&app, 0).await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/businesses/{slug}/purchases"),
        OWNER,
        Some(json!({
            "shop": "main",
            "customer_id": customer_id,
            "purchase_type": "cash",
            "lines": [{ "product_id": product_id, "quantity": 1 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().is_some());

    let (status, _) = send_json(&app, Method::GET, "/businesses/nope", OWNER, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &app,
        Method::GET,
        &format!("/businesses/{slug}/customers"),
        STRANGER,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, Method::GET, "/admin/analytics", OWNER, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/businesses/{slug}/shops"),
        OWNER,
        Some(json!({ "name": "Annex" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send_json(
        &app,
        Method::DELETE,
        &format!("/admin/businesses/{slug}/subscription"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(
        &app,
        Method::POST,
        &format!("/businesses/{slug}/shops"),
        OWNER,
        Some(json!({ "name": "Annex" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn admin_manages_businesses_and_tickets() {
    let app = app().await;
    let (slug, _, _) = seed(&app, 1).await;

    let (status, ticket) = send_json(
        &app,
        Method::POST,
        &format!("/businesses/{slug}/tickets"),
        OWNER,
        Some(json!({ "subject": "Printer", "description": "Receipts are blank", "priority": "high" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let ticket_id = ticket["id"].as_str().unwrap().to_string();

    let (status, tickets) =
        send_json(&app, Method::GET, "/admin/tickets?status=open", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tickets.as_array().unwrap().len(), 1);

    let (status, ticket) = send_json(
        &app,
        Method::POST,
        &format!("/businesses/{slug}/tickets/{ticket_id}/status"),
        ADMIN,
        Some(json!({ "status": "resolved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["status"], "resolved");

    let (status, business) = send_json(
        &app,
        Method::POST,
        &format!("/admin/businesses/{slug}/active"),
        ADMIN,
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(business["active"], false);

    let (status, _) = send_json(
        &app,
        Method::PATCH,
        &format!("/businesses/{slug}"),
        OWNER,
        Some(json!({ "name": "Acme Home" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, all) = send_json(&app, Method::GET, "/admin/businesses", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);
}
