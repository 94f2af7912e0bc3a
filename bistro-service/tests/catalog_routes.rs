mod support;

use axum::http::{Method, StatusCode};
use bistro_service::models::Review;
use bistro_service::store::UserRepository;
use serde_json::{json, Value};
use support::{app, error_code, ADMIN, DINER};
use uuid::Uuid;

#[tokio::test]
async fn liveness_routes_answer_without_auth() {
    let app = app();
    let (status, _, body) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("bistro service is running".into()));

    let (status, _, body) = app.get("/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn registering_twice_reports_existing_user() {
    let app = app();
    let (status, _, first) = app
        .post("/users", None, json!({ "email": DINER, "name": "Dana" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["insertedId"].is_string());

    let (status, _, second) = app
        .post("/users", None, json!({ "email": DINER, "role": "admin" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, json!({ "message": "user already exists", "insertedId": null }));
    assert_eq!(app.memory.count().await.unwrap(), 1);
}

#[tokio::test]
async fn registration_ignores_a_requested_role() {
    let app = app();
    app.post("/users", None, json!({ "email": DINER, "role": "admin" })).await;
    let stored = app.memory.find_by_email(DINER).await.unwrap().unwrap();
    assert!(!stored.role.is_admin());
}

#[tokio::test]
async fn registration_requires_an_email() {
    let app = app();
    let (status, headers, _) = app.post("/users", None, json!({ "email": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&headers), Some("invalid_email"));
}

#[tokio::test]
async fn jwt_endpoint_issues_verifiable_tokens() {
    let app = app();
    app.register(DINER).await;
    let (status, _, body) = app.post("/jwt", None, json!({ "email": DINER })).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_owned();

    let (status, _, _) = app.get("/payments?email=diner@bistro.test", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, _) = app.post("/jwt", None, json!({ "name": "nobody" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&headers), Some("invalid_token_payload"));
}

#[tokio::test]
async fn menu_reads_are_public_and_writes_need_admin() {
    let app = app();
    app.register(DINER).await;
    app.register_admin(ADMIN).await;
    let item = json!({ "name": "Bouillabaisse", "category": "soup", "price": "18.50", "recipe": "fish" });

    let diner = app.token_for(DINER);
    let (status, _, _) = app.post("/menu", Some(&diner), item.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token_for(ADMIN);
    let (status, _, created) = app.post("/menu", Some(&admin), item).await;
    assert_eq!(status, StatusCode::OK);
    let id = created["insertedId"].as_str().unwrap().to_owned();

    let (_, _, listed) = app.get("/menu", None).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, _, fetched) = app.get(&format!("/menu/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Bouillabaisse");
    assert_eq!(fetched["price"], "18.50");

    let (_, _, outcome) = app
        .send(
            Method::PATCH,
            &format!("/menu/{id}"),
            Some(&admin),
            Some(json!({ "price": "19.00" })),
        )
        .await;
    assert_eq!(outcome, json!({ "matchedCount": 1, "modifiedCount": 1 }));

    let (_, _, outcome) = app
        .send(Method::DELETE, &format!("/menu/{id}"), Some(&admin), None)
        .await;
    assert_eq!(outcome, json!({ "deletedCount": 1 }));

    let (status, _, gone) = app.get(&format!("/menu/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gone, Value::Null);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let app = app();
    let (status, headers, body) = app.get("/menu/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&headers), Some("invalid_id"));
    assert_eq!(body["code"], "invalid_id");
}

#[tokio::test]
async fn negative_and_unbounded_prices_are_rejected() {
    let app = app();
    app.register_admin(ADMIN).await;
    let admin = app.token_for(ADMIN);
    for price in ["-1.00", "1e2000000"] {
        let (status, headers, _) = app
            .post(
                "/menu",
                Some(&admin),
                json!({ "name": "Refund", "category": "x", "price": price }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {price}");
        assert_eq!(error_code(&headers), Some("invalid_price"));
    }
}

#[tokio::test]
async fn reviews_list_seeded_entries() {
    let app = app();
    app.memory
        .insert_review(Review {
            id: Uuid::new_v4(),
            name: "Ines".into(),
            details: "Lovely soup".into(),
            rating: 5,
        })
        .unwrap();
    let (status, _, body) = app.get("/reviews", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["rating"], 5);
}

#[tokio::test]
async fn cart_lines_are_listed_by_email() {
    let app = app();
    let line = json!({
        "email": DINER,
        "menuItemId": Uuid::new_v4(),
        "name": "Tarte Tatin",
        "price": "9.00"
    });
    let (status, _, created) = app.post("/carts", None, line).await;
    assert_eq!(status, StatusCode::OK);
    let id = created["insertedId"].as_str().unwrap().to_owned();

    let (_, _, mine) = app.get("/carts?email=diner@bistro.test", None).await;
    assert_eq!(mine[0]["quantity"], 1);
    assert_eq!(mine[0]["menuItemId"].as_str().map(str::len), Some(36));

    let (_, _, unfiltered) = app.get("/carts", None).await;
    assert_eq!(unfiltered, json!([]));

    let (_, _, deleted) = app
        .send(Method::DELETE, &format!("/carts/{id}"), None, None)
        .await;
    assert_eq!(deleted, json!({ "deletedCount": 1 }));
}

#[tokio::test]
async fn metrics_expose_error_counters() {
    let app = app();
    app.get("/admin-stats", None).await;
    let (status, _, body) = app.get("/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap_or_default();
    assert!(text.contains("http_errors_total"), "metrics output: {text}");
}
