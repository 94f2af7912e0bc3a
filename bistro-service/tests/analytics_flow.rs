mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::{app, ADMIN, DINER};
use uuid::Uuid;

#[tokio::test]
async fn admin_stats_start_at_zero_and_sum_payments() {
    let app = app();
    app.register(DINER).await;
    app.register_admin(ADMIN).await;
    let admin = app.token_for(ADMIN);

    let (status, _, stats) = app.get("/admin-stats", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({ "users": 2, "menuItems": 0, "paymentItems": 0, "revenue": "0.00" })
    );

    let diner = app.token_for(DINER);
    for amount in ["10", "15"] {
        let (status, _, _) = app
            .post(
                "/payments",
                Some(&diner),
                json!({ "amount": amount, "transactionId": format!("pi_{amount}") }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, _, stats) = app.get("/admin-stats", Some(&admin)).await;
    assert_eq!(stats["paymentItems"], 2);
    assert_eq!(stats["revenue"], "25.00");
}

#[tokio::test]
async fn order_stats_join_against_catalog() {
    let app = app();
    app.register_admin(ADMIN).await;
    let admin = app.token_for(ADMIN);
    let (_, _, created) = app
        .post(
            "/menu",
            Some(&admin),
            json!({ "name": "Ratatouille", "category": "main", "price": "16.00" }),
        )
        .await;
    let known = created["insertedId"].as_str().unwrap().to_owned();
    let unknown = Uuid::new_v4().to_string();

    let diner = app.token_for(DINER);
    let (status, _, _) = app
        .post(
            "/payments",
            Some(&diner),
            json!({
                "amount": "16.00",
                "transactionId": "pi_join",
                "menuItemIds": [known, unknown]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, rows) = app.get("/order-stats", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["menuItemId"], known);
    assert_eq!(rows[0]["menuItems"][0]["name"], "Ratatouille");
    assert_eq!(rows[0]["transactionId"], "pi_join");

    assert_eq!(rows[1]["menuItemId"], unknown);
    assert_eq!(rows[1]["menuItems"], json!([]));
    assert_eq!(rows[1]["email"], DINER);
}

#[tokio::test]
async fn admin_stats_are_admin_only() {
    let app = app();
    app.register(DINER).await;
    let token = app.token_for(DINER);
    let (status, _, _) = app.get("/admin-stats", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
