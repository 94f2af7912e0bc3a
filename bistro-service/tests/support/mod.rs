#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bistro_service::gateway::{PaymentProcessor, StubProcessor};
use bistro_service::metrics::ServiceMetrics;
use bistro_service::models::{NewUser, Registration};
use bistro_service::store::{MemoryStore, Store, UserRepository};
use bistro_service::tokens::TokenSigner;
use bistro_service::{build_router, AppState};
use common_auth::{JwtConfig, Role};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";
pub const ADMIN: &str = "chef@bistro.test";
pub const DINER: &str = "diner@bistro.test";

pub struct TestApp {
    pub router: Router,
    pub memory: Arc<MemoryStore>,
    pub signer: TokenSigner,
    pub metrics: Arc<ServiceMetrics>,
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig::new(SECRET)
}

pub fn app() -> TestApp {
    let memory = Arc::new(MemoryStore::default());
    app_with(Store::from_memory(memory.clone()), memory, Arc::new(StubProcessor::new()))
}

pub fn app_with(
    store: Store,
    memory: Arc<MemoryStore>,
    processor: Arc<dyn PaymentProcessor>,
) -> TestApp {
    let metrics = Arc::new(ServiceMetrics::new().unwrap());
    let state = AppState::new(store, jwt_config(), processor, metrics.clone());
    TestApp {
        router: build_router(state),
        memory,
        signer: TokenSigner::new(&jwt_config()),
        metrics,
    }
}

impl TestApp {
    pub fn token_for(&self, email: &str) -> String {
        self.signer.issue(json!({ "email": email })).unwrap()
    }

    pub async fn register(&self, email: &str) -> bistro_service::models::User {
        match self
            .memory
            .insert_if_absent(NewUser { email: email.into(), name: None })
            .await
            .unwrap()
        {
            Registration::Created(user) | Registration::Existing(user) => user,
        }
    }

    pub async fn register_admin(&self, email: &str) -> bistro_service::models::User {
        let mut user = self.register(email).await;
        assert!(self.memory.set_role(email, Role::Admin).unwrap());
        user.role = Role::Admin;
        user
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), 1024 * 256).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, headers, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, HeaderMap, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }
}

pub fn error_code(headers: &HeaderMap) -> Option<&str> {
    headers.get("X-Error-Code").and_then(|v| v.to_str().ok())
}
