use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::middleware;
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use common_auth::{JwtConfig, JwtVerifier};
use common_http_errors::{http_error_metrics_layer, ApiError};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod analytics;
pub mod analytics_handlers;
pub mod cart_handlers;
pub mod config;
pub mod gateway;
pub mod guards;
pub mod menu_handlers;
pub mod metrics;
pub mod models;
pub mod payment_handlers;
pub mod review_handlers;
pub mod settlement;
pub mod store;
pub mod token_handlers;
pub mod tokens;
pub mod user_handlers;

use analytics::AnalyticsAggregator;
use gateway::PaymentProcessor;
use guards::RoleGate;
use metrics::ServiceMetrics;
use settlement::SettlementWorkflow;
use store::Store;
use tokens::TokenSigner;

pub const SERVICE_NAME: &str = "bistro-service";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub token_signer: Arc<TokenSigner>,
    pub processor: Arc<dyn PaymentProcessor>,
    pub metrics: Arc<ServiceMetrics>,
    pub role_gate: RoleGate,
    pub settlement: SettlementWorkflow,
    pub analytics: AnalyticsAggregator,
}

impl AppState {
    pub fn new(
        store: Store,
        jwt: JwtConfig,
        processor: Arc<dyn PaymentProcessor>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            role_gate: RoleGate::new(store.users.clone(), metrics.clone()),
            settlement: SettlementWorkflow::new(store.ledger.clone()),
            analytics: AnalyticsAggregator::new(store.clone()),
            token_signer: Arc::new(TokenSigner::new(&jwt)),
            jwt_verifier: Arc::new(JwtVerifier::new(jwt)),
            store,
            processor,
            metrics,
        }
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

impl FromRef<AppState> for Arc<TokenSigner> {
    fn from_ref(state: &AppState) -> Self {
        state.token_signer.clone()
    }
}

impl FromRef<AppState> for RoleGate {
    fn from_ref(state: &AppState) -> Self {
        state.role_gate.clone()
    }
}

/// Path ids arrive as strings so a malformed one gets the JSON error envelope.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::invalid("invalid_id", format!("'{raw}' is not a valid id")))
}

async fn banner() -> &'static str {
    "bistro service is running"
}

async fn health() -> &'static str {
    "ok"
}

async fn render_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    state.metrics.render().map_err(|err| ApiError::internal(err, None))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/healthz", get(health))
        .route("/metrics", get(render_metrics))
        .route("/jwt", post(token_handlers::issue_token))
        .route(
            "/users",
            post(user_handlers::register_user).get(user_handlers::list_users),
        )
        .route(
            "/users/admin/:user",
            get(user_handlers::admin_status).patch(user_handlers::promote_user),
        )
        .route("/users/:id", delete(user_handlers::delete_user))
        .route(
            "/menu",
            get(menu_handlers::list_menu).post(menu_handlers::create_menu_item),
        )
        .route(
            "/menu/:id",
            get(menu_handlers::get_menu_item)
                .patch(menu_handlers::update_menu_item)
                .delete(menu_handlers::delete_menu_item),
        )
        .route("/reviews", get(review_handlers::list_reviews))
        .route(
            "/carts",
            post(cart_handlers::add_to_cart).get(cart_handlers::list_cart),
        )
        .route("/carts/:id", delete(cart_handlers::delete_cart_item))
        .route(
            "/create-payment-intent",
            post(payment_handlers::create_payment_intent),
        )
        .route(
            "/payments",
            post(payment_handlers::settle_payment).get(payment_handlers::list_payments),
        )
        .route("/order-stats", get(analytics_handlers::order_stats))
        .route("/admin-stats", get(analytics_handlers::admin_stats))
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics_layer(SERVICE_NAME)))
        .layer(TraceLayer::new_for_http())
}
