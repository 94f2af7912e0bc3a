use axum::{
    extract::{Query, State},
    Json,
};
use bigdecimal::BigDecimal;
use common_auth::{ensure_self, AuthContext};
use common_http_errors::{ApiError, ApiResult};
use common_money::to_minor_units;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::gateway::{MIN_CHARGE_MINOR, PROCESSOR_CURRENCY};
use crate::models::Payment;
use crate::settlement::{SettlementError, SettlementRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub price: BigDecimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
}

pub async fn create_payment_intent(
    auth: AuthContext,
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>,
) -> ApiResult<Json<IntentResponse>> {
    let amount_minor = to_minor_units(&req.price)
        .map_err(|err| ApiError::invalid("invalid_amount", err.to_string()))?;
    if amount_minor < MIN_CHARGE_MINOR {
        state.metrics.payment_intent("rejected");
        return Err(ApiError::invalid(
            "amount_below_minimum",
            format!("charge must be at least {MIN_CHARGE_MINOR} minor units"),
        ));
    }

    match state
        .processor
        .create_intent(amount_minor, PROCESSOR_CURRENCY)
        .await
    {
        Ok(intent) => {
            state.metrics.payment_intent("created");
            info!(email = %auth.email(), intent_id = %intent.id, amount_minor, "payment intent created");
            Ok(Json(IntentResponse {
                client_secret: intent.client_secret,
            }))
        }
        Err(err) => {
            state.metrics.payment_intent("failed");
            warn!(error = %err, email = %auth.email(), amount_minor, "payment intent failed");
            Err(ApiError::processor_unavailable(err))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentQuery {
    pub email: Option<String>,
}

pub async fn list_payments(
    auth: AuthContext,
    State(state): State<AppState>,
    Query(query): Query<PaymentQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    ensure_self(&auth, query.email.as_deref())?;
    let payments = state
        .store
        .ledger
        .list_for(auth.email())
        .await
        .map_err(|err| ApiError::internal(err, None))?;
    Ok(Json(payments))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(alias = "price")]
    pub amount: BigDecimal,
    #[serde(default, alias = "menuIds")]
    pub menu_item_ids: Vec<Uuid>,
    #[serde(default)]
    pub cart_ids: Vec<Uuid>,
    pub transaction_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedPayment {
    pub inserted_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDeletion {
    pub deleted_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub payment_result: InsertedPayment,
    pub delete_result: CartDeletion,
}

/// Records a confirmed charge and clears the cart lines it paid for.
pub async fn settle_payment(
    auth: AuthContext,
    State(state): State<AppState>,
    Json(body): Json<PaymentBody>,
) -> ApiResult<Json<SettlementResponse>> {
    if let Some(owner) = body.email.as_deref() {
        ensure_self(&auth, Some(owner))?;
    }
    if body.transaction_id.trim().is_empty() {
        return Err(ApiError::invalid("invalid_transaction", "transactionId is required"));
    }

    let request = SettlementRequest {
        email: auth.email().to_owned(),
        amount: body.amount,
        menu_item_ids: body.menu_item_ids,
        cart_ids: body.cart_ids,
        transaction_id: body.transaction_id,
        status: body.status,
    };

    match state.settlement.settle(request).await {
        Ok(outcome) => {
            state.metrics.settlement("committed");
            Ok(Json(SettlementResponse {
                payment_result: InsertedPayment {
                    inserted_id: outcome.payment.id,
                },
                delete_result: CartDeletion {
                    deleted_count: outcome.deleted_count,
                },
            }))
        }
        Err(err @ (SettlementError::InvalidAmount | SettlementError::Amount(_))) => {
            state.metrics.settlement("rejected");
            Err(ApiError::invalid("invalid_amount", err.to_string()))
        }
        Err(err @ SettlementError::Ledger(_)) => {
            state.metrics.settlement("failed");
            Err(ApiError::settlement_failed(err, None))
        }
    }
}
