//! Checkout settlement: one ledger entry per confirmed charge, with the consumed cart
//! lines removed in the same unit of work.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use common_money::{to_minor_units, MoneyError};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{NewPayment, Payment};
use crate::store::LedgerRepository;

pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub email: String,
    pub amount: BigDecimal,
    pub menu_item_ids: Vec<Uuid>,
    pub cart_ids: Vec<Uuid>,
    pub transaction_id: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub payment: Payment,
    pub deleted_count: u64,
}

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error(transparent)]
    Amount(#[from] MoneyError),
    #[error("ledger write failed: {0:#}")]
    Ledger(anyhow::Error),
}

#[derive(Clone)]
pub struct SettlementWorkflow {
    ledger: Arc<dyn LedgerRepository>,
}

impl SettlementWorkflow {
    pub fn new(ledger: Arc<dyn LedgerRepository>) -> Self {
        Self { ledger }
    }

    pub async fn settle(
        &self,
        request: SettlementRequest,
    ) -> Result<SettlementOutcome, SettlementError> {
        // compare in cents; the raw decimal may carry an unbounded exponent
        let amount_minor = to_minor_units(&request.amount)?;
        if amount_minor <= 0 {
            return Err(SettlementError::InvalidAmount);
        }

        let status = request
            .status
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS.to_owned());
        let payment = NewPayment {
            email: request.email,
            amount: request.amount,
            amount_minor,
            menu_item_ids: request.menu_item_ids,
            cart_ids: request.cart_ids,
            transaction_id: request.transaction_id,
            status,
        };
        let email = payment.email.clone();

        match self.ledger.settle(payment).await {
            Ok(record) => {
                info!(
                    payment_id = %record.payment.id,
                    %email,
                    amount_minor,
                    deleted = record.deleted,
                    "settlement committed"
                );
                Ok(SettlementOutcome {
                    payment: record.payment,
                    deleted_count: record.deleted,
                })
            }
            Err(err) => {
                error!(error = ?err, %email, amount_minor, "settlement rolled back");
                Err(SettlementError::Ledger(err))
            }
        }
    }
}
