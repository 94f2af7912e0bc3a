use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

pub const PROCESSOR_CURRENCY: &str = "usd";
pub const PROCESSOR_METHOD: &str = "card";
/// Smallest charge the processor accepts, in minor units.
pub const MIN_CHARGE_MINOR: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("processor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("processor rejected intent ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("processor response missing {0}")]
    Decode(&'static str),
}

#[async_trait::async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<ChargeIntent, ProcessorError>;
}

/// Client for a Stripe-compatible `/v1/payment_intents` endpoint.
pub struct StripeProcessor {
    client: Client,
    base_url: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct IntentResponse {
    id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl StripeProcessor {
    pub fn new(
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProcessorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait::async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<ChargeIntent, ProcessorError> {
        let url = format!("{}/v1/payment_intents", self.base_url);
        let amount = amount_minor.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("payment_method_types[]", PROCESSOR_METHOD),
        ];
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ProcessorError::Rejected { status: status.as_u16(), message });
        }

        let body: IntentResponse = response.json().await?;
        let client_secret = body.client_secret.ok_or(ProcessorError::Decode("client_secret"))?;
        Ok(ChargeIntent {
            id: body.id.unwrap_or_default(),
            client_secret,
        })
    }
}

/// Local stand-in used when no processor key is configured.
pub struct StubProcessor;

impl StubProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PaymentProcessor for StubProcessor {
    async fn create_intent(
        &self,
        amount_minor: i64,
        _currency: &str,
    ) -> Result<ChargeIntent, ProcessorError> {
        let id = format!("pi_stub_{}", Uuid::new_v4().simple());
        Ok(ChargeIntent {
            client_secret: format!("{id}_secret_{amount_minor}"),
            id,
        })
    }
}
