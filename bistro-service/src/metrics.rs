use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use common_http_errors::error_metrics_registry;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,
    settlements: IntCounterVec,
    gate_decisions: IntCounterVec,
    payment_intents: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let settlements = IntCounterVec::new(
            Opts::new("settlements_total", "Count of settlement attempts grouped by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(settlements.clone()))?;

        let gate_decisions = IntCounterVec::new(
            Opts::new(
                "gate_decisions_total",
                "Count of admin role gate decisions grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(gate_decisions.clone()))?;

        let payment_intents = IntCounterVec::new(
            Opts::new(
                "payment_intents_total",
                "Count of processor charge intents grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(payment_intents.clone()))?;

        Ok(Self {
            registry,
            settlements,
            gate_decisions,
            payment_intents,
        })
    }

    pub fn settlement(&self, outcome: &str) {
        self.settlements.with_label_values(&[outcome]).inc();
    }

    pub fn gate_decision(&self, outcome: &str) {
        self.gate_decisions.with_label_values(&[outcome]).inc();
    }

    pub fn payment_intent(&self, outcome: &str) {
        self.payment_intents.with_label_values(&[outcome]).inc();
    }

    pub fn settlement_count(&self, outcome: &str) -> u64 {
        self.settlements.with_label_values(&[outcome]).get()
    }

    pub fn gate_decision_count(&self, outcome: &str) -> u64 {
        self.gate_decisions.with_label_values(&[outcome]).get()
    }

    /// Text exposition of the service counters followed by the shared HTTP error counters.
    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let mut metric_families = self.registry.gather();
        metric_families.extend(error_metrics_registry().gather());
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
