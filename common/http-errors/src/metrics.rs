use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// Upper bound on distinct `code` label values; later codes collapse into `overflow`.
pub const MAX_ERROR_CODES: usize = 40;

const OVERFLOW_LABEL: &str = "overflow";
const UNLABELLED: &str = "unlabelled";

struct ErrorMetrics {
    registry: Registry,
    errors_total: IntCounterVec,
    distinct_codes: IntGauge,
    overflow_total: IntCounter,
    seen: Mutex<HashSet<String>>,
}

impl ErrorMetrics {
    fn new() -> Self {
        let registry = Registry::new();
        let errors_total = IntCounterVec::new(
            Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)",
            ),
            &["service", "code", "status"],
        )
        .expect("valid http_errors_total definition");
        let distinct_codes = IntGauge::new(
            "http_error_codes_distinct",
            "Distinct error codes currently used as label values",
        )
        .expect("valid http_error_codes_distinct definition");
        let overflow_total = IntCounter::new(
            "http_error_code_overflow_total",
            "Error responses whose code was folded into the overflow label",
        )
        .expect("valid http_error_code_overflow_total definition");
        let _ = registry.register(Box::new(errors_total.clone()));
        let _ = registry.register(Box::new(distinct_codes.clone()));
        let _ = registry.register(Box::new(overflow_total.clone()));
        Self {
            registry,
            errors_total,
            distinct_codes,
            overflow_total,
            seen: Mutex::new(HashSet::new()),
        }
    }

    fn label_for<'a>(&self, code: &'a str) -> &'a str {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if seen.contains(code) {
            return code;
        }
        if seen.len() < MAX_ERROR_CODES {
            seen.insert(code.to_owned());
            self.distinct_codes.set(seen.len() as i64);
            return code;
        }
        self.overflow_total.inc();
        OVERFLOW_LABEL
    }

    fn record(&self, service: &str, code: &str, status: u16) {
        let label = self.label_for(code);
        let status = status.to_string();
        self.errors_total
            .with_label_values(&[service, label, status.as_str()])
            .inc();
    }
}

static METRICS: Lazy<ErrorMetrics> = Lazy::new(ErrorMetrics::new);

/// Registry holding the error counters, for merging into a service's `/metrics` output.
pub fn error_metrics_registry() -> &'static Registry {
    &METRICS.registry
}

/// Middleware counting every response with status >= 400 by its `X-Error-Code`.
///
/// Use with `axum::middleware::from_fn(http_error_metrics_layer("svc"))`.
pub fn http_error_metrics_layer(
    service: &'static str,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send + Sync + 'static
{
    move |req: Request, next: Next| {
        Box::pin(async move {
            let resp = next.run(req).await;
            let status = resp.status().as_u16();
            if status >= 400 {
                let code = resp
                    .headers()
                    .get(ERROR_CODE_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or(UNLABELLED);
                METRICS.record(service, code, status);
            }
            resp
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_codes_are_capped_and_overflow_counted() {
        let metrics = ErrorMetrics::new();
        for i in 0..MAX_ERROR_CODES {
            metrics.record("test-svc", &format!("code_{i}"), 400);
        }
        assert_eq!(metrics.distinct_codes.get() as usize, MAX_ERROR_CODES);
        assert_eq!(metrics.overflow_total.get(), 0);

        metrics.record("test-svc", "one_too_many", 400);
        assert_eq!(metrics.distinct_codes.get() as usize, MAX_ERROR_CODES);
        assert_eq!(metrics.overflow_total.get(), 1);

        // previously seen codes keep their own label
        metrics.record("test-svc", "code_0", 400);
        assert_eq!(metrics.overflow_total.get(), 1);
        assert_eq!(
            metrics
                .errors_total
                .with_label_values(&["test-svc", "code_0", "400"])
                .get(),
            2
        );
    }
}
