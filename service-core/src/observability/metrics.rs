//! Prometheus exposition shared by every service.
//!
//! HTTP request metrics flow through the `metrics` facade into the installed
//! Prometheus recorder. Domain metrics are registered by each service on the
//! default `prometheus` registry. `/metrics` renders both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{Encoder, TextEncoder};
use once_cell::sync::OnceCell;

use crate::error::AppError;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global recorder. Later calls are no-ops.
pub fn install_metrics_recorder() -> Result<(), AppError> {
    METRICS_HANDLE.get_or_try_init(|| {
        PrometheusBuilder::new().install_recorder().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))
        })
    })?;
    Ok(())
}

pub fn render_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
    }
    output.push_str(&String::from_utf8_lossy(&buffer));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use prometheus::{IntCounter, register_int_counter};

    static TEST_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
        register_int_counter!("service_core_render_test_total", "Render test counter")
            .expect("Failed to register test counter")
    });

    #[test]
    fn test_render_includes_registered_collectors() {
        TEST_COUNTER.inc();
        let output = render_metrics();
        assert!(output.contains("service_core_render_test_total"));
    }
}
