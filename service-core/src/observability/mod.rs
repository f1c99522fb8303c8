pub mod logging;
pub mod metrics;
pub mod trace_context;

pub use logging::{init_tracing, shutdown_tracing};
pub use metrics::{install_metrics_recorder, render_metrics};
pub use trace_context::{propagation_headers, TracedClientExt, REQUEST_ID_HEADER};
