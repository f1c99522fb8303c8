pub mod credentials;
pub mod metrics;

pub use credentials::ServiceCredentials;
pub use metrics::{get_metrics, init_metrics};
