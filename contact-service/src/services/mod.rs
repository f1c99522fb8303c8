pub mod memory;
pub mod metrics;
pub mod store;

pub use memory::InMemoryContactStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::{ContactStore, PgContactStore};
