//! Order workflow shared by sales-service and purchase-service.
//!
//! Both services run the same pipeline: validate the counterparty and price
//! every line against the registries, persist the order and its items in one
//! transaction, then walk the order through a fixed lifecycle. The only
//! differences between them are captured by [`OrderKind`].

pub mod handlers;
pub mod kind;
pub mod lookup;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod repository;

pub use handlers::order_routes;
pub use kind::{OrderKind, Purchase, Sales};
pub use lookup::{CounterpartyLookup, ItemCatalog};
pub use models::{Order, OrderItem, OrderStatus, OrderWithItems};
pub use orchestrator::OrderOrchestrator;
pub use repository::{InMemoryOrderRepository, OrderRepository, PgOrderRepository};
