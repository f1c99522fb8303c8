use service_core::events::{PURCHASE_ORDER_RECEIVED, SALES_ORDER_CONFIRMED};

use crate::models::OrderStatus;

/// Everything that distinguishes a sales order from a purchase order.
pub trait OrderKind: Send + Sync + 'static {
    /// Label used in logs and metrics.
    const NAME: &'static str;
    const ORDERS_TABLE: &'static str;
    const ITEMS_TABLE: &'static str;
    /// JSON field and column holding the counterparty reference.
    const COUNTERPARTY_FIELD: &'static str;
    /// Human name of the counterparty, for error messages.
    const COUNTERPARTY_LABEL: &'static str;
    /// Status an order moves to when it leaves `draft`.
    const ADVANCED: OrderStatus;
    /// Path segment of the advance endpoint.
    const ADVANCE_ACTION: &'static str;
    /// Topic published when an order leaves `draft`.
    const ADVANCE_TOPIC: &'static str;
}

/// Orders placed by customers: `draft -> confirmed -> paid`.
pub struct Sales;

impl OrderKind for Sales {
    const NAME: &'static str = "sales";
    const ORDERS_TABLE: &'static str = "sales_orders";
    const ITEMS_TABLE: &'static str = "sales_order_items";
    const COUNTERPARTY_FIELD: &'static str = "customer_id";
    const COUNTERPARTY_LABEL: &'static str = "Customer";
    const ADVANCED: OrderStatus = OrderStatus::Confirmed;
    const ADVANCE_ACTION: &'static str = "confirm";
    const ADVANCE_TOPIC: &'static str = SALES_ORDER_CONFIRMED;
}

/// Orders placed with vendors: `draft -> received -> paid`.
pub struct Purchase;

impl OrderKind for Purchase {
    const NAME: &'static str = "purchase";
    const ORDERS_TABLE: &'static str = "purchase_orders";
    const ITEMS_TABLE: &'static str = "purchase_order_items";
    const COUNTERPARTY_FIELD: &'static str = "vendor_id";
    const COUNTERPARTY_LABEL: &'static str = "Vendor";
    const ADVANCED: OrderStatus = OrderStatus::Received;
    const ADVANCE_ACTION: &'static str = "receive";
    const ADVANCE_TOPIC: &'static str = PURCHASE_ORDER_RECEIVED;
}
