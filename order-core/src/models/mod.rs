//! Order records and the request/response payloads of the order API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use service_core::error::AppError;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::kind::OrderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Confirmed,
    Received,
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Received => "received",
            OrderStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OrderStatus::Draft),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "received" => Ok(OrderStatus::Received),
            "paid" => Ok(OrderStatus::Paid),
            other => Err(AppError::InternalError(anyhow::anyhow!(
                "Unknown order status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub counterparty_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database shape of an order; the status column is plain text.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub counterparty_id: Uuid,
    pub status: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            counterparty_id: row.counterparty_id,
            status: row.status.parse()?,
            total_amount: row.total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One priced line. `unit_price` is the registry price at the time the line
/// was validated and is never refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl OrderItem {
    /// Fails with `BadRequest` when `unit_price * quantity` does not fit a decimal.
    pub fn priced(
        order_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<Self, AppError> {
        let subtotal = unit_price.checked_mul(Decimal::from(quantity)).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Subtotal for item {} is out of range",
                item_id
            ))
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            order_id,
            item_id,
            quantity,
            unit_price,
            subtotal,
        })
    }
}

pub fn total_of(items: &[OrderItem]) -> Result<Decimal, AppError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        total
            .checked_add(item.subtotal)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Order total is out of range")))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    pub fn id(&self) -> Uuid {
        self.order.id
    }

    pub fn status(&self) -> OrderStatus {
        self.order.status
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLineRequest {
    pub item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub counterparty_id: Uuid,
    pub items: Vec<OrderLineRequest>,
}

/// Wire body of `POST /orders`. Only the counterparty field of the order
/// kind is read: `customer_id` for sales, `vendor_id` for purchases.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderBody {
    pub customer_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100), nested)]
    pub items: Vec<OrderLineRequest>,
}

impl CreateOrderBody {
    pub fn into_request<K: OrderKind>(self) -> Result<CreateOrderRequest, AppError> {
        let counterparty = match K::COUNTERPARTY_FIELD {
            "customer_id" => self.customer_id,
            "vendor_id" => self.vendor_id,
            _ => None,
        };
        let counterparty_id = counterparty.ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("{} is required", K::COUNTERPARTY_FIELD))
        })?;

        Ok(CreateOrderRequest {
            counterparty_id,
            items: self.items,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, max = 100), nested)]
    pub items: Vec<OrderLineRequest>,
}

/// API view of an order, naming the counterparty after the order kind
/// (`customer_id` or `vendor_id`).
pub struct OrderResponse<K> {
    pub order: OrderWithItems,
    _kind: PhantomData<fn() -> K>,
}

impl<K: OrderKind> From<OrderWithItems> for OrderResponse<K> {
    fn from(order: OrderWithItems) -> Self {
        Self {
            order,
            _kind: PhantomData,
        }
    }
}

impl<K: OrderKind> Serialize for OrderResponse<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let order = &self.order.order;
        let mut state = serializer.serialize_struct("Order", 7)?;
        state.serialize_field("id", &order.id)?;
        state.serialize_field(K::COUNTERPARTY_FIELD, &order.counterparty_id)?;
        state.serialize_field("status", &order.status)?;
        state.serialize_field("total_amount", &order.total_amount)?;
        state.serialize_field("items", &self.order.items)?;
        state.serialize_field("created_at", &order.created_at)?;
        state.serialize_field("updated_at", &order.updated_at)?;
        state.end()
    }
}
