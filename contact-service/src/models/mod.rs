//! Customer and vendor records.
//!
//! Both registries store the same shape; [`ContactKind`] selects the table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Customer,
    Vendor,
}

impl ContactKind {
    pub fn table(&self) -> &'static str {
        match self {
            ContactKind::Customer => "customers",
            ContactKind::Vendor => "vendors",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContactKind::Customer => "customer",
            ContactKind::Vendor => "vendor",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ContactKind::Customer => "Customer",
            ContactKind::Vendor => "Vendor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

impl Contact {
    pub fn new(req: CreateContactRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            email: req.email.to_lowercase(),
            phone: req.phone,
            created_at: now,
            updated_at: now,
        }
    }
}
