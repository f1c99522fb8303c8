use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ContactStore;
use crate::models::{Contact, ContactKind};

/// In-process store for tests and local runs without PostgreSQL.
#[derive(Clone, Default)]
pub struct InMemoryContactStore {
    customers: Arc<RwLock<HashMap<Uuid, Contact>>>,
    vendors: Arc<RwLock<HashMap<Uuid, Contact>>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: ContactKind) -> &Arc<RwLock<HashMap<Uuid, Contact>>> {
        match kind {
            ContactKind::Customer => &self.customers,
            ContactKind::Vendor => &self.vendors,
        }
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn create(&self, kind: ContactKind, contact: Contact) -> Result<Contact, AppError> {
        let mut table = self.table(kind).write().await;
        if table.values().any(|c| c.email == contact.email) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Failed to create {}: duplicate key",
                kind.label()
            )));
        }
        table.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn get(&self, kind: ContactKind, id: Uuid) -> Result<Option<Contact>, AppError> {
        Ok(self.table(kind).read().await.get(&id).cloned())
    }

    async fn list(
        &self,
        kind: ContactKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, AppError> {
        let mut contacts: Vec<Contact> = self.table(kind).read().await.values().cloned().collect();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(contacts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
