//! Contact persistence.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::metrics::DB_QUERY_DURATION;
use crate::models::{Contact, ContactKind};

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create(&self, kind: ContactKind, contact: Contact) -> Result<Contact, AppError>;

    async fn get(&self, kind: ContactKind, id: Uuid) -> Result<Option<Contact>, AppError>;

    async fn list(&self, kind: ContactKind, limit: i64, offset: i64)
        -> Result<Vec<Contact>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        tracing::info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    #[instrument(skip(self, contact), fields(kind = kind.label(), contact_id = %contact.id))]
    async fn create(&self, kind: ContactKind, contact: Contact) -> Result<Contact, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_contact"])
            .start_timer();

        let sql = format!(
            r#"
            INSERT INTO {} (id, name, email, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, created_at, updated_at
            "#,
            kind.table()
        );

        let created = sqlx::query_as::<_, Contact>(&sql)
            .bind(contact.id)
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.phone)
            .bind(contact.created_at)
            .bind(contact.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(&format!("Failed to create {}", kind.label()), e))?;

        timer.observe_duration();
        Ok(created)
    }

    #[instrument(skip(self), fields(kind = kind.label()))]
    async fn get(&self, kind: ContactKind, id: Uuid) -> Result<Option<Contact>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_contact"])
            .start_timer();

        let sql = format!(
            "SELECT id, name, email, phone, created_at, updated_at FROM {} WHERE id = $1",
            kind.table()
        );

        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(&format!("Failed to get {}", kind.label()), e))?;

        timer.observe_duration();
        Ok(contact)
    }

    #[instrument(skip(self), fields(kind = kind.label()))]
    async fn list(
        &self,
        kind: ContactKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_contacts"])
            .start_timer();

        let sql = format!(
            r#"
            SELECT id, name, email, phone, created_at, updated_at
            FROM {}
            ORDER BY created_at DESC, id
            LIMIT $1 OFFSET $2
            "#,
            kind.table()
        );

        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(&format!("Failed to list {}s", kind.label()), e))?;

        timer.observe_duration();
        Ok(contacts)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        service_core::db::health_check(&self.pool).await
    }
}
