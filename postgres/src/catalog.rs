//! `PostgreSQL` puja catalog and pujari roster.
//!
//! The booking engine only reads these tables; the upserts exist so
//! deployments and tests can seed them.

use async_trait::async_trait;
use bmp_core::store::{Catalog, OperatorDirectory};
use bmp_core::{CatalogEntry, PujaId, PujaType, PujariId, PujariSummary, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

/// `PostgreSQL`-backed [`Catalog`].
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Create a catalog over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the write fails.
    pub async fn upsert(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO pujas (id, name, slug, duration, is_active, puja_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                slug = EXCLUDED.slug,
                duration = EXCLUDED.duration,
                is_active = EXCLUDED.is_active,
                puja_type = EXCLUDED.puja_type,
                updated_at = now()
            ",
        )
        .bind(entry.id.as_uuid())
        .bind(&entry.name)
        .bind(&entry.slug)
        .bind(&entry.duration)
        .bind(entry.is_active)
        .bind(entry.puja_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to save puja: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for PostgresCatalog {
    async fn find_by_id(&self, id: PujaId) -> Result<Option<CatalogEntry>, StoreError> {
        let row: Option<(Uuid, String, String, String, bool, String)> = sqlx::query_as(
            r"
            SELECT id, name, slug, duration, is_active, puja_type
            FROM pujas
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to load puja: {e}")))?;

        row.map(|(id, name, slug, duration, is_active, puja_type)| {
            let puja_type: PujaType = puja_type
                .parse()
                .map_err(|e: bmp_core::LifecycleError| StoreError::Serialization(e.to_string()))?;
            Ok(CatalogEntry {
                id: PujaId::from_uuid(id),
                name,
                slug,
                duration,
                is_active,
                puja_type,
            })
        })
        .transpose()
    }
}

/// `PostgreSQL`-backed [`OperatorDirectory`].
#[derive(Clone)]
pub struct PostgresOperatorDirectory {
    pool: PgPool,
}

impl PostgresOperatorDirectory {
    /// Create a directory over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a pujari, replacing the name and mobile if already present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the write fails.
    pub async fn register(&self, id: PujariId, name: &str, mobile: &str) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO pujaris (id, name, mobile)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, mobile = EXCLUDED.mobile
            ",
        )
        .bind(id.as_uuid())
        .bind(name)
        .bind(mobile)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to save pujari: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl OperatorDirectory for PostgresOperatorDirectory {
    async fn find_by_id(&self, id: PujariId) -> Result<Option<PujariSummary>, StoreError> {
        let row: Option<(Uuid, String, String)> =
            sqlx::query_as("SELECT id, name, mobile FROM pujaris WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to load pujari: {e}")))?;

        Ok(row.map(|(id, name, mobile)| PujariSummary {
            id: PujariId::from_uuid(id),
            name,
            mobile,
        }))
    }

    async fn exists(&self, id: PujariId) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pujaris WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to check pujari: {e}")))?;
        Ok(exists)
    }
}
