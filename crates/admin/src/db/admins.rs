//! `PostgreSQL` admin store.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds
//! without a live database or an offline query cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use bitbox_admin_core::{AdminId, AuthorityType, Email};

use super::{AdminStore, AdminTransaction, RepositoryError};
use crate::models::Admin;

/// Primary key constraint of `admin.admin`.
const PRIMARY_KEY: &str = "admin_pkey";

const ADMIN_COLUMNS: &str = r"
    id, email, name, profile_image_url, authority, deleted, created_at, updated_at
";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` admin queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    email: String,
    name: String,
    profile_image_url: Option<String>,
    authority: AuthorityType,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for Admin {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            email,
            name: row.name,
            profile_image_url: row.profile_image_url,
            authority: row.authority,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// Admin store backed by the `admin.admin` table.
#[derive(Debug, Clone)]
pub struct PgAdminStore {
    pool: PgPool,
}

impl PgAdminStore {
    /// Create a new admin store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn begin(&self) -> Result<Box<dyn AdminTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAdminTransaction { tx }))
    }
}

/// A `PostgreSQL` transaction over admin records.
///
/// Dropping it without committing rolls back.
struct PgAdminTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgAdminTransaction {
    async fn fetch_by_id(
        &mut self,
        id: AdminId,
        for_update: bool,
    ) -> Result<Option<Admin>, RepositoryError> {
        let lock = if for_update { "FOR UPDATE" } else { "" };
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admin.admin WHERE id = $1 {lock}");

        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Run an insert statement binding every column of `admin` in order.
    async fn write(&mut self, sql: &str, admin: &Admin) -> Result<Admin, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(sql)
            .bind(admin.id)
            .bind(&admin.email)
            .bind(&admin.name)
            .bind(admin.profile_image_url.as_deref())
            .bind(admin.authority)
            .bind(admin.deleted)
            .bind(admin.created_at)
            .bind(admin.updated_at)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    if db_err.constraint() == Some(PRIMARY_KEY) {
                        return RepositoryError::IdConflict(admin.id);
                    }
                    return RepositoryError::Conflict("email already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        row.try_into()
    }
}

#[async_trait]
impl AdminTransaction for PgAdminTransaction {
    #[instrument(skip(self), fields(email = %email))]
    async fn count_active_by_email(&mut self, email: &Email) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM admin.admin
            WHERE email = $1 AND NOT deleted
            ",
        )
        .bind(email)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&mut self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        self.fetch_by_id(id, false).await
    }

    #[instrument(skip(self))]
    async fn find_by_id_for_update(
        &mut self,
        id: AdminId,
    ) -> Result<Option<Admin>, RepositoryError> {
        self.fetch_by_id(id, true).await
    }

    #[instrument(skip(self))]
    async fn find_all_active(&mut self) -> Result<Vec<Admin>, RepositoryError> {
        let sql = format!(
            "SELECT {ADMIN_COLUMNS} FROM admin.admin WHERE NOT deleted ORDER BY created_at, id"
        );

        let rows = sqlx::query_as::<_, AdminRow>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    async fn insert(&mut self, admin: &Admin) -> Result<Admin, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO admin.admin
                (id, email, name, profile_image_url, authority, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ADMIN_COLUMNS}
            "
        );

        let stored = self.write(&sql, admin).await?;
        debug!("Inserted admin row");
        Ok(stored)
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    async fn save(&mut self, admin: &Admin) -> Result<Admin, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO admin.admin
                (id, email, name, profile_image_url, authority, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                profile_image_url = EXCLUDED.profile_image_url,
                authority = EXCLUDED.authority,
                deleted = EXCLUDED.deleted,
                updated_at = EXCLUDED.updated_at
            RETURNING {ADMIN_COLUMNS}
            "
        );

        let stored = self.write(&sql, admin).await?;
        debug!(deleted = admin.deleted, "Saved admin row");
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
