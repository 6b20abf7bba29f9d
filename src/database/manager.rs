use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::types::SchemaName;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid schema name: {0}")]
    InvalidSchema(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Tenant user limit of {0} reached")]
    UserLimitReached(i32),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Platform tables live in `public`; each tenant gets its own schema.
const BOOTSTRAP_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS public.tenants (
        id UUID PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        schema_name VARCHAR(63) NOT NULL UNIQUE,
        owner_id UUID,
        contact_person VARCHAR(100) NOT NULL,
        email VARCHAR(254),
        phone_number VARCHAR(32) NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        paid_until DATE,
        on_trial BOOLEAN NOT NULL DEFAULT TRUE,
        max_users INTEGER NOT NULL DEFAULT 5,
        created_on DATE NOT NULL DEFAULT CURRENT_DATE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS public.domains (
        domain VARCHAR(253) PRIMARY KEY,
        tenant_id UUID NOT NULL REFERENCES public.tenants(id) ON DELETE CASCADE,
        is_primary BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS public.users (
        id UUID PRIMARY KEY,
        tenant_id UUID REFERENCES public.tenants(id) ON DELETE CASCADE,
        username VARCHAR(150) NOT NULL UNIQUE,
        email VARCHAR(254) NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        first_name VARCHAR(150) NOT NULL DEFAULT '',
        last_name VARCHAR(150) NOT NULL DEFAULT '',
        phone_number VARCHAR(20),
        company_name VARCHAR(255),
        company_size VARCHAR(20),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
        date_joined TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS public.token_blacklist (
        jti VARCHAR(64) PRIMARY KEY,
        expires_at TIMESTAMPTZ NOT NULL,
        blacklisted_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Owns the connection pool and schema-level DDL.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the platform tables if they do not exist yet
    pub async fn bootstrap(&self) -> Result<(), DatabaseError> {
        for statement in BOOTSTRAP_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Platform tables ready");
        Ok(())
    }

    /// Create a tenant schema inside an open transaction.
    pub async fn create_schema(
        tx: &mut Transaction<'static, Postgres>,
        schema: &SchemaName,
    ) -> Result<(), DatabaseError> {
        if schema.is_public() {
            return Err(DatabaseError::InvalidSchema(schema.to_string()));
        }
        let ddl = format!("CREATE SCHEMA {}", schema.quoted());
        sqlx::query(&ddl).execute(&mut **tx).await.map_err(|e| {
            let code = e
                .as_database_error()
                .and_then(|d| d.code())
                .map(|c| c.into_owned());
            match code.as_deref() {
                Some("42P06") => DatabaseError::Conflict(format!("schema '{}'", schema)),
                _ => DatabaseError::Sqlx(e),
            }
        })?;
        info!("Created schema {}", schema);
        Ok(())
    }

    /// Begin a transaction whose `search_path` is bound to one tenant schema.
    ///
    /// `SET LOCAL` scopes the binding to the transaction, so the pooled
    /// connection goes back to the pool unbound.
    pub async fn tenant_transaction(
        &self,
        schema: &SchemaName,
    ) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let stmt = format!("SET LOCAL search_path TO {}, public", schema.quoted());
        sqlx::query(&stmt).execute(&mut *tx).await?;
        Ok(tx)
    }

    /// Schema the tenant-bound connection actually resolves to.
    pub async fn bound_schema(&self, schema: &SchemaName) -> Result<String, DatabaseError> {
        let mut tx = self.tenant_transaction(schema).await?;
        let current: String = sqlx::query_scalar("SELECT current_schema()")
            .fetch_one(&mut *tx)
            .await?;
        tx.rollback().await?;
        Ok(current)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_creates_platform_tables_in_public() {
        for table in ["public.tenants", "public.domains", "public.users", "public.token_blacklist"] {
            assert!(
                BOOTSTRAP_STATEMENTS.iter().any(|s| s.contains(table)),
                "missing {table}"
            );
        }
    }
}
