use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Domain, Tenant, User};
use crate::types::SchemaName;

/// Tenant registry and domain routing table.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Create the tenant schema, the tenant row, its domain and its owner in
    /// one unit. Any duplicate (schema, domain, username, email) is a
    /// `DatabaseError::Conflict` and leaves nothing behind.
    async fn provision(&self, tenant: Tenant, domain: Domain, owner: User) -> Result<(Tenant, User), DatabaseError>;

    async fn tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, DatabaseError>;

    /// Tenant routed to the given host name (already lowercased, no port).
    async fn tenant_by_domain(&self, host: &str) -> Result<Option<Tenant>, DatabaseError>;

    async fn list_tenants(&self) -> Result<Vec<Tenant>, DatabaseError>;

    async fn update_tenant(&self, tenant: &Tenant) -> Result<(), DatabaseError>;

    /// Whether a connection bound to `schema` really resolves to it.
    async fn schema_ready(&self, schema: &SchemaName) -> Result<bool, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Credential store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, DatabaseError>;

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Look up by username, falling back to a case-insensitive email match.
    async fn user_by_login(&self, login: &str) -> Result<Option<User>, DatabaseError>;

    /// Insert a user into its tenant only while the tenant holds fewer than
    /// `max_users` accounts. The count and the insert are one step; a full
    /// tenant is `DatabaseError::UserLimitReached`.
    async fn create_user_within(&self, user: User, max_users: i32) -> Result<User, DatabaseError>;

    /// Move a user to another tenant. Issued tokens are unaffected.
    async fn set_tenant(&self, user_id: Uuid, tenant_id: Option<Uuid>) -> Result<User, DatabaseError>;
}

/// Revoked refresh-token ids.
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    /// Revoke `jti` until `expires_at`; entries past expiry may be purged.
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DatabaseError>;

    async fn is_revoked(&self, jti: &str) -> Result<bool, DatabaseError>;
}
