use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Domain, Tenant, User};
use crate::database::repository::{TenantRepository, TokenBlacklist, UserRepository};
use crate::types::{CompanySize, SchemaName};

const TENANT_COLUMNS: &str = "id, name, schema_name, owner_id, contact_person, email, phone_number, \
     is_active, paid_until, on_trial, max_users, created_on";

const USER_COLUMNS: &str = "id, tenant_id, username, email, password_hash, first_name, last_name, \
     phone_number, company_name, company_size, is_active, is_superuser, date_joined";

#[derive(FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    schema_name: String,
    owner_id: Option<Uuid>,
    contact_person: String,
    email: Option<String>,
    phone_number: String,
    is_active: bool,
    paid_until: Option<NaiveDate>,
    on_trial: bool,
    max_users: i32,
    created_on: NaiveDate,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = DatabaseError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        let schema_name = SchemaName::parse(&row.schema_name)
            .map_err(|e| DatabaseError::CorruptRow(format!("tenant {}: {}", row.id, e)))?;
        Ok(Tenant {
            id: row.id,
            name: row.name,
            schema_name,
            owner_id: row.owner_id,
            contact_person: row.contact_person,
            email: row.email,
            phone_number: row.phone_number,
            is_active: row.is_active,
            paid_until: row.paid_until,
            on_trial: row.on_trial,
            max_users: row.max_users,
            created_on: row.created_on,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    username: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone_number: Option<String>,
    company_name: Option<String>,
    company_size: Option<String>,
    is_active: bool,
    is_superuser: bool,
    date_joined: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            tenant_id: row.tenant_id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
            company_name: row.company_name,
            company_size: row.company_size.as_deref().and_then(CompanySize::parse),
            is_active: row.is_active,
            is_superuser: row.is_superuser,
            date_joined: row.date_joined,
        }
    }
}

/// Map unique violations onto `DatabaseError::Conflict`.
fn map_unique(err: sqlx::Error) -> DatabaseError {
    let violation = err.as_database_error().and_then(|d| {
        if d.code().as_deref() == Some("23505") {
            Some(d.constraint().unwrap_or("unique constraint").to_string())
        } else {
            None
        }
    });
    match violation {
        Some(constraint) => DatabaseError::Conflict(constraint),
        None => DatabaseError::Sqlx(err),
    }
}

/// Postgres-backed repositories. Platform rows live in `public`.
#[derive(Clone)]
pub struct PgStore {
    db: DatabaseManager,
}

impl PgStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    async fn insert_user<'e, E>(executor: E, user: &User) -> Result<(), DatabaseError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let sql = format!(
            "INSERT INTO public.users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        );
        sqlx::query(&sql)
            .bind(user.id)
            .bind(user.tenant_id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone_number)
            .bind(&user.company_name)
            .bind(user.company_size.map(|s| s.as_str()))
            .bind(user.is_active)
            .bind(user.is_superuser)
            .bind(user.date_joined)
            .execute(executor)
            .await
            .map_err(map_unique)?;
        Ok(())
    }

    async fn fetch_tenant(&self, clause: &str, bind: &str) -> Result<Option<Tenant>, DatabaseError> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM public.tenants WHERE {clause}");
        let row = sqlx::query_as::<_, TenantRow>(&sql)
            .bind(bind)
            .fetch_optional(self.db.pool())
            .await?;
        row.map(Tenant::try_from).transpose()
    }
}

#[async_trait]
impl TenantRepository for PgStore {
    async fn provision(&self, tenant: Tenant, domain: Domain, owner: User) -> Result<(Tenant, User), DatabaseError> {
        let mut tx = self.db.pool().begin().await?;

        DatabaseManager::create_schema(&mut tx, &tenant.schema_name).await?;

        let sql = format!(
            "INSERT INTO public.tenants ({TENANT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&sql)
            .bind(tenant.id)
            .bind(&tenant.name)
            .bind(tenant.schema_name.as_str())
            .bind(tenant.owner_id)
            .bind(&tenant.contact_person)
            .bind(&tenant.email)
            .bind(&tenant.phone_number)
            .bind(tenant.is_active)
            .bind(tenant.paid_until)
            .bind(tenant.on_trial)
            .bind(tenant.max_users)
            .bind(tenant.created_on)
            .execute(&mut *tx)
            .await
            .map_err(map_unique)?;

        sqlx::query("INSERT INTO public.domains (domain, tenant_id, is_primary) VALUES ($1, $2, $3)")
            .bind(&domain.domain)
            .bind(domain.tenant_id)
            .bind(domain.is_primary)
            .execute(&mut *tx)
            .await
            .map_err(map_unique)?;

        Self::insert_user(&mut *tx, &owner).await?;

        tx.commit().await?;
        Ok((tenant, owner))
    }

    async fn tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, DatabaseError> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM public.tenants WHERE id = $1");
        let row = sqlx::query_as::<_, TenantRow>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.map(Tenant::try_from).transpose()
    }

    async fn tenant_by_domain(&self, host: &str) -> Result<Option<Tenant>, DatabaseError> {
        self.fetch_tenant(
            "id = (SELECT tenant_id FROM public.domains WHERE domain = $1)",
            host,
        )
        .await
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, DatabaseError> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM public.tenants ORDER BY created_on DESC, name");
        let rows = sqlx::query_as::<_, TenantRow>(&sql)
            .fetch_all(self.db.pool())
            .await?;
        rows.into_iter().map(Tenant::try_from).collect()
    }

    async fn update_tenant(&self, tenant: &Tenant) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE public.tenants SET contact_person = $2, email = $3, phone_number = $4, \
             is_active = $5, paid_until = $6, on_trial = $7, max_users = $8 WHERE id = $1",
        )
        .bind(tenant.id)
        .bind(&tenant.contact_person)
        .bind(&tenant.email)
        .bind(&tenant.phone_number)
        .bind(tenant.is_active)
        .bind(tenant.paid_until)
        .bind(tenant.on_trial)
        .bind(tenant.max_users)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("tenant {}", tenant.id)));
        }
        Ok(())
    }

    async fn schema_ready(&self, schema: &SchemaName) -> Result<bool, DatabaseError> {
        // current_schema() skips search_path entries that do not exist
        Ok(self.db.bound_schema(schema).await? == schema.as_str())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.db.health_check().await
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: User) -> Result<User, DatabaseError> {
        Self::insert_user(self.db.pool(), &user).await?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM public.users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(User::from))
    }

    async fn user_by_login(&self, login: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM public.users \
             WHERE username = $1 OR lower(email) = lower($1) \
             ORDER BY (username = $1) DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(login)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(User::from))
    }

    async fn create_user_within(&self, user: User, max_users: i32) -> Result<User, DatabaseError> {
        let tenant_id = user
            .tenant_id
            .ok_or_else(|| DatabaseError::NotFound("tenant for user".to_string()))?;

        let mut tx = self.db.pool().begin().await?;

        // Row lock serializes concurrent registrations into the same tenant
        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM public.tenants WHERE id = $1 FOR UPDATE")
            .bind(tenant_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(DatabaseError::NotFound(format!("tenant {}", tenant_id)));
        }

        let seats: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM public.users WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&mut *tx)
            .await?;
        if seats >= i64::from(max_users) {
            return Err(DatabaseError::UserLimitReached(max_users));
        }

        Self::insert_user(&mut *tx, &user).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn set_tenant(&self, user_id: Uuid, tenant_id: Option<Uuid>) -> Result<User, DatabaseError> {
        let sql = format!("UPDATE public.users SET tenant_id = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(tenant_id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                let fk = e.as_database_error().and_then(|d| d.code()).as_deref() == Some("23503");
                if fk {
                    DatabaseError::NotFound(format!("tenant {}", tenant_id.unwrap_or_default()))
                } else {
                    DatabaseError::Sqlx(e)
                }
            })?;
        row.map(User::from)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user_id)))
    }
}

#[async_trait]
impl TokenBlacklist for PgStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM public.token_blacklist WHERE expires_at < now()")
            .execute(self.db.pool())
            .await?;
        sqlx::query(
            "INSERT INTO public.token_blacklist (jti, expires_at) VALUES ($1, $2) \
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, DatabaseError> {
        let revoked: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM public.token_blacklist WHERE jti = $1)")
            .bind(jti)
            .fetch_one(self.db.pool())
            .await?;
        Ok(revoked)
    }
}
