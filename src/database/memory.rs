use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Domain, Tenant, User};
use crate::database::repository::{TenantRepository, TokenBlacklist, UserRepository};
use crate::types::SchemaName;

#[derive(Default)]
struct State {
    tenants: HashMap<Uuid, Tenant>,
    domains: HashMap<String, Domain>,
    schemas: HashSet<SchemaName>,
    users: HashMap<Uuid, User>,
    revoked: HashMap<String, DateTime<Utc>>,
}

impl State {
    fn username_taken(&self, username: &str) -> bool {
        self.users.values().any(|u| u.username == username)
    }

    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email.eq_ignore_ascii_case(email))
    }

    fn check_user_unique(&self, user: &User) -> Result<(), DatabaseError> {
        if self.username_taken(&user.username) {
            return Err(DatabaseError::Conflict(format!("username '{}'", user.username)));
        }
        if self.email_taken(&user.email) {
            return Err(DatabaseError::Conflict(format!("email '{}'", user.email)));
        }
        Ok(())
    }
}

/// Process-local backend used for development and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRepository for MemoryStore {
    async fn provision(&self, tenant: Tenant, domain: Domain, owner: User) -> Result<(Tenant, User), DatabaseError> {
        let mut state = self.state.write().await;

        if state.schemas.contains(&tenant.schema_name) {
            return Err(DatabaseError::Conflict(format!("schema '{}'", tenant.schema_name)));
        }
        if state.domains.contains_key(&domain.domain) {
            return Err(DatabaseError::Conflict(format!("domain '{}'", domain.domain)));
        }
        state.check_user_unique(&owner)?;

        state.schemas.insert(tenant.schema_name.clone());
        state.domains.insert(domain.domain.clone(), domain);
        state.tenants.insert(tenant.id, tenant.clone());
        state.users.insert(owner.id, owner.clone());
        Ok((tenant, owner))
    }

    async fn tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, DatabaseError> {
        Ok(self.state.read().await.tenants.get(&id).cloned())
    }

    async fn tenant_by_domain(&self, host: &str) -> Result<Option<Tenant>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .domains
            .get(host)
            .and_then(|d| state.tenants.get(&d.tenant_id))
            .cloned())
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, DatabaseError> {
        let state = self.state.read().await;
        let mut tenants: Vec<Tenant> = state.tenants.values().cloned().collect();
        tenants.sort_by(|a, b| b.created_on.cmp(&a.created_on).then_with(|| a.name.cmp(&b.name)));
        Ok(tenants)
    }

    async fn update_tenant(&self, tenant: &Tenant) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        match state.tenants.get_mut(&tenant.id) {
            Some(existing) => {
                // schema_name is immutable once provisioned
                let schema = existing.schema_name.clone();
                *existing = tenant.clone();
                existing.schema_name = schema;
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("tenant {}", tenant.id))),
        }
    }

    async fn schema_ready(&self, schema: &SchemaName) -> Result<bool, DatabaseError> {
        Ok(self.state.read().await.schemas.contains(schema))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: User) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(tenant_id) = user.tenant_id {
            if !state.tenants.contains_key(&tenant_id) {
                return Err(DatabaseError::NotFound(format!("tenant {}", tenant_id)));
            }
        }
        state.check_user_unique(&user)?;
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn user_by_login(&self, login: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        let by_username = state.users.values().find(|u| u.username == login);
        Ok(by_username
            .or_else(|| state.users.values().find(|u| u.email.eq_ignore_ascii_case(login)))
            .cloned())
    }

    async fn create_user_within(&self, user: User, max_users: i32) -> Result<User, DatabaseError> {
        let tenant_id = user
            .tenant_id
            .ok_or_else(|| DatabaseError::NotFound("tenant for user".to_string()))?;

        let mut state = self.state.write().await;
        if !state.tenants.contains_key(&tenant_id) {
            return Err(DatabaseError::NotFound(format!("tenant {}", tenant_id)));
        }
        let seats = state.users.values().filter(|u| u.tenant_id == Some(tenant_id)).count();
        if seats >= usize::try_from(max_users).unwrap_or(0) {
            return Err(DatabaseError::UserLimitReached(max_users));
        }
        state.check_user_unique(&user)?;
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_tenant(&self, user_id: Uuid, tenant_id: Option<Uuid>) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(tid) = tenant_id {
            if !state.tenants.contains_key(&tid) {
                return Err(DatabaseError::NotFound(format!("tenant {}", tid)));
            }
        }
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user_id)))?;
        user.tenant_id = tenant_id;
        Ok(user.clone())
    }
}

#[async_trait]
impl TokenBlacklist for MemoryStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let now = Utc::now();
        let mut state = self.state.write().await;
        state.revoked.retain(|_, exp| *exp > now);
        state.revoked.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, DatabaseError> {
        Ok(self.state.read().await.revoked.contains_key(jti))
    }
}
