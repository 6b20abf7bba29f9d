use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::{check_password_policy, hash_password};
use crate::auth::AuthError;
use crate::database::manager::DatabaseError;
use crate::database::models::{Domain, NewTenant, NewUser, Tenant, TenantUpdate, User};
use crate::database::repository::{TenantRepository, UserRepository};
use crate::types::{CompanySize, SchemaName};

const MAX_USERNAME_LEN: usize = 150;
const MAX_PHONE_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Validation failed: {0:?}")]
    Validation(HashMap<String, String>),
    #[error("Tenant already exists: {0}")]
    AlreadyExists(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Signup is disabled")]
    SignupDisabled,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Tenant user limit of {0} reached")]
    UserLimitReached(i32),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for TenantError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(what) => TenantError::AlreadyExists(what),
            DatabaseError::NotFound(what) => TenantError::NotFound(what),
            DatabaseError::UserLimitReached(limit) => TenantError::UserLimitReached(limit),
            other => TenantError::Database(other),
        }
    }
}

/// Company signup: creates the tenant, its schema, its domain and the owner.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub company_name: String,
    pub company_size: String,
    pub phone_number: String,
    #[serde(default)]
    pub schema_name: Option<String>,
}

/// A user added to an existing tenant by its owner.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Collects per-field messages before failing once.
#[derive(Default)]
struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
    }

    fn finish(self) -> Result<(), TenantError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(TenantError::Validation(self.0))
        }
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    };
    if !valid {
        errors.add("email", "Enter a valid email address");
    }
}

fn check_username(errors: &mut FieldErrors, username: &str) {
    if username.is_empty() {
        errors.add("username", "This field is required");
    } else if username.len() > MAX_USERNAME_LEN
        || !username.chars().all(|c| c.is_ascii_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add("username", "Letters, digits and @/./+/-/_ only, at most 150 characters");
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    if let Err(e) = check_password_policy(password) {
        errors.add("password", e.to_string());
    }
}

pub struct TenantService {
    tenants: Arc<dyn TenantRepository>,
    users: Arc<dyn UserRepository>,
    base_domain: String,
}

impl TenantService {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        users: Arc<dyn UserRepository>,
        base_domain: impl Into<String>,
    ) -> Self {
        Self {
            tenants,
            users,
            base_domain: base_domain.into(),
        }
    }

    /// Primary host a tenant is served on.
    pub fn domain_for(&self, schema: &SchemaName) -> String {
        format!("{}.{}", schema.host_label(), self.base_domain)
    }

    /// Create a tenant with its schema, primary domain and owner in one unit.
    pub async fn signup(&self, request: SignupRequest) -> Result<(Tenant, User), TenantError> {
        let mut errors = FieldErrors::default();
        errors.require("first_name", &request.first_name);
        errors.require("last_name", &request.last_name);
        errors.require("company_name", &request.company_name);
        errors.require("phone_number", &request.phone_number);
        if request.phone_number.len() > MAX_PHONE_LEN {
            errors.add("phone_number", "Phone number is too long");
        }
        check_username(&mut errors, &request.username);
        check_email(&mut errors, &request.email);
        check_password(&mut errors, &request.password);

        let company_size = CompanySize::parse(&request.company_size);
        if company_size.is_none() {
            errors.add("company_size", "Choose one of 1-10, 11-50, 51-200, 201-500, 500+");
        }

        let schema = match &request.schema_name {
            Some(raw) => SchemaName::parse(raw.trim()),
            None => SchemaName::slugify(&request.company_name),
        };
        let schema = match schema {
            Ok(schema) => Some(schema),
            Err(e) => {
                errors.add("schema_name", e.to_string());
                None
            }
        };
        errors.finish()?;
        let schema = schema.ok_or_else(|| TenantError::Validation(HashMap::new()))?;

        let password_hash = hash_password(&request.password)?;
        let contact_person = format!("{} {}", request.first_name.trim(), request.last_name.trim());

        let mut tenant = NewTenant {
            name: request.company_name.trim().to_string(),
            schema_name: schema.clone(),
            owner_id: None,
            contact_person,
            email: Some(request.email.trim().to_ascii_lowercase()),
            phone_number: request.phone_number.trim().to_string(),
        }
        .into_tenant();

        let owner = NewUser {
            tenant_id: Some(tenant.id),
            username: request.username,
            email: request.email.trim().to_string(),
            password_hash,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            phone_number: Some(request.phone_number.trim().to_string()),
            company_name: Some(request.company_name.trim().to_string()),
            company_size,
            is_superuser: false,
        }
        .into_user();
        tenant.owner_id = Some(owner.id);

        let domain = Domain {
            domain: self.domain_for(&schema),
            tenant_id: tenant.id,
            is_primary: true,
        };
        let host = domain.domain.clone();

        let (tenant, owner) = self.tenants.provision(tenant, domain, owner).await?;
        info!("Created tenant {} (schema {}, host {})", tenant.name, tenant.schema_name, host);
        Ok((tenant, owner))
    }

    /// Add a user to `tenant` on behalf of `actor` (its owner or a superuser).
    pub async fn register_user(
        &self,
        tenant: &Tenant,
        actor: &User,
        request: RegisterUserRequest,
    ) -> Result<User, TenantError> {
        if !actor.is_superuser && tenant.owner_id != Some(actor.id) {
            return Err(TenantError::Forbidden(
                "Only the tenant owner can register users".to_string(),
            ));
        }

        let mut errors = FieldErrors::default();
        check_username(&mut errors, &request.username);
        check_email(&mut errors, &request.email);
        check_password(&mut errors, &request.password);
        errors.finish()?;

        let user = NewUser {
            tenant_id: Some(tenant.id),
            username: request.username,
            email: request.email.trim().to_string(),
            password_hash: hash_password(&request.password)?,
            first_name: request.first_name,
            last_name: request.last_name,
            phone_number: request.phone_number,
            company_name: Some(tenant.name.clone()),
            company_size: None,
            is_superuser: false,
        }
        .into_user();

        let user = self.users.create_user_within(user, tenant.max_users).await?;
        info!("Registered user {} in tenant {}", user.username, tenant.schema_name);
        Ok(user)
    }

    /// Platform superuser outside any tenant.
    pub async fn create_superuser(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, TenantError> {
        let mut errors = FieldErrors::default();
        check_username(&mut errors, username);
        check_email(&mut errors, email);
        check_password(&mut errors, password);
        errors.finish()?;

        let user = NewUser {
            tenant_id: None,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
            company_name: None,
            company_size: None,
            is_superuser: true,
        }
        .into_user();

        let user = self.users.create_user(user).await?;
        info!("Created superuser {}", user.username);
        Ok(user)
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, TenantError> {
        Ok(self.tenants.list_tenants().await?)
    }

    pub async fn get_tenant(&self, id: Uuid) -> Result<Tenant, TenantError> {
        self.tenants
            .tenant_by_id(id)
            .await?
            .ok_or_else(|| TenantError::NotFound(format!("tenant {}", id)))
    }

    pub async fn update_tenant(&self, id: Uuid, update: TenantUpdate) -> Result<Tenant, TenantError> {
        let mut errors = FieldErrors::default();
        if matches!(update.max_users, Some(n) if n < 1) {
            errors.add("max_users", "Must be at least 1");
        }
        if let Some(email) = &update.email {
            check_email(&mut errors, email);
        }
        if let Some(phone) = &update.phone_number {
            errors.require("phone_number", phone);
        }
        errors.finish()?;

        let mut tenant = self.get_tenant(id).await?;
        update.apply(&mut tenant);
        self.tenants.update_tenant(&tenant).await?;
        info!("Updated tenant {}", tenant.schema_name);
        Ok(tenant)
    }

    /// Move a user between tenants. Tokens already issued keep their claim.
    pub async fn reassign_user(&self, user_id: Uuid, tenant_id: Option<Uuid>) -> Result<User, TenantError> {
        let user = self.users.set_tenant(user_id, tenant_id).await?;
        info!(
            "Reassigned user {} to tenant {}",
            user.username,
            tenant_id.map(|id| id.to_string()).unwrap_or_else(|| "none".to_string())
        );
        Ok(user)
    }
}
