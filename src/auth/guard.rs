use serde::Serialize;

use super::{AuthError, Claims};
use crate::database::models::User;
use crate::middleware::TenantContext;
use crate::types::SchemaName;

/// What a verified token may act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "schema", rename_all = "lowercase")]
pub enum TenantScope {
    /// Token carries a tenant claim equal to the bound schema.
    Tenant(SchemaName),
    /// Token carries no tenant claim (platform superuser).
    Platform,
}

impl TenantScope {
    pub fn is_platform(&self) -> bool {
        matches!(self, TenantScope::Platform)
    }
}

/// Compare a verified token's tenant claim with the schema the request is
/// bound to. Reads nothing but its arguments.
pub fn check_tenant(claims: &Claims, context: &TenantContext) -> Result<TenantScope, AuthError> {
    match &claims.tenant_schema {
        None => Ok(TenantScope::Platform),
        Some(schema) if *schema == context.schema => Ok(TenantScope::Tenant(schema.clone())),
        Some(schema) => Err(AuthError::TenantMismatch {
            token_schema: schema.clone(),
            bound_schema: context.schema.clone(),
        }),
    }
}

/// User-lookup half of authentication: the token subject must be an active
/// account, and a non-superuser must belong to the bound tenant.
pub fn check_member(user: Option<User>, claims: &Claims, context: &TenantContext) -> Result<User, AuthError> {
    let user = match user {
        Some(user) if user.is_active && user.id == claims.sub => user,
        _ => return Err(AuthError::UnknownUser(claims.sub)),
    };

    if let Some(tenant) = &context.tenant {
        if !user.belongs_to(tenant.id) {
            return Err(AuthError::NotAMember {
                user: user.id,
                schema: context.schema.clone(),
            });
        }
    }
    Ok(user)
}
