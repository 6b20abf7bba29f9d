use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::password::{verify_dummy, verify_password};
use crate::auth::{check_tenant, guard::check_member, AuthError, Claims, TokenCodec, TokenPair, TokenType};
use crate::database::manager::DatabaseError;
use crate::database::models::User;
use crate::database::repository::{TenantRepository, TokenBlacklist, UserRepository};
use crate::middleware::{AuthUser, TenantContext};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Issues, refreshes and verifies session tokens.
#[derive(Clone)]
pub struct AuthService {
    codec: Arc<TokenCodec>,
    tenants: Arc<dyn TenantRepository>,
    users: Arc<dyn UserRepository>,
    blacklist: Arc<dyn TokenBlacklist>,
}

impl AuthService {
    pub fn new(
        codec: Arc<TokenCodec>,
        tenants: Arc<dyn TenantRepository>,
        users: Arc<dyn UserRepository>,
        blacklist: Arc<dyn TokenBlacklist>,
    ) -> Self {
        Self {
            codec,
            tenants,
            users,
            blacklist,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Verify credentials on the host bound to `context` and mint a pair
    /// stamped with the user's current tenant schema.
    ///
    /// Unknown login, wrong password, inactive account and a tenant user on
    /// a foreign tenant host all fail as `InvalidCredentials`.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        context: &TenantContext,
    ) -> Result<(TokenPair, User), SessionError> {
        let user = match self.users.user_by_login(login.trim()).await? {
            Some(user) => user,
            None => {
                verify_dummy(password);
                warn!("Login failed: unknown user");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active {
            warn!(user = %user.id, "Login failed: inactive user");
            return Err(AuthError::InvalidCredentials.into());
        }

        let tenant = match user.tenant_id {
            Some(tenant_id) => match self.tenants.tenant_by_id(tenant_id).await? {
                Some(tenant) if tenant.is_active => Some(tenant),
                _ => {
                    warn!(user = %user.id, "Login failed: tenant missing or inactive");
                    return Err(AuthError::InvalidCredentials.into());
                }
            },
            None => None,
        };

        if let Some(bound) = &context.tenant {
            if !user.belongs_to(bound.id) {
                warn!(user = %user.id, host_schema = %context.schema, "Login failed: user is not a member of host tenant");
                return Err(AuthError::InvalidCredentials.into());
            }
        }

        let tenant_schema = tenant.as_ref().map(|t| &t.schema_name);
        let pair = self.codec.issue_pair(&user, tenant_schema)?;
        info!(user = %user.id, schema = ?tenant_schema.map(|s| s.as_str()), "Issued token pair");
        Ok((pair, user))
    }

    /// Full request authentication: codec, tenant guard, then user lookup.
    pub async fn authenticate(&self, token: &str, context: &TenantContext) -> Result<AuthUser, SessionError> {
        let claims = self.codec.decode(token, TokenType::Access)?;
        let scope = check_tenant(&claims, context)?;
        let user = self.users.user_by_id(claims.sub).await?;
        let user = check_member(user, &claims, context)?;
        debug!(user = %user.id, schema = %context.schema, "Authenticated request");
        Ok(AuthUser { user, scope, claims })
    }

    /// Mint a new access token from a refresh token presented on `context`.
    /// The new token keeps the refresh token's tenant claim.
    pub async fn refresh(&self, token: &str, context: &TenantContext) -> Result<String, SessionError> {
        let claims = self.codec.decode(token, TokenType::Refresh)?;
        if self.blacklist.is_revoked(&claims.jti).await? {
            return Err(AuthError::TokenRevoked.into());
        }
        check_tenant(&claims, context)?;
        let user = self.users.user_by_id(claims.sub).await?;
        check_member(user, &claims, context)?;
        Ok(self.codec.reissue_access(&claims)?)
    }

    /// Revoke a refresh token until it would have expired anyway.
    pub async fn logout(&self, token: &str) -> Result<Claims, SessionError> {
        let claims = self.codec.decode(token, TokenType::Refresh)?;
        self.blacklist.revoke(&claims.jti, claims.expires_at()).await?;
        info!(user = %claims.sub, "Refresh token revoked");
        Ok(claims)
    }
}
