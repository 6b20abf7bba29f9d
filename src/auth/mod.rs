pub mod guard;
pub mod password;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::types::SchemaName;

pub use guard::{check_tenant, TenantScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by both halves of a token pair.
///
/// `tenant_schema` is copied from the user's tenant at mint time and never
/// rewritten; it is absent for platform superusers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_schema: Option<SchemaName>,
    pub jti: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("expected {expected:?} token")]
    WrongTokenType { expected: TokenType },

    #[error("token has been revoked")]
    TokenRevoked,

    #[error("token minted for schema '{token_schema}' presented on schema '{bound_schema}'")]
    TenantMismatch {
        token_schema: SchemaName,
        bound_schema: SchemaName,
    },

    #[error("user {0} not found or inactive")]
    UnknownUser(Uuid),

    #[error("user {user} does not belong to tenant schema '{schema}'")]
    NotAMember { user: Uuid, schema: SchemaName },

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("token encoding failed: {0}")]
    Encoding(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// Whether the caller should see a generic 401 for this error.
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(
            self,
            AuthError::MissingSecret | AuthError::Encoding(_) | AuthError::Hashing(_)
        )
    }
}

/// Signs and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        Self::new(
            security.jwt_secret.as_bytes(),
            security.jwt_issuer.clone(),
            Duration::minutes(security.access_token_minutes),
            Duration::days(security.refresh_token_days),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Mint an access/refresh pair for `user`, stamped with `tenant_schema`.
    pub fn issue_pair(&self, user: &User, tenant_schema: Option<&SchemaName>) -> Result<TokenPair, AuthError> {
        let access = self.claims_for(user.id, &user.username, tenant_schema.cloned(), TokenType::Access);
        let refresh = self.claims_for(user.id, &user.username, tenant_schema.cloned(), TokenType::Refresh);
        Ok(TokenPair {
            access: self.encode(&access)?,
            refresh: self.encode(&refresh)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Mint a fresh access token from a verified refresh token, keeping its
    /// subject and tenant claim.
    pub fn reissue_access(&self, refresh: &Claims) -> Result<String, AuthError> {
        if refresh.token_type != TokenType::Refresh {
            return Err(AuthError::WrongTokenType { expected: TokenType::Refresh });
        }
        let claims = self.claims_for(refresh.sub, &refresh.username, refresh.tenant_schema.clone(), TokenType::Access);
        self.encode(&claims)
    }

    fn claims_for(&self, sub: Uuid, username: &str, tenant_schema: Option<SchemaName>, token_type: TokenType) -> Claims {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        Claims {
            sub,
            username: username.to_string(),
            token_type,
            tenant_schema,
            jti: Uuid::new_v4().simple().to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Verify signature, issuer and expiry, then check the token type.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })?;

        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType { expected });
        }
        Ok(claims)
    }
}
