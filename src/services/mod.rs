pub mod auth_service;
pub mod tenant_service;

pub use auth_service::{AuthService, SessionError};
pub use tenant_service::{RegisterUserRequest, SignupRequest, TenantError, TenantService};
