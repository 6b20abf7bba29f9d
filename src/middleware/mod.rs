pub mod auth;
pub mod response;
pub mod root_access;
pub mod validate_tenant;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use root_access::root_access_middleware;
pub use validate_tenant::{validate_tenant_middleware, TenantContext};
