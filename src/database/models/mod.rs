pub mod tenant;
pub mod user;

pub use tenant::{Domain, NewTenant, Tenant, TenantUpdate};
pub use user::{NewUser, User, UserProfile};
