// handlers/elevated/root/mod.rs - Cross-tenant administration

pub mod tenant; // /api/root/tenants[/:id]
pub mod user; // /api/root/users/:id/tenant

pub use tenant::{tenant_list, tenant_show, tenant_update};
pub use user::user_tenant_update;
