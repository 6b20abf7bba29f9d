// handlers/elevated/root/tenant/mod.rs - Tenant management handlers

pub mod list; // GET /api/root/tenants
pub mod show; // GET /api/root/tenants/:id
pub mod update; // PATCH /api/root/tenants/:id

pub use list::tenant_list;
pub use show::tenant_show;
pub use update::tenant_update;
