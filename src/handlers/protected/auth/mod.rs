// handlers/protected/auth/mod.rs - Authenticated account endpoints

pub mod users; // POST /api/auth/users
pub mod whoami; // GET /api/auth/whoami

pub use users::users_post;
pub use whoami::whoami_get;
