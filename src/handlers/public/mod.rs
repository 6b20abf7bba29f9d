// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and tenant signup. Requests are still bound to a schema
// by host before reaching these handlers.
pub mod auth;
