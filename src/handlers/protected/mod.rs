// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here runs behind jwt_auth_middleware, so handlers receive an
// AuthUser whose token matched the schema the request is bound to.
pub mod auth;
