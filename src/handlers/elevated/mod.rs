// handlers/elevated/mod.rs - Elevated handlers (platform superuser required)
//
// Reached only with a token that carries no tenant claim, held by a
// superuser, on the platform host.
pub mod root;
