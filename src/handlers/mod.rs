// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) -> Protected (JWT + tenant guard) -> Elevated (platform superuser)
pub mod elevated; // /api/root/*
pub mod protected; // /api/auth/whoami, /api/auth/users
pub mod public; // /api/auth/{signup,login,refresh,logout}
