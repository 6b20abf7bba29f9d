// handlers/public/auth/mod.rs - Token acquisition endpoints

pub mod login; // POST /api/auth/login
pub mod logout; // POST /api/auth/logout
pub mod refresh; // POST /api/auth/refresh
pub mod signup; // POST /api/auth/signup

pub use login::login_post;
pub use logout::logout_post;
pub use refresh::refresh_post;
pub use signup::signup_post;
