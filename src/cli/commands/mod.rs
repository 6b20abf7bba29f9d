pub mod superuser;
pub mod tenant;
pub mod token;
