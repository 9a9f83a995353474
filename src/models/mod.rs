pub mod permissions;
pub mod profile;
pub mod user;
