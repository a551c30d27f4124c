pub mod auth;

pub use auth::protect;
