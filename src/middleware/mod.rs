pub mod auth;

pub use auth::acting_user_middleware;
