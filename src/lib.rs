pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod discussions;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod types;
pub mod views;

pub use app::{app, AppState};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
