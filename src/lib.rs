// library system

pub mod assistant;
pub mod catalog;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod sql;
pub mod time;
pub mod types;
pub mod views;

pub use routes::{app, AppState};
