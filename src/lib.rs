pub mod auth;
pub mod config;
pub mod models;
pub mod policy;
pub mod services;
pub mod session;
pub mod telemetry;
pub mod utils;
pub mod views;

pub use config::Config;
pub use session::SessionStore;
