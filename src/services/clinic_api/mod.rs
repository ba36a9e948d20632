pub mod client;
pub mod errors;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod service;

pub use client::ClinicApiClient;
pub use errors::ClinicApiError;
pub use models::AuthToken;
pub use service::{AppointmentGateway, AuthGateway};
