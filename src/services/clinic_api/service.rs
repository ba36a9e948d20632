// services/clinic_api/service.rs

use async_trait::async_trait;
use uuid::Uuid;

use super::{errors::ClinicApiError, models::AuthToken};
use crate::models::{Appointment, AppointmentRequest, Role};

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ClinicApiError>;
    async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), ClinicApiError>;
}

/// Appointment endpoints. Every call carries the bearer `token`.
#[async_trait]
pub trait AppointmentGateway: Send + Sync {
    /// All appointments, in no particular order.
    async fn list(&self, token: &str) -> Result<Vec<Appointment>, ClinicApiError>;
    async fn get(&self, token: &str, id: Uuid) -> Result<Appointment, ClinicApiError>;
    async fn create(&self, token: &str, request: &AppointmentRequest)
        -> Result<(), ClinicApiError>;
    /// Full replacement of the stored record.
    async fn update(
        &self,
        token: &str,
        id: Uuid,
        request: &AppointmentRequest,
    ) -> Result<(), ClinicApiError>;
    async fn delete(&self, token: &str, id: Uuid) -> Result<(), ClinicApiError>;
}
