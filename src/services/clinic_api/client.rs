// services/clinic_api/client.rs

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::{
    errors::ClinicApiError,
    models::{AuthToken, ErrorBody, LoginRequest, RegisterRequest},
    service::{AppointmentGateway, AuthGateway},
};
use crate::models::{Appointment, AppointmentRequest, Role};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const APPOINTMENTS_PATH: &str = "/api/appointments";

#[derive(Clone, Debug)]
pub struct ClinicApiClient {
    pub client: Client,
    base_url: String,
}

impl ClinicApiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = build_url(&self.base_url, path);
        self.client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn authorized(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(token)
    }
}

fn build_url(base: &str, path: &str) -> String {
    let trimmed_base = base.trim_end_matches('/');
    let trimmed_path = path.trim_start_matches('/');
    format!("{}/{}", trimmed_base, trimmed_path)
}

fn appointment_path(id: Uuid) -> String {
    format!("{}/{}", APPOINTMENTS_PATH, id)
}

/// Turns a non-2xx response into [`ClinicApiError::Api`], otherwise hands the
/// response back untouched.
async fn ensure_success(response: Response) -> Result<Response, ClinicApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|err| err.message)
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty());
    debug!(%status, has_message = message.is_some(), "clinic API request rejected");

    Err(ClinicApiError::Api { status, message })
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClinicApiError> {
    let response = ensure_success(request.send().await?).await?;
    let body = response.text().await?;
    serde_json::from_str::<T>(&body).map_err(|err| ClinicApiError::InvalidResponse(err.to_string()))
}

/// For calls whose response body is not used.
async fn send_discarding_body(request: RequestBuilder) -> Result<(), ClinicApiError> {
    ensure_success(request.send().await?).await?;
    Ok(())
}

#[async_trait]
impl AuthGateway for ClinicApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ClinicApiError> {
        let request = self
            .request(Method::POST, LOGIN_PATH)
            .json(&LoginRequest { username, password });
        let token: AuthToken = send_json(request).await?;
        if token.token.trim().is_empty() {
            return Err(ClinicApiError::InvalidResponse(
                "login response did not include a token".into(),
            ));
        }
        Ok(token)
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), ClinicApiError> {
        let request = self.request(Method::POST, REGISTER_PATH).json(&RegisterRequest {
            username,
            password,
            role,
        });
        send_discarding_body(request).await
    }
}

#[async_trait]
impl AppointmentGateway for ClinicApiClient {
    async fn list(&self, token: &str) -> Result<Vec<Appointment>, ClinicApiError> {
        let request = self.authorized(Method::GET, APPOINTMENTS_PATH, token);
        send_json(request).await
    }

    async fn get(&self, token: &str, id: Uuid) -> Result<Appointment, ClinicApiError> {
        let request = self.authorized(Method::GET, &appointment_path(id), token);
        send_json(request).await
    }

    async fn create(
        &self,
        token: &str,
        request: &AppointmentRequest,
    ) -> Result<(), ClinicApiError> {
        let request = self
            .authorized(Method::POST, APPOINTMENTS_PATH, token)
            .json(request);
        send_discarding_body(request).await
    }

    async fn update(
        &self,
        token: &str,
        id: Uuid,
        request: &AppointmentRequest,
    ) -> Result<(), ClinicApiError> {
        let request = self
            .authorized(Method::PUT, &appointment_path(id), token)
            .json(request);
        send_discarding_body(request).await
    }

    async fn delete(&self, token: &str, id: Uuid) -> Result<(), ClinicApiError> {
        let request = self.authorized(Method::DELETE, &appointment_path(id), token);
        send_discarding_body(request).await
    }
}
