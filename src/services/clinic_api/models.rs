// services/clinic_api/models.rs
use serde::{Deserialize, Serialize};

use crate::models::Role;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AuthToken {
    #[serde(default)]
    pub token: String,
}

/// Error body produced by the API's exception handler. Validation failures
/// come back as a flat field map and therefore carry no `message`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
