use tracing::{info, warn};

use super::{Route, ViewError, REGISTRATION_SUCCEEDED};
use crate::models::{appointment::FormError, Role};
use crate::services::clinic_api::AuthGateway;

#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            role: Role::Receptionist,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOutcome {
    pub message: &'static str,
    pub next: Route,
}

/// Create an account. The token the API answers with is not kept; the user
/// logs in afterwards.
pub async fn register(
    auth: &dyn AuthGateway,
    form: RegisterForm,
) -> Result<RegisterOutcome, ViewError> {
    if form.username.trim().is_empty() {
        return Err(FormError::Blank("username").into());
    }
    if form.password.is_empty() {
        return Err(FormError::Blank("password").into());
    }

    if let Err(error) = auth
        .register(&form.username, &form.password, form.role)
        .await
    {
        warn!(%error, username = %form.username, "registration rejected");
        return Err(ViewError::RegistrationFailed);
    }

    info!(username = %form.username, role = %form.role, "account registered");
    Ok(RegisterOutcome {
        message: REGISTRATION_SUCCEEDED,
        next: Route::Login,
    })
}
