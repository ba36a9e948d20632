use tracing::{info, warn};

use super::{Route, ViewError};
use crate::auth::ResolvedRole;
use crate::models::appointment::FormError;
use crate::services::clinic_api::AuthGateway;
use crate::session::SessionStore;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub role: ResolvedRole,
    pub next: Route,
}

/// Authenticate and store the session. Nothing is stored when the API
/// rejects the credentials.
pub async fn login(
    auth: &dyn AuthGateway,
    session: &SessionStore,
    form: LoginForm,
) -> Result<LoginOutcome, ViewError> {
    if form.username.trim().is_empty() {
        return Err(FormError::Blank("username").into());
    }
    if form.password.is_empty() {
        return Err(FormError::Blank("password").into());
    }

    let token = match auth.login(&form.username, &form.password).await {
        Ok(token) => token,
        Err(error) => {
            warn!(%error, username = %form.username, "login rejected");
            return Err(ViewError::LoginFailed);
        }
    };

    let role = ResolvedRole::from_credential(&token.token);
    session.set_session(&token.token, &role.raw)?;
    info!(username = %form.username, role = %role.raw, "logged in");

    Ok(LoginOutcome {
        role,
        next: Route::Dashboard,
    })
}
