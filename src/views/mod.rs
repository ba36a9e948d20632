//! Controllers behind each screen of the admin front end. They own the
//! interaction rules (what is enabled, what gets sent, what the user is told)
//! and leave presentation to the caller.

pub mod dashboard;
pub mod login;
pub mod register;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::appointment::FormError;
use crate::policy::Action;
use crate::services::clinic_api::ClinicApiError;
use crate::session::SessionError;

pub use dashboard::{Dashboard, DashboardEntry, RefreshOutcome, StatusChange};
pub use login::{login, LoginForm, LoginOutcome};
pub use register::{register, RegisterForm, RegisterOutcome};

pub const LOAD_FAILED: &str = "Failed to load appointments.";
pub const LOAD_ONE_FAILED: &str = "Failed to load appointment.";
pub const CREATE_FAILED: &str = "Failed to create appointment.";
pub const STATUS_CHANGE_FAILED: &str = "Failed to change status.";
pub const DELETE_FAILED: &str = "Failed to delete appointment.";
pub const LOGIN_FAILED: &str = "Login failed. Check your credentials.";
pub const REGISTRATION_FAILED: &str = "Registration failed. Try again.";
pub const REGISTRATION_SUCCEEDED: &str = "Registration successful! Please log in.";

/// Navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("You need to log in first.")]
    LoginRequired,
    #[error("This view is no longer active.")]
    Inactive,
    #[error("Your role is not allowed to {0}.")]
    Forbidden(Action),
    #[error("{0}")]
    InvalidForm(#[from] FormError),
    #[error("Appointment {0} is not in the current list.")]
    UnknownAppointment(Uuid),
    #[error("{message}")]
    Gateway { message: String },
    #[error("{}", LOGIN_FAILED)]
    LoginFailed,
    #[error("{}", REGISTRATION_FAILED)]
    RegistrationFailed,
    #[error("Could not save the session: {0}")]
    Session(#[from] SessionError),
}

impl ViewError {
    /// Where the user should be sent, if this error means leaving the view.
    pub fn redirect(&self) -> Option<Route> {
        match self {
            ViewError::LoginRequired | ViewError::Inactive => Some(Route::Login),
            _ => None,
        }
    }
}

/// Surface a gateway failure as a user-visible message.
pub(crate) fn gateway_error(error: ClinicApiError, fallback: &str) -> ViewError {
    warn!(%error, "clinic API call failed");
    ViewError::Gateway {
        message: error.user_message(fallback),
    }
}

/// Counter shared between a view and anyone who can navigate away from it.
/// Responses that arrive after the counter moved belong to a view that is
/// gone and are dropped.
#[derive(Debug, Clone, Default)]
pub struct ViewGuard {
    generation: Arc<AtomicU64>,
}

impl ViewGuard {
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Mark the current view as left.
    pub fn leave(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}
