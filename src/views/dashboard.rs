use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    gateway_error, Route, ViewError, ViewGuard, CREATE_FAILED, DELETE_FAILED, LOAD_FAILED,
    LOAD_ONE_FAILED, STATUS_CHANGE_FAILED,
};
use crate::auth::ResolvedRole;
use crate::models::{
    appointment::sort_by_schedule, Appointment, AppointmentRequest, AppointmentStatus,
    NewAppointment, Role,
};
use crate::policy::{self, Action, RowActions};
use crate::services::clinic_api::AppointmentGateway;
use crate::session::SessionStore;

pub enum DashboardEntry {
    /// No stored credential; nothing was requested.
    Redirect(Route),
    /// The view is up. `load_error` is set when the first fetch failed.
    Ready {
        dashboard: Dashboard,
        load_error: Option<ViewError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated { count: usize },
    /// The view was left while the request was in flight.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Advanced {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    /// The status has no successor; no request was sent.
    Unchanged(AppointmentStatus),
}

/// Appointment list screen: the cached list, the session's role, and the
/// actions that role may take.
pub struct Dashboard {
    gateway: Arc<dyn AppointmentGateway>,
    session: SessionStore,
    role: ResolvedRole,
    appointments: Vec<Appointment>,
    guard: ViewGuard,
    generation: u64,
    stale: Option<String>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("role", &self.role)
            .field("appointments", &self.appointments.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Enter the view: without a stored credential the user is sent to the
    /// login screen before any request is made.
    pub async fn enter(
        gateway: Arc<dyn AppointmentGateway>,
        session: SessionStore,
        guard: ViewGuard,
    ) -> DashboardEntry {
        let Some(credential) = session.credential() else {
            debug!("no stored credential, redirecting to login");
            return DashboardEntry::Redirect(Route::Login);
        };

        // The stored role hint is for display only; the credential decides.
        let role = ResolvedRole::from_credential(&credential);
        let mut dashboard = Dashboard {
            gateway,
            session,
            role,
            appointments: Vec::new(),
            generation: guard.current(),
            guard,
            stale: None,
        };

        let load_error = dashboard.refresh().await.err();
        DashboardEntry::Ready {
            dashboard,
            load_error,
        }
    }

    pub fn role(&self) -> &ResolvedRole {
        &self.role
    }

    fn parsed_role(&self) -> Option<Role> {
        self.role.role
    }

    /// Appointments sorted by date-time, earliest first.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn find(&self, id: Uuid) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn can_create(&self) -> bool {
        policy::can_create(self.parsed_role())
    }

    pub fn row_actions(&self, appointment: &Appointment) -> RowActions {
        RowActions::for_appointment(self.parsed_role(), appointment)
    }

    /// Rows in display order with their 1-based position and enabled actions.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &Appointment, RowActions)> + '_ {
        self.appointments
            .iter()
            .enumerate()
            .map(|(idx, appointment)| (idx + 1, appointment, self.row_actions(appointment)))
    }

    /// Set when a mutation went through but the list could not be reloaded
    /// afterwards.
    pub fn stale_notice(&self) -> Option<&str> {
        self.stale.as_deref()
    }

    pub fn guard(&self) -> ViewGuard {
        self.guard.clone()
    }

    fn credential(&self) -> Result<String, ViewError> {
        if !self.guard.is_current(self.generation) {
            return Err(ViewError::Inactive);
        }
        self.session.credential().ok_or(ViewError::LoginRequired)
    }

    /// Reload the full list. Failures leave the cached list untouched.
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, ViewError> {
        let token = self.credential()?;
        let mut appointments = self
            .gateway
            .list(&token)
            .await
            .map_err(|error| gateway_error(error, LOAD_FAILED))?;

        if !self.guard.is_current(self.generation) {
            debug!("view left during list request, dropping response");
            return Ok(RefreshOutcome::Discarded);
        }

        sort_by_schedule(&mut appointments);
        let count = appointments.len();
        self.appointments = appointments;
        self.stale = None;
        debug!(count, "appointment list refreshed");
        Ok(RefreshOutcome::Updated { count })
    }

    /// Fetch a single appointment straight from the API.
    pub async fn fetch(&self, id: Uuid) -> Result<Appointment, ViewError> {
        let token = self.credential()?;
        self.gateway
            .get(&token, id)
            .await
            .map_err(|error| gateway_error(error, LOAD_ONE_FAILED))
    }

    pub async fn create(&mut self, form: NewAppointment) -> Result<(), ViewError> {
        if !self.can_create() {
            return Err(ViewError::Forbidden(Action::Create));
        }
        let request = form.into_request()?;
        let token = self.credential()?;

        self.gateway
            .create(&token, &request)
            .await
            .map_err(|error| gateway_error(error, CREATE_FAILED))?;
        info!(date_time = %request.date_time, "appointment created");

        self.reload_after_mutation().await;
        Ok(())
    }

    /// Move the appointment one step along its progression, sending the full
    /// record with the new status.
    pub async fn change_status(&mut self, id: Uuid) -> Result<StatusChange, ViewError> {
        let appointment = self
            .find(id)
            .cloned()
            .ok_or(ViewError::UnknownAppointment(id))?;

        if !policy::can_change_status(self.parsed_role(), appointment.status) {
            return Err(ViewError::Forbidden(Action::ChangeStatus));
        }

        let from = appointment.status;
        if !from.can_advance() {
            return Ok(StatusChange::Unchanged(from));
        }
        let to = from.next();

        let token = self.credential()?;
        let request = AppointmentRequest::replacing(&appointment, to);
        self.gateway
            .update(&token, id, &request)
            .await
            .map_err(|error| gateway_error(error, STATUS_CHANGE_FAILED))?;
        info!(%id, %from, %to, "appointment status changed");

        self.reload_after_mutation().await;
        Ok(StatusChange::Advanced { from, to })
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<(), ViewError> {
        if !policy::can_delete(self.parsed_role()) {
            return Err(ViewError::Forbidden(Action::Delete));
        }
        let token = self.credential()?;

        self.gateway
            .delete(&token, id)
            .await
            .map_err(|error| gateway_error(error, DELETE_FAILED))?;
        info!(%id, "appointment deleted");

        self.reload_after_mutation().await;
        Ok(())
    }

    /// Clear the session and leave the view. Requests still in flight are
    /// not cancelled; their results are dropped.
    pub fn logout(self) -> Result<Route, ViewError> {
        self.guard.leave();
        self.session.clear()?;
        Ok(Route::Login)
    }

    async fn reload_after_mutation(&mut self) {
        if let Err(error) = self.refresh().await {
            warn!(%error, "list reload after mutation failed");
            self.stale = Some(error.to_string());
        }
    }
}
