//! Which actions the UI offers for a given role.
//!
//! These checks only decide what gets enabled; the API enforces its own
//! authorization on every request.

use crate::models::{Appointment, AppointmentStatus, Role};

pub fn can_create(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Admin | Role::Receptionist))
}

pub fn can_delete(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Admin))
}

pub fn can_update_status(role: Option<Role>, status: AppointmentStatus) -> bool {
    match role {
        Some(Role::Admin) => true,
        Some(Role::Receptionist | Role::Doctor) => status != AppointmentStatus::Completed,
        None => false,
    }
}

/// Gate for the "change status" action. Terminal appointments are blocked
/// here even though [`can_update_status`] alone would allow some of them.
pub fn can_change_status(role: Option<Role>, status: AppointmentStatus) -> bool {
    can_update_status(role, status) && !status.is_terminal()
}

/// Actions enabled on a single appointment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowActions {
    pub change_status: bool,
    pub delete: bool,
}

impl RowActions {
    pub fn for_appointment(role: Option<Role>, appointment: &Appointment) -> Self {
        Self {
            change_status: can_change_status(role, appointment.status),
            delete: can_delete(role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    ChangeStatus,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Create => "create appointments",
            Action::ChangeStatus => "change the status of this appointment",
            Action::Delete => "delete appointments",
        };
        write!(f, "{}", s)
    }
}
