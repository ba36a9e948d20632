use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::utils::schedule::{compare_schedule, normalize_form_datetime, parse_local_datetime};

/// Lifecycle of an appointment. `Completed` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum AppointmentStatus {
    Scheduled,
    InProgress,
    Completed,
    Canceled,
    /// Any status name this client does not know about.
    Unrecognized,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::InProgress => "IN_PROGRESS",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Canceled => "CANCELED",
            AppointmentStatus::Unrecognized => "UNRECOGNIZED",
        }
    }

    /// Next step of the fixed progression. Statuses without a successor map
    /// to themselves.
    pub fn next(self) -> Self {
        match self {
            AppointmentStatus::Scheduled => AppointmentStatus::InProgress,
            AppointmentStatus::InProgress => AppointmentStatus::Completed,
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Canceled
        )
    }

    /// Whether advancing would change anything.
    pub fn can_advance(self) -> bool {
        self.next() != self
    }
}

impl From<String> for AppointmentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SCHEDULED" => AppointmentStatus::Scheduled,
            "IN_PROGRESS" => AppointmentStatus::InProgress,
            "COMPLETED" => AppointmentStatus::Completed,
            "CANCELED" => AppointmentStatus::Canceled,
            _ => AppointmentStatus::Unrecognized,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub specialty: String,
    // Kept verbatim so updates echo what the server sent.
    pub date_time: String,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        parse_local_datetime(&self.date_time)
    }
}

/// Stable ascending sort by date-time; the API gives no ordering guarantee.
pub fn sort_by_schedule(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| compare_schedule(&a.date_time, &b.date_time));
}

/// Body for `POST /api/appointments` and `PUT /api/appointments/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub patient_name: String,
    pub doctor_name: String,
    pub specialty: String,
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
}

impl AppointmentRequest {
    /// Full-record replacement of `appointment` carrying `status`.
    pub fn replacing(appointment: &Appointment, status: AppointmentStatus) -> Self {
        Self {
            patient_name: appointment.patient_name.clone(),
            doctor_name: appointment.doctor_name.clone(),
            specialty: appointment.specialty.clone(),
            date_time: appointment.date_time.clone(),
            status: Some(status),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Blank(&'static str),
    #[error("date and time must look like YYYY-MM-DDTHH:MM, got '{0}'")]
    InvalidDateTime(String),
}

/// Fields of the "new appointment" form as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAppointment {
    pub patient_name: String,
    pub doctor_name: String,
    pub specialty: String,
    pub date_time: String,
}

impl NewAppointment {
    pub fn into_request(self) -> Result<AppointmentRequest, FormError> {
        let patient_name = required("patient name", self.patient_name)?;
        let doctor_name = required("doctor name", self.doctor_name)?;
        let specialty = required("specialty", self.specialty)?;
        let date_time = normalize_form_datetime(&self.date_time)
            .ok_or(FormError::InvalidDateTime(self.date_time))?;

        Ok(AppointmentRequest {
            patient_name,
            doctor_name,
            specialty,
            date_time,
            status: None,
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Blank(field));
    }
    Ok(value)
}
