pub mod appointment;
pub mod role;

pub use appointment::{Appointment, AppointmentRequest, AppointmentStatus, NewAppointment};
pub use role::Role;
