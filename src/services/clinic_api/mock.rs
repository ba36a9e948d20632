use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{
    errors::ClinicApiError,
    models::AuthToken,
    service::{AppointmentGateway, AuthGateway},
};
use crate::models::{Appointment, AppointmentRequest, AppointmentStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    Register,
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { username: String },
    Register { username: String, role: Role },
    List { token: String },
    Get { token: String, id: Uuid },
    Create { token: String, request: AppointmentRequest },
    Update { token: String, id: Uuid, request: AppointmentRequest },
    Delete { token: String, id: Uuid },
}

type ListHook = Box<dyn Fn() + Send + Sync>;

/// In-memory stand-in for the clinic API that records every call.
pub struct MockClinicApi {
    pub appointments: Mutex<Vec<Appointment>>,
    pub calls: Mutex<Vec<Call>>,
    pub login_token: String,
    failures: Mutex<HashMap<Operation, (StatusCode, Option<String>)>>,
    on_list: Mutex<Option<ListHook>>,
}

impl Default for MockClinicApi {
    fn default() -> Self {
        Self {
            appointments: Mutex::new(vec![]),
            calls: Mutex::new(vec![]),
            login_token: "header.payload.signature".to_string(),
            failures: Mutex::new(HashMap::new()),
            on_list: Mutex::new(None),
        }
    }
}

impl MockClinicApi {
    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: Mutex::new(appointments),
            ..Default::default()
        }
    }

    pub fn with_login_token(token: impl Into<String>) -> Self {
        Self {
            login_token: token.into(),
            ..Default::default()
        }
    }

    /// Make `operation` fail with `status` and an optional server message.
    pub fn fail(&self, operation: Operation, status: StatusCode, message: Option<&str>) {
        self.failures
            .lock()
            .unwrap()
            .insert(operation, (status, message.map(str::to_string)));
    }

    /// Run `hook` while a list request is "in flight".
    pub fn on_list(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_list.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, operation: Operation) -> Result<(), ClinicApiError> {
        match self.failures.lock().unwrap().get(&operation) {
            Some((status, message)) => Err(ClinicApiError::Api {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn not_found() -> ClinicApiError {
        ClinicApiError::Api {
            status: StatusCode::NOT_FOUND,
            message: Some("Appointment not found".into()),
        }
    }
}

#[async_trait]
impl AuthGateway for MockClinicApi {
    async fn login(&self, username: &str, _password: &str) -> Result<AuthToken, ClinicApiError> {
        self.record(Call::Login {
            username: username.to_string(),
        });
        self.check(Operation::Login)?;
        Ok(AuthToken {
            token: self.login_token.clone(),
        })
    }

    async fn register(
        &self,
        username: &str,
        _password: &str,
        role: Role,
    ) -> Result<(), ClinicApiError> {
        self.record(Call::Register {
            username: username.to_string(),
            role,
        });
        self.check(Operation::Register)
    }
}

#[async_trait]
impl AppointmentGateway for MockClinicApi {
    async fn list(&self, token: &str) -> Result<Vec<Appointment>, ClinicApiError> {
        self.record(Call::List {
            token: token.to_string(),
        });
        if let Some(hook) = self.on_list.lock().unwrap().as_ref() {
            hook();
        }
        self.check(Operation::List)?;
        Ok(self.appointments.lock().unwrap().clone())
    }

    async fn get(&self, token: &str, id: Uuid) -> Result<Appointment, ClinicApiError> {
        self.record(Call::Get {
            token: token.to_string(),
            id,
        });
        self.check(Operation::Get)?;
        self.appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn create(
        &self,
        token: &str,
        request: &AppointmentRequest,
    ) -> Result<(), ClinicApiError> {
        self.record(Call::Create {
            token: token.to_string(),
            request: request.clone(),
        });
        self.check(Operation::Create)?;
        self.appointments.lock().unwrap().push(Appointment {
            id: Uuid::new_v4(),
            patient_name: request.patient_name.clone(),
            doctor_name: request.doctor_name.clone(),
            specialty: request.specialty.clone(),
            date_time: request.date_time.clone(),
            status: AppointmentStatus::Scheduled,
        });
        Ok(())
    }

    async fn update(
        &self,
        token: &str,
        id: Uuid,
        request: &AppointmentRequest,
    ) -> Result<(), ClinicApiError> {
        self.record(Call::Update {
            token: token.to_string(),
            id,
            request: request.clone(),
        });
        self.check(Operation::Update)?;
        let mut appointments = self.appointments.lock().unwrap();
        let stored = appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(Self::not_found)?;
        stored.patient_name = request.patient_name.clone();
        stored.doctor_name = request.doctor_name.clone();
        stored.specialty = request.specialty.clone();
        stored.date_time = request.date_time.clone();
        if let Some(status) = request.status {
            stored.status = status;
        }
        Ok(())
    }

    async fn delete(&self, token: &str, id: Uuid) -> Result<(), ClinicApiError> {
        self.record(Call::Delete {
            token: token.to_string(),
            id,
        });
        self.check(Operation::Delete)?;
        let mut appointments = self.appointments.lock().unwrap();
        let before = appointments.len();
        appointments.retain(|a| a.id != id);
        if appointments.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }
}
