// services/clinic_api/errors.rs
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClinicApiError {
    #[error("clinic API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(
        "clinic API responded with status {status}: {}",
        .message.as_deref().unwrap_or("no message")
    )]
    Api {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("clinic API returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl ClinicApiError {
    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClinicApiError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text to show the user: the server's message, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}
