//! Errors returned by the Radarr/Sonarr REST client

use thiserror::Error;

use super::Service;

#[derive(Debug, Error)]
pub enum ArrError {
    #[error("{0} API key is not configured")]
    NotConfigured(Service),

    #[error("{0} API key invalid or expired")]
    Unauthorized(Service),

    #[error("{0} access denied, API key may lack permissions")]
    Forbidden(Service),

    #[error("{service} resource not found: {path}")]
    NotFound { service: Service, path: String },

    #[error("{service} API failed: {status} - {body}")]
    Status {
        service: Service,
        status: u16,
        body: String,
    },

    #[error("{service} request failed: {source}")]
    Request {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build {service} request body: {source}")]
    Encode {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse {service} response: {source}")]
    Decode {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

impl ArrError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(service: Service, status: u16, path: &str, body: String) -> Self {
        match status {
            401 => Self::Unauthorized(service),
            403 => Self::Forbidden(service),
            404 => Self::NotFound {
                service,
                path: path.to_string(),
            },
            _ => Self::Status {
                service,
                status,
                body,
            },
        }
    }
}

pub type ArrResult<T> = std::result::Result<T, ArrError>;
