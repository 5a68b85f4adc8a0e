//! Radarr / Sonarr REST API client

pub mod client;
pub mod error;
pub mod models;
pub mod radarr;
pub mod shared;
pub mod sonarr;

use std::fmt;
use std::str::FromStr;

pub use client::ArrClient;
pub use error::{ArrError, ArrResult};
pub use radarr::{AddMovie, MovieUpdate, RadarrApi};
pub use shared::{ImportMode, ManualImportOutcome, REFRESH_MONITORED_COMMAND};
pub use sonarr::{AddSeries, SeriesUpdate, SonarrApi};

/// Which *arr application a request targets
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Service {
    Radarr,
    Sonarr,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Radarr => "radarr",
            Self::Sonarr => "sonarr",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radarr => write!(f, "Radarr"),
            Self::Sonarr => write!(f, "Sonarr"),
        }
    }
}

impl FromStr for Service {
    type Err = ArrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "radarr" => Ok(Self::Radarr),
            "sonarr" => Ok(Self::Sonarr),
            other => Err(ArrError::Invalid(format!(
                "Unknown service '{}' (expected 'radarr' or 'sonarr')",
                other
            ))),
        }
    }
}
