//! Error types for the API client.
//!
//! # Design
//! Everything fallible in the crate returns [`Error`]. Local failures
//! (arity, nil values, missing keys) are raised before any network call and
//! never reach the transport. Completed round-trips with a 4xx/5xx status
//! surface as [`Error::Service`] carrying a [`ServiceError`] whose
//! [`ErrorKind`] mirrors the status code.

use serde_json::{Map, Value};
use thiserror::Error;

pub use crate::service_error::{ErrorKind, ServiceError};

const LIBRARY: &str = "hub-api";

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong arity, nil required value, malformed call.
    #[error("{0}")]
    Argument(String),

    /// A parameter map lacked keys an endpoint requires.
    #[error(transparent)]
    RequiredParams(#[from] RequiredParamsError),

    /// Parameter values failed presence or whitelist checks.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered with a 4xx/5xx status.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Redirects kept coming after the hop budget was spent.
    #[error("redirect limit of {limit} reached, last location was {location}")]
    RedirectLimitReached { location: String, limit: usize },

    /// No response could be obtained from the transport.
    #[error("transport failed: {0}")]
    Transport(String),

    /// A request body or URL could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Configuration values are unusable (e.g. an unparsable endpoint).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Error::Argument(message.into())
    }

    /// Status-derived kind, when this is a service error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Service(err) => Some(err.kind()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }
}

/// Raised when a parameter map is missing keys an endpoint needs.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", required_params_message(.missing, .required))]
pub struct RequiredParamsError {
    provided: Map<String, Value>,
    required: Vec<String>,
    missing: Vec<String>,
}

impl RequiredParamsError {
    pub(crate) fn new(provided: Map<String, Value>, required: Vec<String>, missing: Vec<String>) -> Self {
        Self {
            provided,
            required,
            missing,
        }
    }

    pub fn provided(&self) -> &Map<String, Value> {
        &self.provided
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

fn required_params_message(missing: &[String], required: &[String]) -> String {
    three_part_message(
        &format!("Missing required parameters: {}.", missing.join(", ")),
        &format!(
            "Required parameters are: {}, make sure these are the ones you are using",
            required.join(", ")
        ),
    )
}

/// Raised when parameter values are nil, empty, or outside their allowed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", three_part_message(.problem, .resolution))]
pub struct ValidationError {
    problem: String,
    resolution: String,
}

impl ValidationError {
    pub(crate) fn missing_values(keys: &[String]) -> Self {
        Self {
            problem: format!("Missing values for parameters: {}.", keys.join(", ")),
            resolution: format!(
                "Provide non-empty values for: {}, make sure these are the ones you are using",
                keys.join(", ")
            ),
        }
    }

    pub(crate) fn unknown_value(key: &str, value: &Value, permitted: &[String]) -> Self {
        Self {
            problem: format!("Wrong value of '{value}' for the parameter: {key}."),
            resolution: format!("Permitted values are: {}", permitted.join(", ")),
        }
    }

    pub fn problem(&self) -> &str {
        &self.problem
    }
}

fn three_part_message(problem: &str, resolution: &str) -> String {
    format!(
        "\nProblem:\n {problem}\nSummary:\n {LIBRARY} checks request parameters to fail fast \
         instead of hitting the API unnecessarily.\nResolution:\n {resolution}"
    )
}
