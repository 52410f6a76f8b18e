//! Error types for the Fit client.

use thiserror::Error;

/// Main error type for the Fit client.
#[derive(Error, Debug)]
pub enum FitError {
    /// One or more required parameters were absent from the parameter bag.
    ///
    /// Carries every missing name so a caller can fix all of them in one
    /// round-trip.
    #[error("Missing required parameters: {}", .names.join(", "))]
    MissingParameters { names: Vec<String> },

    /// A declared path parameter has no matching `{name}` placeholder in the
    /// URL template (a descriptor-authoring defect).
    #[error("Malformed URL template in operation '{operation}': {detail}")]
    MalformedTemplate { operation: String, detail: String },

    /// Configuration errors (invalid base URL, invalid descriptor table,
    /// duplicate operation ids).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime errors (unknown operation, invalid argument shapes).
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Non-2xx responses from the API.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Transport-level failures (connect, TLS, timeout).
    #[error("http transport error: {0}")]
    Transport(String),
}

/// Result type alias for Fit client operations.
pub type Result<T> = std::result::Result<T, FitError>;
