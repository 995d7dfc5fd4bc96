use thiserror::Error;

/// Failure of a single request against the weather API.
///
/// The controller collapses all of these into one user-facing message; the
/// variants exist so the detail can be logged and tested.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeatherError {
    /// The request could not be sent or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status with a body that is not an API status envelope.
    #[error("request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// The API reported a failure through the `cod` field of the body.
    #[error("upstream error {code}: {message}")]
    Upstream { code: u16, message: String },

    /// A success body that does not have the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),
}
