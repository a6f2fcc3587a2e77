#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure talking to the render engine's scripting surface.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The request never got an answer (connection refused, DNS, timeout).
    #[error("Engine request failed: {0}")]
    Request(String),

    /// The engine answered with a non-success status.
    #[error("Engine API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The engine answered with a payload we could not decode.
    #[error("Unexpected engine response: {0}")]
    Decode(String),
}
