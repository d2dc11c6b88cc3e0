use thiserror::Error;

/// Errors raised by the pure engine components.
///
/// The engine defines no domain errors; anything here signals a programmer
/// error in the caller (malformed arguments), which the stateful layer maps
/// to an internal error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
