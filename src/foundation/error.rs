/// Convenience result type used across shadowcast.
pub type ShadowResult<T> = Result<T, ShadowError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Absent inputs and stale (size-mismatched) derived buffers are not errors: stages report them by
/// producing no output. Errors are reserved for bad parameters, failed decodes and broken
/// buffer contracts.
#[derive(thiserror::Error, Debug)]
pub enum ShadowError {
    /// Invalid user-provided parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// An external image decode failed.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors while evaluating a pipeline stage (buffer contracts, surface limits).
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShadowError {
    /// Build a [`ShadowError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ShadowError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`ShadowError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ShadowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
