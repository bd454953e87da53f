/// Convenience result type used across Easel.
pub type EaselResult<T> = Result<T, EaselError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum EaselError {
    /// Operation on a destroyed or detached node, or on a torn-down engine.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed attribute or configuration the core cannot interpret.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Surface or registry allocation failure.
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EaselError {
    /// Build an [`EaselError::InvalidState`] value.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Build an [`EaselError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build an [`EaselError::ResourceExhaustion`] value.
    pub fn resource_exhaustion(msg: impl Into<String>) -> Self {
        Self::ResourceExhaustion(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
