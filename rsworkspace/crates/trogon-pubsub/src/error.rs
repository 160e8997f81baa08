//! Error types for provisioning and the adapter facade.
//!
//! Webhook decoding failures live next to the dispatcher
//! ([`DecodeError`](crate::dispatcher::DecodeError)) because they are turned
//! into HTTP responses rather than propagated.

use std::fmt;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A subscription (or its registration) is unusable. Always raised before
/// any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("subscription topic must not be empty")]
    EmptyTopic,

    #[error("subscription name must not be empty")]
    EmptyName,

    #[error("subscription {field} '{value}' must be a single URL path segment")]
    InvalidSegment { field: &'static str, value: String },

    #[error("a push handler is already registered at {0}")]
    AlreadyRegistered(String),
}

/// The remote call that failed while provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    TopicExists,
    CreateTopic,
    SubscriptionExists,
    CreateSubscription,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Self::TopicExists => "topic existence check",
            Self::CreateTopic => "topic creation",
            Self::SubscriptionExists => "subscription existence check",
            Self::CreateSubscription => "subscription creation",
        };
        f.write_str(step)
    }
}

/// A backend client call failed.
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct BackendError {
    step: ProvisionStep,
    source: BoxError,
}

impl BackendError {
    pub fn new(step: ProvisionStep, source: impl Into<BoxError>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }

    pub fn step(&self) -> ProvisionStep {
        self.step
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ProvisionError {
    /// The failing backend step, if the error came from the backend.
    pub fn step(&self) -> Option<ProvisionStep> {
        match self {
            Self::Backend(e) => Some(e.step()),
            Self::Validation(_) => None,
        }
    }
}

/// Errors surfaced by [`Adapter`](crate::adapter::Adapter). The first failure
/// wins and is returned unchanged.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("serving process failed: {0}")]
    Run(#[source] BoxError),
}

impl AdapterError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Provision(ProvisionError::Validation(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn backend_error_names_the_step() {
        let err = BackendError::new(ProvisionStep::CreateTopic, "permission denied");
        assert_eq!(err.to_string(), "topic creation failed: permission denied");
        assert_eq!(err.step(), ProvisionStep::CreateTopic);
    }

    #[test]
    fn backend_error_keeps_the_remote_error_as_source() {
        let err = BackendError::new(
            ProvisionStep::SubscriptionExists,
            std::io::Error::other("connection reset"),
        );
        assert_eq!(err.source().unwrap().to_string(), "connection reset");
    }

    #[test]
    fn provision_error_step_is_none_for_validation() {
        let err: ProvisionError = ValidationError::EmptyName.into();
        assert_eq!(err.step(), None);
        assert_eq!(err.to_string(), "subscription name must not be empty");
    }

    #[test]
    fn adapter_error_detects_nested_validation() {
        let direct: AdapterError = ValidationError::EmptyTopic.into();
        let nested: AdapterError = ProvisionError::from(ValidationError::EmptyTopic).into();
        let backend: AdapterError =
            ProvisionError::from(BackendError::new(ProvisionStep::TopicExists, "down")).into();

        assert!(direct.is_validation());
        assert!(nested.is_validation());
        assert!(!backend.is_validation());
    }

    #[test]
    fn run_error_display() {
        let err = AdapterError::Run(Box::new(std::io::Error::other("address in use")));
        assert_eq!(err.to_string(), "serving process failed: address in use");
    }
}
