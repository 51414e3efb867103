//! Error types for hook processing and hook configuration.
//!
//! None of these ever reach the webhook transport: the processors log them
//! and treat the delivery as handled.

use scm::PayloadError;
use thiserror::Error;

use crate::HookEventType;

/// Conditions that abort processing of one delivery.
#[derive(Debug, Error)]
pub enum HookError {
    /// The processor has no handler for this event kind.
    ///
    /// Usually means the provider and this service disagree on supported
    /// events (version skew); surfaced to operators at error level.
    #[error(
        "Hook event of type {kind} is not supported by the {processor} processor; \
         please file an issue against the Bitbucket source integration"
    )]
    UnsupportedEvent {
        kind: HookEventType,
        processor: &'static str,
    },

    /// The payload could not be decoded.
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Invalid hook configuration supplied through the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}
