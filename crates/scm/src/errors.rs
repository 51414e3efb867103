//! Error types shared across the Bitbucket source crates.
//!
//! [`PayloadError`] covers wire payloads that cannot be decoded. [`ApiError`]
//! covers failures reported through the [`crate::BitbucketApi`] port. Errors
//! specific to one layer (hook dispatch, discovery) are defined in their
//! respective crates.

use thiserror::Error;

/// A webhook or REST payload could not be turned into domain values.
///
/// Always recovered locally: the hook processors log it and treat the event
/// as a no-op.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The payload is not valid JSON or does not have the expected shape.
    #[error("Malformed {kind} payload: {source}")]
    Malformed {
        /// Which payload was being decoded (e.g. `"repo:refs_changed"`).
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The payload decoded but a required field was empty or missing.
    #[error("Invalid {kind} payload: missing or empty {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

/// Failures reported by a [`crate::BitbucketApi`] implementation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("Bitbucket request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The provider answered with a non-success status.
    #[error("Bitbucket returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be decoded.
    #[error("Bitbucket response from {url} could not be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: PayloadError,
    },
}
