//! Error types for the discovery engine.

use scm::{ApiError, RepositoryProtocol};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A filter or head builder asked for pull requests that were never
    /// fetched for this request.
    #[error("Pull requests of {repository} were not loaded for this request")]
    PullRequestsNotLoaded { repository: String },

    /// A branch discovery strategy outside `0..=3`.
    #[error("Unknown branch discovery strategy {strategy_id}; expected 0, 1, 2 or 3")]
    InvalidStrategy { strategy_id: u8 },

    /// The repository does not advertise a clone URL for the requested protocol.
    #[error("Repository {repository} has no {protocol:?} clone link")]
    NoCloneLink {
        repository: String,
        protocol: RepositoryProtocol,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}
