//! Core domain for discovering Bitbucket branches, tags and pull requests.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type and port trait used by the hook processors, the discovery engine and
//! the navigator. Infrastructure crates implement the traits defined here;
//! they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`OwnerName`, `RefName`, `DeliveryId`, etc.) |
//! | [`types`] | Value types (`Repository`, `Change`, `Head`, `PullRequest`, etc.) |
//! | [`wire`] | Cloud and Server JSON shapes shared by webhooks and REST |
//! | [`errors`] | `PayloadError` and `ApiError` |
//! | [`ports`] | The [`BitbucketApi`] port |
//! | [`fakes`] | In-memory [`BitbucketApi`] |

pub mod errors;
pub mod fakes;
pub mod identifiers;
pub mod ports;
pub mod types;
pub mod wire;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ApiError, PayloadError};
pub use identifiers::{
    CommitHash, CredentialsId, DeliveryId, MirrorId, OwnerName, PullRequestId, RefName,
    RepositoryName, ServerUrl,
};
pub use ports::BitbucketApi;
pub use types::{
    is_cloud_url, BitbucketType, BranchHead, Change, ChangeType, CloneLink, EventType, GitRef,
    Head, HeadCategory, PullRequest, PullRequestBranchType, PullRequestHead, PullRequestSource,
    RefType, Repository, RepositoryProtocol, Revision, TagHead, Timestamp, CLOUD_SERVER_URL,
};
