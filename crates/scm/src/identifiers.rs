//! Newtype domain identifiers.
//!
//! Every Bitbucket concept that has an identity is represented as a distinct
//! newtype wrapping a primitive. This prevents accidentally interchanging, for
//! example, an [`OwnerName`] with a [`RepositoryName`] even though both are
//! strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: Bitbucket-integer-backed
// ---------------------------------------------------------------------------

/// Identifies a Bitbucket pull request within its target repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PullRequestId(u64);

impl PullRequestId {
    /// Creates a new identifier from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single webhook delivery as it flows through the hook processors.
///
/// Generated fresh for every inbound delivery; propagated through spans and
/// emitted head events so all activity from one delivery can be correlated
/// with the provider-side delivery log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(Uuid);

impl DeliveryId {
    /// Generates a new random delivery identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`DeliveryId`] from an existing UUID (e.g. a provider request id).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (provider / Git names)
// ---------------------------------------------------------------------------

string_id! {
    /// Owner of a repository: the workspace slug on Cloud, the project key on Server.
    OwnerName
}

string_id! {
    /// Repository name: the repository slug on both Cloud and Server.
    RepositoryName
}

string_id! {
    /// A Git branch or tag name without the `refs/...` prefix (e.g. `"feature/x"`).
    RefName
}

string_id! {
    /// A Git commit hash as reported by the provider.
    CommitHash
}

string_id! {
    /// Identifies a mirror server in a Bitbucket Data Center mirror farm.
    MirrorId
}

string_id! {
    /// Base URL of a Bitbucket instance (e.g. `"https://bitbucket.org"`).
    ServerUrl
}

string_id! {
    /// Identifies a credential in the external credential store.
    ///
    /// The store itself is an external collaborator; only the id travels here.
    CredentialsId
}

impl OwnerName {
    /// Compares two owner names ignoring ASCII case.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl RepositoryName {
    /// Compares two repository names ignoring ASCII case.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}
