//! Shared value types for the Bitbucket source domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! structure and participate in domain decisions: repository identity
//! matching, change classification, and head construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CommitHash, OwnerName, PullRequestId, RefName, RepositoryName};

/// Host prefixes that identify Bitbucket Cloud.
const CLOUD_URL_PREFIXES: [&str; 2] = ["https://bitbucket.org", "http://bitbucket.org"];

/// Canonical server URL used for events and sources on Bitbucket Cloud.
pub const CLOUD_SERVER_URL: &str = "https://bitbucket.org";

/// Returns `true` if `server_url` points at Bitbucket Cloud.
pub fn is_cloud_url(server_url: &str) -> bool {
    let lowered = server_url.trim_end_matches('/').to_ascii_lowercase();
    CLOUD_URL_PREFIXES
        .iter()
        .any(|prefix| lowered == *prefix || lowered.starts_with(&format!("{prefix}/")))
}

// ---------------------------------------------------------------------------
// Provider variant
// ---------------------------------------------------------------------------

/// Which Bitbucket product produced a payload or serves a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitbucketType {
    /// Bitbucket Cloud (`bitbucket.org`).
    Cloud,
    /// Bitbucket Server / Data Center.
    Server,
}

impl std::fmt::Display for BitbucketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloud => write!(f, "cloud"),
            Self::Server => write!(f, "server"),
        }
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Protocol of a clone endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryProtocol {
    /// `https://` (or plain `http://`) clone URL.
    Http,
    /// `ssh://` or scp-style clone URL.
    Ssh,
}

/// One clone endpoint advertised by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloneLink {
    /// Protocol of this endpoint.
    pub protocol: RepositoryProtocol,
    /// The clone URL.
    pub href: String,
}

/// A Bitbucket repository as reported by the provider.
///
/// Immutable once constructed. Identity is the full name (`owner/name`):
/// storage preserves case, matching ignores it (see [`Repository::is_same_as`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    owner: OwnerName,
    name: RepositoryName,
    clone_links: Vec<CloneLink>,
}

impl Repository {
    /// Creates a repository with the given clone endpoints.
    pub fn new(owner: OwnerName, name: RepositoryName, clone_links: Vec<CloneLink>) -> Self {
        Self {
            owner,
            name,
            clone_links,
        }
    }

    /// Parses an `owner/name` full name. Returns `None` if either part is empty.
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        Some(Self::new(OwnerName::new(owner)?, RepositoryName::new(name)?, Vec::new()))
    }

    /// Owner name (workspace slug or project key).
    pub fn owner(&self) -> &OwnerName {
        &self.owner
    }

    /// Repository name (slug).
    pub fn name(&self) -> &RepositoryName {
        &self.name
    }

    /// Returns `owner/name`, case preserved.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Clone endpoints advertised by the provider. May be empty for
    /// repositories that were only referenced (e.g. a pull request source).
    pub fn clone_links(&self) -> &[CloneLink] {
        &self.clone_links
    }

    /// Returns the first clone URL for `protocol`, if advertised.
    pub fn clone_url(&self, protocol: RepositoryProtocol) -> Option<&str> {
        self.clone_links
            .iter()
            .find(|link| link.protocol == protocol)
            .map(|link| link.href.as_str())
    }

    /// Case-insensitive comparison against an `owner/name` string.
    pub fn matches_full_name(&self, full_name: &str) -> bool {
        self.full_name().eq_ignore_ascii_case(full_name)
    }

    /// Case-insensitive identity comparison.
    pub fn is_same_as(&self, other: &Repository) -> bool {
        self.owner.eq_ignore_case(other.owner.as_str()) && self.name.eq_ignore_case(other.name.as_str())
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Changes
// ---------------------------------------------------------------------------

/// Kind of ref a [`Change`] touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    Branch,
    Tag,
}

/// Raw change type tag as sent by the provider.
///
/// Unrecognised tags are preserved in [`ChangeType::Unknown`] so that the
/// processor can log and drop them instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeType {
    Add,
    Update,
    Delete,
    Unknown(String),
}

impl From<String> for ChangeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ADD" => Self::Add,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ChangeType> for String {
    fn from(value: ChangeType) -> Self {
        value.as_str().to_string()
    }
}

impl ChangeType {
    /// Returns the provider's tag for this change type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Add => "ADD",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Unknown(tag) => tag,
        }
    }

    /// Maps the raw tag onto the canonical event type.
    ///
    /// Returns `None` for [`ChangeType::Unknown`].
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::Add => Some(EventType::Created),
            Self::Update => Some(EventType::Updated),
            Self::Delete => Some(EventType::Removed),
            Self::Unknown(_) => None,
        }
    }
}

/// A single ref mutation reported by a push or mirror-sync event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    /// Whether a branch or a tag moved.
    pub ref_type: RefType,
    /// Short ref name (e.g. `"main"`, `"v1.0"`).
    pub ref_name: RefName,
    /// Raw provider change type.
    pub change_type: ChangeType,
    /// Commit the ref pointed at before the change, if any.
    pub from_hash: Option<CommitHash>,
    /// Commit the ref points at after the change; absent for deletions.
    pub to_hash: Option<CommitHash>,
}

/// Canonical change kind emitted downstream, independent of provider tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Created,
    Updated,
    Removed,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Updated => write!(f, "UPDATED"),
            Self::Removed => write!(f, "REMOVED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

/// Kind of ref used as a pull request source.
///
/// Some server implementations allow a tag to act as the source of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestBranchType {
    Branch,
    Tag,
}

/// Source side of a pull request: repository, branch and head commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSource {
    /// Repository that holds the source branch (the target itself for origin PRs).
    pub repository: Repository,
    /// Source branch to be merged.
    pub branch: RefName,
    /// Whether the source ref is a branch or a tag.
    pub branch_type: PullRequestBranchType,
    /// Head commit of the source branch.
    pub commit: Option<CommitHash>,
}

/// An open pull request against the repository being scanned.
///
/// The target repository is implicit: it is the repository whose pull
/// requests were listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: PullRequestId,
    pub title: String,
    pub source: PullRequestSource,
    /// Branch the pull request merges into.
    pub destination_branch: RefName,
}

// ---------------------------------------------------------------------------
// Heads and revisions
// ---------------------------------------------------------------------------

/// A named ref as listed by the provider (branch or tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    pub name: RefName,
    pub commit: Option<CommitHash>,
}

/// Category a head is presented under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadCategory {
    /// Plain branches.
    Uncategorized,
    /// Pull requests.
    ChangeRequests,
    /// Tags.
    Tags,
}

impl HeadCategory {
    pub fn is_uncategorized(self) -> bool {
        self == Self::Uncategorized
    }
}

/// A branch head.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BranchHead {
    pub name: RefName,
}

/// A tag head.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagHead {
    pub name: RefName,
}

/// A pull request head, named `PR-<id>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PullRequestHead {
    name: String,
    pub id: PullRequestId,
    pub source_owner: OwnerName,
    pub source_repository: RepositoryName,
    pub source_branch: RefName,
    pub source_branch_type: PullRequestBranchType,
    pub target_branch: RefName,
}

impl PullRequestHead {
    /// Builds the head for an open pull request.
    pub fn from_pull_request(pr: &PullRequest) -> Self {
        Self {
            name: format!("PR-{}", pr.id),
            id: pr.id,
            source_owner: pr.source.repository.owner().clone(),
            source_repository: pr.source.repository.name().clone(),
            source_branch: pr.source.branch.clone(),
            source_branch_type: pr.source.branch_type,
            target_branch: pr.destination_branch.clone(),
        }
    }
}

/// A discoverable unit: branch, tag or pull request.
///
/// Origin (own repository vs fork) and trust are computed by the discovery
/// layer; they are not stored on the head.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Head {
    Branch(BranchHead),
    Tag(TagHead),
    PullRequest(PullRequestHead),
}

impl Head {
    /// Convenience constructor for a branch head.
    pub fn branch(name: RefName) -> Self {
        Self::Branch(BranchHead { name })
    }

    /// Convenience constructor for a tag head.
    pub fn tag(name: RefName) -> Self {
        Self::Tag(TagHead { name })
    }

    /// Display name of the head.
    pub fn name(&self) -> &str {
        match self {
            Self::Branch(h) => h.name.as_str(),
            Self::Tag(h) => h.name.as_str(),
            Self::PullRequest(h) => &h.name,
        }
    }

    pub fn category(&self) -> HeadCategory {
        match self {
            Self::Branch(_) => HeadCategory::Uncategorized,
            Self::Tag(_) => HeadCategory::Tags,
            Self::PullRequest(_) => HeadCategory::ChangeRequests,
        }
    }
}

impl std::fmt::Display for Head {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The commit a head currently resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision {
    pub hash: CommitHash,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_urls_are_recognised() {
        assert!(is_cloud_url("https://bitbucket.org"));
        assert!(is_cloud_url("https://bitbucket.org/"));
        assert!(is_cloud_url("HTTPS://Bitbucket.org"));
        assert!(!is_cloud_url("https://bitbucket.example.com"));
        assert!(!is_cloud_url("https://bitbucket.org.example.com"));
    }

    #[test]
    fn repository_matching_ignores_case_but_storage_preserves_it() {
        let repo = Repository::from_full_name("Team/Widget").unwrap();
        assert_eq!(repo.full_name(), "Team/Widget");
        assert!(repo.matches_full_name("team/widget"));
        assert!(repo.is_same_as(&Repository::from_full_name("TEAM/WIDGET").unwrap()));
        assert!(Repository::from_full_name("no-slash").is_none());
    }

    #[test]
    fn change_type_round_trips_unknown_tags() {
        let parsed: ChangeType = serde_json::from_str("\"RENAME\"").unwrap();
        assert_eq!(parsed, ChangeType::Unknown("RENAME".into()));
        assert_eq!(parsed.event_type(), None);
        assert_eq!(ChangeType::from("ADD".to_string()).event_type(), Some(EventType::Created));
        assert_eq!(ChangeType::from("DELETE".to_string()).event_type(), Some(EventType::Removed));
    }

    #[test]
    fn pull_request_heads_are_named_after_their_id() {
        let pr = PullRequest {
            id: PullRequestId::new(7),
            title: "Add widget".into(),
            source: PullRequestSource {
                repository: Repository::from_full_name("team/widget").unwrap(),
                branch: RefName::new("feature/x").unwrap(),
                branch_type: PullRequestBranchType::Branch,
                commit: None,
            },
            destination_branch: RefName::new("main").unwrap(),
        };
        let head = Head::PullRequest(PullRequestHead::from_pull_request(&pr));
        assert_eq!(head.name(), "PR-7");
        assert_eq!(head.category(), HeadCategory::ChangeRequests);
    }
}
