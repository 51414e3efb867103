//! Wire models shared by webhook payloads and REST responses.
//!
//! Bitbucket Cloud and Bitbucket Server describe repositories with different
//! JSON shapes. Both appear in webhook bodies as well as in REST listings, so
//! the decoding lives here and each shape converts into the single
//! [`Repository`] value type.

use serde::Deserialize;

use crate::{
    CloneLink, CommitHash, OwnerName, PayloadError, Repository, RepositoryName, RepositoryProtocol,
};

/// Server reports this hash as the "from" side of a newly created ref.
const NULL_COMMIT: &str = "0000000000000000000000000000000000000000";

/// Converts a provider hash into a [`CommitHash`], treating empty and all-zero
/// hashes as absent.
pub fn commit_hash(raw: Option<String>) -> Option<CommitHash> {
    raw.filter(|h| h != NULL_COMMIT).and_then(CommitHash::new)
}

fn protocol_for(link_name: &str) -> Option<RepositoryProtocol> {
    match link_name.to_ascii_lowercase().as_str() {
        "http" | "https" => Some(RepositoryProtocol::Http),
        "ssh" => Some(RepositoryProtocol::Ssh),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedLink {
    pub href: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryLinks {
    #[serde(default)]
    pub clone: Vec<NamedLink>,
}

impl RepositoryLinks {
    fn into_clone_links(self) -> Vec<CloneLink> {
        self.clone
            .into_iter()
            .filter_map(|link| {
                protocol_for(&link.name).map(|protocol| CloneLink {
                    protocol,
                    href: link.href,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Bitbucket Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ServerProject {
    pub key: String,
}

/// Repository as described by Bitbucket Server (`slug` + `project.key`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRepository {
    pub slug: String,
    pub project: ServerProject,
    #[serde(default)]
    pub links: RepositoryLinks,
}

impl ServerRepository {
    /// Converts into the domain type. The project key is the owner.
    pub fn into_repository(self, kind: &'static str) -> Result<Repository, PayloadError> {
        let owner = OwnerName::new(self.project.key).ok_or(PayloadError::MissingField {
            kind,
            field: "repository.project.key",
        })?;
        let name = RepositoryName::new(self.slug).ok_or(PayloadError::MissingField {
            kind,
            field: "repository.slug",
        })?;
        Ok(Repository::new(owner, name, self.links.into_clone_links()))
    }
}

// ---------------------------------------------------------------------------
// Bitbucket Cloud
// ---------------------------------------------------------------------------

/// Repository as described by Bitbucket Cloud (`full_name` = `workspace/slug`).
#[derive(Debug, Clone, Deserialize)]
pub struct CloudRepository {
    pub full_name: String,
    #[serde(default)]
    pub links: RepositoryLinks,
}

impl CloudRepository {
    /// Converts into the domain type. The workspace slug is the owner.
    pub fn into_repository(self, kind: &'static str) -> Result<Repository, PayloadError> {
        let (owner, name) = self
            .full_name
            .split_once('/')
            .ok_or(PayloadError::MissingField {
                kind,
                field: "repository.full_name",
            })?;
        let owner = OwnerName::new(owner).ok_or(PayloadError::MissingField {
            kind,
            field: "repository.full_name",
        })?;
        let name = RepositoryName::new(name).ok_or(PayloadError::MissingField {
            kind,
            field: "repository.full_name",
        })?;
        Ok(Repository::new(owner, name, self.links.into_clone_links()))
    }
}
