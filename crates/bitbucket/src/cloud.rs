//! Bitbucket Cloud (`/2.0`) response shapes.
//!
//! Cloud pages carry an absolute `next` URL until the last page.

use serde::Deserialize;

use scm::wire::{commit_hash, CloudRepository};
use scm::{
    GitRef, PayloadError, PullRequest, PullRequestBranchType, PullRequestId, PullRequestSource,
    RefName, Repository,
};

pub const REPOSITORIES: &str = "cloud repositories page";
pub const REFS: &str = "cloud refs page";
pub const PULL_REQUESTS: &str = "cloud pull requests page";

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub hash: Option<String>,
}

/// A branch or tag.
#[derive(Debug, Deserialize)]
pub struct Ref {
    pub name: String,
    pub target: Option<Commit>,
}

impl Ref {
    /// Unnamed refs are dropped.
    pub fn into_git_ref(self) -> Option<GitRef> {
        Some(GitRef {
            name: RefName::new(self.name)?,
            commit: commit_hash(self.target.and_then(|t| t.hash)),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BranchName {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Endpoint {
    pub branch: BranchName,
    pub commit: Option<Commit>,
    /// Absent when the source fork was deleted.
    pub repository: Option<CloudRepository>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestEntry {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub source: Endpoint,
    pub destination: Endpoint,
}

impl PullRequestEntry {
    /// Pull requests whose source repository is gone are dropped (`Ok(None)`).
    pub fn into_pull_request(self) -> Result<Option<PullRequest>, PayloadError> {
        let Some(source_repository) = self.source.repository else {
            return Ok(None);
        };
        let (Some(branch), Some(destination_branch)) = (
            RefName::new(self.source.branch.name),
            RefName::new(self.destination.branch.name),
        ) else {
            return Ok(None);
        };
        Ok(Some(PullRequest {
            id: PullRequestId::new(self.id),
            title: self.title,
            source: PullRequestSource {
                repository: source_repository.into_repository(PULL_REQUESTS)?,
                branch,
                branch_type: PullRequestBranchType::Branch,
                commit: commit_hash(self.source.commit.and_then(|c| c.hash)),
            },
            destination_branch,
        }))
    }
}

pub fn into_repositories(values: Vec<CloudRepository>) -> Result<Vec<Repository>, PayloadError> {
    values
        .into_iter()
        .map(|r| r.into_repository(REPOSITORIES))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scm::RepositoryProtocol;

    #[test]
    fn repositories_page_decodes() {
        let page: Page<CloudRepository> = serde_json::from_str(
            r#"{
                "pagelen": 10,
                "values": [ { "full_name": "team/widget", "links": { "clone": [
                    { "href": "https://bitbucket.org/team/widget.git", "name": "https" },
                    { "href": "git@bitbucket.org:team/widget.git", "name": "ssh" }
                ] } } ],
                "next": "https://api.bitbucket.org/2.0/repositories/team?page=2"
            }"#,
        )
        .unwrap();
        assert!(page.next.is_some());
        let repositories = into_repositories(page.values).unwrap();
        assert_eq!(repositories[0].full_name(), "team/widget");
        assert_eq!(
            repositories[0].clone_url(RepositoryProtocol::Ssh),
            Some("git@bitbucket.org:team/widget.git")
        );
    }

    #[test]
    fn pull_request_from_fork_keeps_source_repository() {
        let entry: PullRequestEntry = serde_json::from_str(
            r#"{
                "id": 12, "title": "Fix",
                "source": { "branch": { "name": "fix" }, "commit": { "hash": "abc" },
                            "repository": { "full_name": "alice/widget" } },
                "destination": { "branch": { "name": "main" }, "commit": { "hash": "def" },
                                 "repository": { "full_name": "team/widget" } }
            }"#,
        )
        .unwrap();
        let pr = entry.into_pull_request().unwrap().unwrap();
        assert_eq!(pr.id.as_u64(), 12);
        assert_eq!(pr.source.repository.full_name(), "alice/widget");
        assert_eq!(pr.source.commit.as_ref().map(|c| c.as_str()), Some("abc"));
        assert_eq!(pr.destination_branch.as_str(), "main");
    }

    #[test]
    fn pull_request_from_deleted_fork_is_dropped() {
        let entry: PullRequestEntry = serde_json::from_str(
            r#"{ "id": 1, "source": { "branch": { "name": "x" }, "repository": null },
                 "destination": { "branch": { "name": "main" } } }"#,
        )
        .unwrap();
        assert_eq!(entry.into_pull_request().unwrap(), None);
    }

    #[test]
    fn last_page_has_no_next() {
        let page: Page<Ref> =
            serde_json::from_str(r#"{ "values": [ { "name": "main", "target": { "hash": "abc" } } ] }"#)
                .unwrap();
        assert!(page.next.is_none());
        let refs: Vec<GitRef> = page.values.into_iter().filter_map(Ref::into_git_ref).collect();
        assert_eq!(refs[0].name.as_str(), "main");
    }
}
