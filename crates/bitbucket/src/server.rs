//! Bitbucket Server (`/rest/api/1.0`) response shapes.
//!
//! Server pages report `isLastPage` and the `nextPageStart` offset.

use serde::Deserialize;

use scm::wire::{commit_hash, ServerRepository};
use scm::{
    GitRef, PayloadError, PullRequest, PullRequestBranchType, PullRequestId, PullRequestSource,
    RefName, Repository,
};

pub const REPOSITORIES: &str = "server repositories page";
pub const REFS: &str = "server refs page";
pub const PULL_REQUESTS: &str = "server pull requests page";

const TAG_PREFIX: &str = "refs/tags/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default = "last_page")]
    pub is_last_page: bool,
    pub next_page_start: Option<u64>,
}

fn last_page() -> bool {
    true
}

impl<T> Page<T> {
    /// Offset of the next page, or `None` after the last one.
    pub fn next_start(&self) -> Option<u64> {
        if self.is_last_page {
            None
        } else {
            self.next_page_start
        }
    }
}

/// A branch or tag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ref {
    pub display_id: String,
    pub latest_commit: Option<String>,
}

impl Ref {
    pub fn into_git_ref(self) -> Option<GitRef> {
        Some(GitRef {
            name: RefName::new(self.display_id)?,
            commit: commit_hash(self.latest_commit),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRef {
    pub id: String,
    pub display_id: String,
    pub latest_commit: Option<String>,
    pub repository: Option<ServerRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestEntry {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub from_ref: PullRequestRef,
    pub to_ref: PullRequestRef,
}

impl PullRequestEntry {
    /// Pull requests whose source repository is gone are dropped (`Ok(None)`).
    pub fn into_pull_request(self) -> Result<Option<PullRequest>, PayloadError> {
        let from = self.from_ref;
        let Some(source_repository) = from.repository else {
            return Ok(None);
        };
        let branch_type = if from.id.starts_with(TAG_PREFIX) {
            PullRequestBranchType::Tag
        } else {
            PullRequestBranchType::Branch
        };
        let (Some(branch), Some(destination_branch)) = (
            RefName::new(from.display_id),
            RefName::new(self.to_ref.display_id),
        ) else {
            return Ok(None);
        };
        Ok(Some(PullRequest {
            id: PullRequestId::new(self.id),
            title: self.title,
            source: PullRequestSource {
                repository: source_repository.into_repository(PULL_REQUESTS)?,
                branch,
                branch_type,
                commit: commit_hash(from.latest_commit),
            },
            destination_branch,
        }))
    }
}

pub fn into_repositories(values: Vec<ServerRepository>) -> Result<Vec<Repository>, PayloadError> {
    values
        .into_iter()
        .map(|r| r.into_repository(REPOSITORIES))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PULL_REQUEST: &str = r#"{
        "id": 5, "title": "Release",
        "fromRef": { "id": "refs/tags/v2", "displayId": "v2", "latestCommit": "abc",
                     "repository": { "slug": "widget", "project": { "key": "PRJ" } } },
        "toRef": { "id": "refs/heads/main", "displayId": "main", "latestCommit": "def",
                   "repository": { "slug": "widget", "project": { "key": "PRJ" } } }
    }"#;

    #[test]
    fn tag_sourced_pull_requests_are_flagged() {
        let entry: PullRequestEntry = serde_json::from_str(PULL_REQUEST).unwrap();
        let pr = entry.into_pull_request().unwrap().unwrap();
        assert_eq!(pr.source.branch_type, PullRequestBranchType::Tag);
        assert_eq!(pr.source.branch.as_str(), "v2");
        assert_eq!(pr.source.repository.full_name(), "PRJ/widget");
        assert_eq!(pr.destination_branch.as_str(), "main");
    }

    #[test]
    fn paging_follows_next_page_start() {
        let page: Page<Ref> = serde_json::from_str(
            r#"{ "values": [ { "id": "refs/heads/main", "displayId": "main", "latestCommit": "abc" } ],
                 "size": 1, "isLastPage": false, "nextPageStart": 25 }"#,
        )
        .unwrap();
        assert_eq!(page.next_start(), Some(25));

        let last: Page<Ref> =
            serde_json::from_str(r#"{ "values": [], "isLastPage": true, "nextPageStart": 50 }"#).unwrap();
        assert_eq!(last.next_start(), None);
    }

    #[test]
    fn refs_without_names_are_dropped() {
        let page: Page<Ref> = serde_json::from_str(
            r#"{ "values": [ { "displayId": "" }, { "displayId": "v1", "latestCommit": "ccc" } ] }"#,
        )
        .unwrap();
        let refs: Vec<GitRef> = page.values.into_iter().filter_map(Ref::into_git_ref).collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].commit.as_ref().map(|c| c.as_str()), Some("ccc"));
    }
}
