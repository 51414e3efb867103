//! In-memory [`BitbucketApi`] for tests and offline tooling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{ApiError, BitbucketApi, GitRef, OwnerName, PullRequest, Repository, RepositoryName};

#[derive(Debug, Default, Clone)]
struct RepositoryData {
    branches: Vec<GitRef>,
    tags: Vec<GitRef>,
    pull_requests: Vec<PullRequest>,
}

/// Serves fixed repositories, refs and pull requests from memory.
///
/// Keys are lower-cased so lookups follow the provider's case-insensitive
/// matching. Pull request listings are counted so tests can assert whether
/// they were fetched.
#[derive(Debug, Default)]
pub struct MemoryBitbucketApi {
    repositories: RwLock<HashMap<String, Vec<Repository>>>,
    data: RwLock<HashMap<String, RepositoryData>>,
    failing_pull_requests: RwLock<bool>,
    pull_request_calls: AtomicUsize,
}

fn key(owner: &str, repository: &str) -> String {
    format!("{}/{}", owner.to_ascii_lowercase(), repository.to_ascii_lowercase())
}

impl MemoryBitbucketApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repository under its owner.
    pub fn add_repository(&self, repository: Repository) {
        if let Ok(mut repos) = self.repositories.write() {
            repos
                .entry(repository.owner().as_str().to_ascii_lowercase())
                .or_default()
                .push(repository);
        }
    }

    pub fn add_branch(&self, repository: &Repository, branch: GitRef) {
        self.with_data(repository, |d| d.branches.push(branch));
    }

    pub fn add_tag(&self, repository: &Repository, tag: GitRef) {
        self.with_data(repository, |d| d.tags.push(tag));
    }

    pub fn add_pull_request(&self, repository: &Repository, pull_request: PullRequest) {
        self.with_data(repository, |d| d.pull_requests.push(pull_request));
    }

    /// Makes every subsequent pull request listing fail with a transport error.
    pub fn fail_pull_requests(&self) {
        if let Ok(mut failing) = self.failing_pull_requests.write() {
            *failing = true;
        }
    }

    /// Number of times pull requests were listed.
    pub fn pull_request_calls(&self) -> usize {
        self.pull_request_calls.load(Ordering::SeqCst)
    }

    fn with_data(&self, repository: &Repository, f: impl FnOnce(&mut RepositoryData)) {
        if let Ok(mut data) = self.data.write() {
            f(data
                .entry(key(repository.owner().as_str(), repository.name().as_str()))
                .or_default());
        }
    }

    fn read_data(&self, owner: &OwnerName, repository: &RepositoryName) -> RepositoryData {
        self.data
            .read()
            .ok()
            .and_then(|data| data.get(&key(owner.as_str(), repository.as_str())).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BitbucketApi for MemoryBitbucketApi {
    async fn list_repositories(&self, owner: &OwnerName) -> Result<Vec<Repository>, ApiError> {
        Ok(self
            .repositories
            .read()
            .ok()
            .and_then(|repos| repos.get(&owner.as_str().to_ascii_lowercase()).cloned())
            .unwrap_or_default())
    }

    async fn list_branches(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<GitRef>, ApiError> {
        Ok(self.read_data(owner, repository).branches)
    }

    async fn list_tags(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<GitRef>, ApiError> {
        Ok(self.read_data(owner, repository).tags)
    }

    async fn list_pull_requests(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<PullRequest>, ApiError> {
        self.pull_request_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_pull_requests.read().map(|f| *f).unwrap_or(false) {
            return Err(ApiError::Transport {
                url: format!("memory://{owner}/{repository}/pull-requests"),
                message: "pull request listing disabled".into(),
            });
        }
        Ok(self.read_data(owner, repository).pull_requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RefName;

    #[tokio::test]
    async fn lookups_ignore_case() {
        let api = MemoryBitbucketApi::new();
        let repo = Repository::from_full_name("Team/Widget").unwrap();
        api.add_repository(repo.clone());
        api.add_branch(
            &repo,
            GitRef {
                name: RefName::new("main").unwrap(),
                commit: None,
            },
        );

        let owner = OwnerName::new("team").unwrap();
        let name = RepositoryName::new("WIDGET").unwrap();
        assert_eq!(api.list_repositories(&owner).await.unwrap(), vec![repo]);
        assert_eq!(api.list_branches(&owner, &name).await.unwrap().len(), 1);
        assert!(api.list_tags(&owner, &name).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pull_request_failures_are_reported_and_counted() {
        let api = MemoryBitbucketApi::new();
        api.fail_pull_requests();
        let owner = OwnerName::new("team").unwrap();
        let name = RepositoryName::new("widget").unwrap();
        assert!(matches!(
            api.list_pull_requests(&owner, &name).await,
            Err(ApiError::Transport { .. })
        ));
        assert_eq!(api.pull_request_calls(), 1);
    }
}
