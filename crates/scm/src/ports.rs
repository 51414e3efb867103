//! Port trait for the Bitbucket REST API.
//!
//! Domain crates depend only on [`BitbucketApi`]; the `bitbucket` crate
//! supplies the HTTP implementation and [`crate::fakes`] supplies an in-memory
//! one for tests.

use async_trait::async_trait;

use crate::{ApiError, GitRef, OwnerName, PullRequest, Repository, RepositoryName};

/// Read-only view of one Bitbucket instance.
///
/// Every listing is complete: implementations follow pagination until the
/// provider reports the last page.
#[async_trait]
pub trait BitbucketApi: Send + Sync {
    /// Lists every repository owned by `owner`.
    async fn list_repositories(&self, owner: &OwnerName) -> Result<Vec<Repository>, ApiError>;

    /// Lists the branches of `owner/repository`.
    async fn list_branches(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<GitRef>, ApiError>;

    /// Lists the tags of `owner/repository`.
    async fn list_tags(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<GitRef>, ApiError>;

    /// Lists the open pull requests targeting `owner/repository`.
    async fn list_pull_requests(
        &self,
        owner: &OwnerName,
        repository: &RepositoryName,
    ) -> Result<Vec<PullRequest>, ApiError>;
}
