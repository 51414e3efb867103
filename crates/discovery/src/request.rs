//! Per-scan state: the effective context, the target repository and the
//! eagerly fetched pull requests.

use scm::{Head, OwnerName, PullRequest, Repository};

use crate::{DiscoveryContext, DiscoveryError};

/// Where a head's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadOrigin {
    /// The repository being scanned.
    Default,
    /// A fork owned by someone else.
    Fork(OwnerName),
}

/// One scan of one repository.
///
/// Pull requests are loaded before any filter runs; filters and authorities
/// only read what the request already holds.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    context: DiscoveryContext,
    repository: Repository,
    pull_requests: Option<Vec<PullRequest>>,
}

impl SourceRequest {
    pub fn new(context: DiscoveryContext, repository: Repository) -> Self {
        Self {
            context,
            repository,
            pull_requests: None,
        }
    }

    /// Attaches the open pull requests of the repository.
    pub fn with_pull_requests(mut self, pull_requests: Vec<PullRequest>) -> Self {
        self.pull_requests = Some(pull_requests);
        self
    }

    pub fn context(&self) -> &DiscoveryContext {
        &self.context
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Open pull requests targeting the repository.
    ///
    /// Fails with [`DiscoveryError::PullRequestsNotLoaded`] if they were not
    /// (or could not be) fetched for this request.
    pub fn pull_requests(&self) -> Result<&[PullRequest], DiscoveryError> {
        self.pull_requests
            .as_deref()
            .ok_or_else(|| DiscoveryError::PullRequestsNotLoaded {
                repository: self.repository.full_name(),
            })
    }

    /// Returns `true` if any registered filter excludes `head`. Filters run in
    /// registration order and the first exclusion wins.
    pub fn is_excluded(&self, head: &Head) -> bool {
        self.context
            .filters()
            .iter()
            .any(|filter| filter.is_excluded(self, head))
    }

    /// Returns `true` if any registered authority trusts `head`.
    pub fn is_trusted(&self, head: &Head) -> bool {
        self.context
            .authorities()
            .iter()
            .any(|authority| authority.is_trusted(self, head))
    }

    /// Branches and tags always come from the scanned repository; a pull
    /// request comes from a fork when its source repository differs.
    pub fn origin_of(&self, head: &Head) -> HeadOrigin {
        match head {
            Head::Branch(_) | Head::Tag(_) => HeadOrigin::Default,
            Head::PullRequest(pr) => {
                let same_repository = self.repository.owner().eq_ignore_case(pr.source_owner.as_str())
                    && self.repository.name().eq_ignore_case(pr.source_repository.as_str());
                if same_repository {
                    HeadOrigin::Default
                } else {
                    HeadOrigin::Fork(pr.source_owner.clone())
                }
            }
        }
    }
}
