//! The fetch-and-filter pipeline for one repository.
//!
//! 1. Fold the configured traits into a [`DiscoveryContext`].
//! 2. Fetch open pull requests, but only if the context wants them.
//! 3. List candidate heads for every wanted and enabled category.
//! 4. Drop excluded heads, then mark the rest trusted or untrusted.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use scm::{
    BitbucketApi, CredentialsId, GitRef, Head, HeadCategory, PullRequestHead, Repository,
    Revision,
};

use crate::{
    CheckoutBuilder, CheckoutSpec, DiscoveryContext, DiscoveryError, DiscoveryTrait, HeadOrigin,
    SourceRequest,
};

/// A head that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredHead {
    pub head: Head,
    pub revision: Option<Revision>,
    pub trusted: bool,
}

/// Scans repositories of one Bitbucket instance with a fixed trait list.
#[derive(Clone)]
pub struct SourceScanner {
    api: Arc<dyn BitbucketApi>,
    traits: Vec<Arc<dyn DiscoveryTrait>>,
}

fn revision(git_ref: &GitRef) -> Option<Revision> {
    git_ref.commit.clone().map(|hash| Revision { hash })
}

impl SourceScanner {
    pub fn new(api: Arc<dyn BitbucketApi>, traits: Vec<Arc<dyn DiscoveryTrait>>) -> Self {
        Self { api, traits }
    }

    /// The effective context produced by the configured traits.
    pub fn context(&self) -> DiscoveryContext {
        DiscoveryContext::from_traits(&self.traits)
    }

    /// Builds the request for `repository`, pre-fetching pull requests when
    /// the context wants them.
    ///
    /// A failed pull request listing is logged and leaves the request without
    /// pull requests; filters that need them then keep every branch.
    pub async fn request(&self, repository: &Repository) -> SourceRequest {
        let context = self.context();
        let wants_pull_requests = context.wants_pull_requests();
        let request = SourceRequest::new(context, repository.clone());
        if !wants_pull_requests {
            return request;
        }

        match self
            .api
            .list_pull_requests(repository.owner(), repository.name())
            .await
        {
            Ok(pull_requests) => request.with_pull_requests(pull_requests),
            Err(err) => {
                warn!(
                    owner = %repository.owner(),
                    repository = %repository.name(),
                    error = %err,
                    "Could not fetch pull requests"
                );
                request
            }
        }
    }

    /// Discovers the heads of `repository` that should be built.
    pub async fn scan(&self, repository: &Repository) -> Result<Vec<DiscoveredHead>, DiscoveryError> {
        let request = self.request(repository).await;
        let context = request.context();
        let mut candidates: Vec<(Head, Option<Revision>)> = Vec::new();

        if context.wants_branches() && context.includes_category(HeadCategory::Uncategorized) {
            let branches = self
                .api
                .list_branches(repository.owner(), repository.name())
                .await?;
            candidates.extend(
                branches
                    .iter()
                    .map(|b| (Head::branch(b.name.clone()), revision(b))),
            );
        }

        if context.wants_tags() && context.includes_category(HeadCategory::Tags) {
            let tags = self
                .api
                .list_tags(repository.owner(), repository.name())
                .await?;
            candidates.extend(tags.iter().map(|t| (Head::tag(t.name.clone()), revision(t))));
        }

        if context.includes_category(HeadCategory::ChangeRequests) {
            if let Ok(pull_requests) = request.pull_requests() {
                for pr in pull_requests {
                    let head = Head::PullRequest(PullRequestHead::from_pull_request(pr));
                    let wanted = match request.origin_of(&head) {
                        HeadOrigin::Default => context.wants_origin_prs(),
                        HeadOrigin::Fork(_) => context.wants_fork_prs(),
                    };
                    if wanted {
                        let revision = pr.source.commit.clone().map(|hash| Revision { hash });
                        candidates.push((head, revision));
                    }
                }
            }
        }

        let discovered: Vec<DiscoveredHead> = candidates
            .into_iter()
            .filter(|(head, _)| {
                let excluded = request.is_excluded(head);
                if excluded {
                    debug!(repository = %repository, head = %head, "Head excluded by filter");
                }
                !excluded
            })
            .map(|(head, revision)| DiscoveredHead {
                trusted: request.is_trusted(&head),
                head,
                revision,
            })
            .collect();

        info!(
            repository = %repository,
            heads = discovered.len(),
            "Discovered heads"
        );
        Ok(discovered)
    }

    /// Resolves how `repository` is checked out, starting from the API
    /// credential and applying every trait's checkout decoration in order.
    pub fn checkout(
        &self,
        repository: &Repository,
        api_credentials: Option<CredentialsId>,
    ) -> Result<CheckoutSpec, DiscoveryError> {
        self.traits
            .iter()
            .fold(
                CheckoutBuilder::new(repository.clone(), api_credentials),
                |builder, discovery| discovery.decorate_checkout(builder),
            )
            .build()
    }
}
