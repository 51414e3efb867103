//! Filters and authorities registered by branch discovery.

use scm::{BranchHead, Head, PullRequest};
use tracing::warn;

use crate::{HeadAuthority, HeadFilter, SourceRequest};

/// Trusts every plain branch of the scanned repository.
///
/// Branches can only be pushed by people with write access, so no fork
/// calculus applies to them.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchHeadAuthority;

impl HeadAuthority for BranchHeadAuthority {
    fn is_trusted(&self, _request: &SourceRequest, head: &Head) -> bool {
        matches!(head, Head::Branch(_))
    }
}

/// Returns whether some open pull request of `request` has `branch` of the
/// scanned repository as its source.
///
/// `None` when pull requests are unavailable; the failure has been logged.
fn has_origin_pull_request(request: &SourceRequest, branch: &BranchHead) -> Option<bool> {
    let pull_requests = match request.pull_requests() {
        Ok(pull_requests) => pull_requests,
        Err(err) => {
            warn!(
                repository = %request.repository(),
                branch = %branch.name,
                error = %err,
                "Pull request data unavailable while filtering branches; keeping the branch"
            );
            return None;
        }
    };
    let full_name = request.repository().full_name();
    Some(
        pull_requests
            .iter()
            .any(|pr: &PullRequest| {
                pr.source.repository.matches_full_name(&full_name) && pr.source.branch == branch.name
            }),
    )
}

/// Excludes branches that are also the source of an origin pull request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcludeOriginPrBranchesFilter;

impl HeadFilter for ExcludeOriginPrBranchesFilter {
    fn is_excluded(&self, request: &SourceRequest, head: &Head) -> bool {
        match head {
            Head::Branch(branch) => has_origin_pull_request(request, branch).unwrap_or(false),
            Head::Tag(_) | Head::PullRequest(_) => false,
        }
    }
}

/// Excludes branches that are not the source of any origin pull request.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlyOriginPrBranchesFilter;

impl HeadFilter for OnlyOriginPrBranchesFilter {
    fn is_excluded(&self, request: &SourceRequest, head: &Head) -> bool {
        match head {
            Head::Branch(branch) => has_origin_pull_request(request, branch)
                .map(|has_pr| !has_pr)
                .unwrap_or(false),
            Head::Tag(_) | Head::PullRequest(_) => false,
        }
    }
}
