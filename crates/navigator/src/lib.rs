//! Navigator reconciliation for Bitbucket owners.
//!
//! A navigator lists every repository of one owner and hands each to the scan
//! framework. Repositories that no registered source backs yet are yielded
//! first so new projects get discovered before existing ones are refreshed.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`request`] | [`NavigatorRequest`], [`SourceObserver`], [`RegisteredSources`] |

pub mod request;

pub use request::{NavigatorRequest, RegisteredSources, SourceObserver};

use scm::{ApiError, BitbucketApi, OwnerName, Repository};
use tracing::info;

/// Lists the repositories of `owner`, loads them into `request` and returns
/// them in observation order.
pub async fn visit_repositories(
    api: &dyn BitbucketApi,
    owner: &OwnerName,
    request: &mut NavigatorRequest,
) -> Result<Vec<Repository>, ApiError> {
    let listed = api.list_repositories(owner).await?;
    info!(owner = %owner, repositories = listed.len(), "Listed repositories");
    request.with_repositories(listed);
    Ok(request.repositories())
}
