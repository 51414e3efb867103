//! Scanner tests against the in-memory Bitbucket API.

use std::sync::Arc;

use discovery::{
    BranchDiscoveryTrait, BranchStrategy, DiscoveryContext, DiscoveryError, DiscoveryTrait,
    SourceScanner, SshCheckoutTrait,
};
use scm::fakes::MemoryBitbucketApi;
use scm::{
    CloneLink, CommitHash, CredentialsId, GitRef, Head, HeadCategory, OwnerName, PullRequest,
    PullRequestBranchType, PullRequestId, PullRequestSource, RefName, Repository, RepositoryName,
    RepositoryProtocol,
};

fn widget() -> Repository {
    Repository::new(
        OwnerName::new("team").unwrap(),
        RepositoryName::new("widget").unwrap(),
        vec![
            CloneLink {
                protocol: RepositoryProtocol::Http,
                href: "https://bitbucket.org/team/widget.git".into(),
            },
            CloneLink {
                protocol: RepositoryProtocol::Ssh,
                href: "git@bitbucket.org:team/widget.git".into(),
            },
        ],
    )
}

fn git_ref(name: &str, commit: &str) -> GitRef {
    GitRef {
        name: RefName::new(name).unwrap(),
        commit: CommitHash::new(commit),
    }
}

fn pull_request(id: u64, source: &str, branch: &str) -> PullRequest {
    PullRequest {
        id: PullRequestId::new(id),
        title: format!("PR {id}"),
        source: PullRequestSource {
            repository: Repository::from_full_name(source).unwrap(),
            branch: RefName::new(branch).unwrap(),
            branch_type: PullRequestBranchType::Branch,
            commit: CommitHash::new(format!("pr{id}")),
        },
        destination_branch: RefName::new("main").unwrap(),
    }
}

fn seeded_api() -> Arc<MemoryBitbucketApi> {
    let api = Arc::new(MemoryBitbucketApi::new());
    let repo = widget();
    api.add_repository(repo.clone());
    api.add_branch(&repo, git_ref("main", "aaa"));
    api.add_branch(&repo, git_ref("feature", "bbb"));
    api.add_tag(&repo, git_ref("v1", "ccc"));
    api.add_pull_request(&repo, pull_request(1, "team/widget", "feature"));
    api.add_pull_request(&repo, pull_request(2, "alice/widget", "main"));
    api
}

fn scanner(api: &Arc<MemoryBitbucketApi>, traits: Vec<Arc<dyn DiscoveryTrait>>) -> SourceScanner {
    SourceScanner::new(api.clone(), traits)
}

fn names(heads: &[discovery::DiscoveredHead]) -> Vec<String> {
    heads.iter().map(|h| h.head.name().to_string()).collect()
}

/// Discovers pull requests of both origins and tags; not a production trait.
#[derive(Debug)]
struct EverythingElse;

impl DiscoveryTrait for EverythingElse {
    fn decorate(&self, context: DiscoveryContext) -> DiscoveryContext {
        context.want_origin_prs(true).want_fork_prs(true).want_tags(true)
    }

    fn include_category(&self, category: HeadCategory) -> bool {
        !category.is_uncategorized()
    }
}

/// Test: strategy 1 builds branches that are not pull request sources
#[tokio::test]
async fn test_exclude_strategy_scan() {
    let api = seeded_api();
    let heads = scanner(
        &api,
        vec![Arc::new(BranchDiscoveryTrait::new(BranchStrategy::ExcludePullRequests))],
    )
    .scan(&widget())
    .await
    .unwrap();

    assert_eq!(names(&heads), vec!["main"]);
    assert!(heads[0].trusted);
    assert_eq!(heads[0].revision.as_ref().map(|r| r.hash.as_str()), Some("aaa"));
    assert_eq!(api.pull_request_calls(), 1);
}

/// Test: strategy 2 builds only branches that are origin pull request sources
#[tokio::test]
async fn test_only_strategy_scan() {
    let api = seeded_api();
    let heads = scanner(
        &api,
        vec![Arc::new(BranchDiscoveryTrait::new(BranchStrategy::OnlyPullRequests))],
    )
    .scan(&widget())
    .await
    .unwrap();

    // The fork PR from alice/widget:main does not make team/widget:main a PR branch.
    assert_eq!(names(&heads), vec!["feature"]);
}

/// Test: strategy 3 builds every branch without fetching pull requests
#[tokio::test]
async fn test_all_strategy_skips_pull_request_fetch() {
    let api = seeded_api();
    let heads = scanner(&api, vec![Arc::new(BranchDiscoveryTrait::new(BranchStrategy::All))])
        .scan(&widget())
        .await
        .unwrap();

    assert_eq!(names(&heads), vec!["main", "feature"]);
    assert!(heads.iter().all(|h| h.trusted));
    assert_eq!(api.pull_request_calls(), 0);
}

/// Test: strategy 0 discovers nothing
#[tokio::test]
async fn test_none_strategy_scan() {
    let api = seeded_api();
    let heads = scanner(&api, vec![Arc::new(BranchDiscoveryTrait::new(BranchStrategy::None))])
        .scan(&widget())
        .await
        .unwrap();
    assert!(heads.is_empty());
    assert_eq!(api.pull_request_calls(), 0);
}

/// Test: a failed pull request fetch keeps every branch
#[tokio::test]
async fn test_pull_request_failure_fails_open() {
    let api = seeded_api();
    api.fail_pull_requests();
    let heads = scanner(
        &api,
        vec![Arc::new(BranchDiscoveryTrait::new(BranchStrategy::OnlyPullRequests))],
    )
    .scan(&widget())
    .await
    .unwrap();

    assert_eq!(names(&heads), vec!["main", "feature"]);
    assert_eq!(api.pull_request_calls(), 1);
}

/// Test: pull request and tag heads are listed when a trait enables them
#[tokio::test]
async fn test_other_categories_and_trust() {
    let api = seeded_api();
    let heads = scanner(
        &api,
        vec![
            Arc::new(BranchDiscoveryTrait::new(BranchStrategy::All)),
            Arc::new(EverythingElse),
        ],
    )
    .scan(&widget())
    .await
    .unwrap();

    assert_eq!(names(&heads), vec!["main", "feature", "v1", "PR-1", "PR-2"]);
    let trusted: Vec<bool> = heads.iter().map(|h| h.trusted).collect();
    assert_eq!(trusted, vec![true, true, false, false, false]);
    match &heads[4].head {
        Head::PullRequest(pr) => assert_eq!(pr.source_owner.as_str(), "alice"),
        other => panic!("expected a pull request head, got {other:?}"),
    }
}

/// Test: SSH checkout swaps protocol and credential
#[test]
fn test_ssh_checkout_decoration() {
    let api = seeded_api();
    let api_credentials = CredentialsId::new("api-token");

    let plain = scanner(&api, vec![Arc::new(BranchDiscoveryTrait::new(BranchStrategy::All))])
        .checkout(&widget(), api_credentials.clone())
        .unwrap();
    assert_eq!(plain.protocol, RepositoryProtocol::Http);
    assert_eq!(plain.credentials_id, api_credentials);

    let ssh = scanner(&api, vec![Arc::new(SshCheckoutTrait::new(Some("deploy-key")))])
        .checkout(&widget(), api_credentials.clone())
        .unwrap();
    assert_eq!(ssh.remote, "git@bitbucket.org:team/widget.git");
    assert_eq!(ssh.credentials_id, CredentialsId::new("deploy-key"));

    let agent_default = scanner(&api, vec![Arc::new(SshCheckoutTrait::new(Some("ANONYMOUS")))])
        .checkout(&widget(), api_credentials)
        .unwrap();
    assert_eq!(agent_default.protocol, RepositoryProtocol::Ssh);
    assert_eq!(agent_default.credentials_id, None);
}

/// Test: SSH checkout of a repository without an SSH link fails
#[test]
fn test_ssh_checkout_without_link() {
    let api = seeded_api();
    let bare = Repository::from_full_name("team/bare").unwrap();
    let result = scanner(&api, vec![Arc::new(SshCheckoutTrait::new(None))]).checkout(&bare, None);
    assert!(matches!(result, Err(DiscoveryError::NoCloneLink { .. })));
}
