//! Reconciliation of listed repositories against registered sources.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use navigator::{visit_repositories, NavigatorRequest, RegisteredSources};
use scm::fakes::MemoryBitbucketApi;
use scm::{OwnerName, Repository, RepositoryName};

fn repo(owner: &str, name: &str) -> Repository {
    Repository::from_full_name(&format!("{owner}/{name}")).unwrap()
}

fn registered(names: &[&str]) -> Arc<RegisteredSources> {
    Arc::new(RegisteredSources::new(
        names.iter().filter_map(|n| RepositoryName::new(*n)),
    ))
}

fn names(repositories: &[Repository]) -> Vec<String> {
    repositories.iter().map(|r| r.name().to_string()).collect()
}

/// Test: visiting an owner lists new repositories before registered ones
#[tokio::test]
async fn test_visit_orders_new_before_existing() {
    let api = MemoryBitbucketApi::new();
    for name in ["delta", "alpha", "charlie", "bravo"] {
        api.add_repository(repo("Team", name));
    }
    api.add_repository(repo("other", "zulu"));

    let mut request = NavigatorRequest::new(registered(&["alpha", "charlie"]));
    let visited = visit_repositories(&api, &OwnerName::new("team").unwrap(), &mut request)
        .await
        .unwrap();

    assert_eq!(names(&visited), vec!["bravo", "delta", "alpha", "charlie"]);
    assert!(request.repository("zulu").is_none());
    assert_eq!(request.repository("alpha").map(|r| r.full_name()), Some("Team/alpha".into()));
}

/// Test: an owner with no repositories yields nothing
#[tokio::test]
async fn test_visit_unknown_owner() {
    let api = MemoryBitbucketApi::new();
    let mut request = NavigatorRequest::new(registered(&["alpha"]));
    let visited = visit_repositories(&api, &OwnerName::new("nobody").unwrap(), &mut request)
        .await
        .unwrap();
    assert!(visited.is_empty());
    assert!(request.is_empty());
}

/// Test: each refresh starts from a clean map
#[tokio::test]
async fn test_refresh_drops_stale_repositories() {
    let api = MemoryBitbucketApi::new();
    let mut request = NavigatorRequest::new(registered(&[]));
    request.with_repositories([repo("team", "stale")]);

    api.add_repository(repo("team", "fresh"));
    let visited = visit_repositories(&api, &OwnerName::new("team").unwrap(), &mut request)
        .await
        .unwrap();
    assert_eq!(names(&visited), vec!["fresh"]);
    assert!(request.repository("stale").is_none());
}

proptest! {
    #[test]
    fn repositories_are_unique_complete_and_idempotent(
        listed in prop::collection::vec("[a-e]{1,2}", 0..20),
        known in prop::collection::vec("[a-e]{1,2}", 0..10),
    ) {
        let known_refs: Vec<&str> = known.iter().map(String::as_str).collect();
        let mut request = NavigatorRequest::new(registered(&known_refs));
        request.with_repositories(listed.iter().map(|n| repo("team", n)));

        let first = request.repositories();
        let second = request.repositories();
        prop_assert_eq!(&first, &second);

        let first_names = names(&first);
        let unique: HashSet<&String> = first_names.iter().collect();
        prop_assert_eq!(unique.len(), first_names.len());

        let listed_unique: HashSet<&String> = listed.iter().collect();
        prop_assert_eq!(unique.len(), listed_unique.len());

        let known_set: HashSet<&str> = known_refs.iter().copied().collect();
        let first_existing = first_names
            .iter()
            .position(|n| known_set.contains(n.as_str()))
            .unwrap_or(first_names.len());
        prop_assert!(first_names[first_existing..]
            .iter()
            .all(|n| known_set.contains(n.as_str())));
    }
}
