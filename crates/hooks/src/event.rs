//! Canonical head events and their matching rules.
//!
//! A [`HeadEvent`] is what the push processors emit: one per canonical
//! [`EventType`] present in a delivery. Whoever receives it asks each
//! registered navigator and source whether the event applies to it, and for a
//! matching source which heads it affects. Both questions are answered purely
//! from the event; nothing is fetched from the provider.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use scm::{
    is_cloud_url, BitbucketType, Change, CommitHash, DeliveryId, EventType, Head, MirrorId,
    RefType, Repository, Revision, ServerUrl, Timestamp,
};

/// A navigator registered with the scan framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScmNavigator {
    /// A Bitbucket organisation folder: every repository of one owner.
    Bitbucket {
        server_url: String,
        repo_owner: String,
    },
    /// A navigator of some other backend (e.g. a different hosting provider).
    Other { backend: String },
}

/// A single-repository source registered with the scan framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScmSource {
    Bitbucket {
        server_url: String,
        repo_owner: String,
        repository: String,
    },
    Other { backend: String },
}

/// A push, normalised: one canonical event type plus the changes of that type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadEvent {
    pub delivery_id: DeliveryId,
    pub server_url: ServerUrl,
    pub instance_type: BitbucketType,
    pub event_type: EventType,
    pub changes: Vec<Change>,
    /// Free-form description of where the delivery came from (e.g. remote address).
    pub origin: String,
    pub repository: Repository,
    pub head_commit: Option<CommitHash>,
    pub mirror_id: Option<MirrorId>,
    pub received_at: Timestamp,
}

impl HeadEvent {
    /// Name of the source this event concerns: the repository name.
    pub fn source_name(&self) -> &str {
        self.repository.name().as_str()
    }

    /// Returns `true` if this event should be delivered to `navigator`.
    ///
    /// The backend and server URL must match, and the navigator's owner must
    /// equal the repository owner ignoring case.
    pub fn is_match_navigator(&self, navigator: &ScmNavigator) -> bool {
        match navigator {
            ScmNavigator::Bitbucket {
                server_url,
                repo_owner,
            } => {
                self.is_server_url_match(server_url)
                    && self.repository.owner().eq_ignore_case(repo_owner)
            }
            ScmNavigator::Other { .. } => false,
        }
    }

    /// Returns `true` if this event concerns the repository backing `source`.
    pub fn is_match_source(&self, source: &ScmSource) -> bool {
        match source {
            ScmSource::Bitbucket {
                server_url,
                repo_owner,
                repository,
            } => {
                self.is_server_url_match(server_url)
                    && self.repository.owner().eq_ignore_case(repo_owner)
                    && self.repository.name().eq_ignore_case(repository)
            }
            ScmSource::Other { .. } => false,
        }
    }

    /// Heads of `source` affected by this event and the revision each now
    /// resolves to. Removed refs map to `None`.
    ///
    /// Empty when `source` does not match.
    pub fn heads(&self, source: &ScmSource) -> BTreeMap<Head, Option<Revision>> {
        if !self.is_match_source(source) {
            return BTreeMap::new();
        }

        self.changes
            .iter()
            .map(|change| {
                let head = match change.ref_type {
                    RefType::Branch => Head::branch(change.ref_name.clone()),
                    RefType::Tag => Head::tag(change.ref_name.clone()),
                };
                let revision = match self.event_type {
                    EventType::Removed => None,
                    EventType::Created | EventType::Updated => change
                        .to_hash
                        .clone()
                        .map(|hash| Revision { hash }),
                };
                (head, revision)
            })
            .collect()
    }

    /// Cloud events only match Cloud URLs. Server events never match Cloud
    /// URLs and otherwise require exact equality.
    fn is_server_url_match(&self, server_url: &str) -> bool {
        match self.instance_type {
            BitbucketType::Cloud => is_cloud_url(server_url),
            BitbucketType::Server => {
                !is_cloud_url(server_url) && server_url == self.server_url.as_str()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scm::{ChangeType, RefName};

    const SERVER: &str = "https://bitbucket.example.com";

    fn change(ref_type: RefType, name: &str, to: Option<&str>) -> Change {
        Change {
            ref_type,
            ref_name: RefName::new(name).unwrap(),
            change_type: ChangeType::Update,
            from_hash: None,
            to_hash: to.and_then(CommitHash::new),
        }
    }

    fn server_event(event_type: EventType, changes: Vec<Change>) -> HeadEvent {
        HeadEvent {
            delivery_id: DeliveryId::new_random(),
            server_url: ServerUrl::new(SERVER).unwrap(),
            instance_type: BitbucketType::Server,
            event_type,
            changes,
            origin: "10.0.0.1".into(),
            repository: Repository::from_full_name("PRJ/widget").unwrap(),
            head_commit: None,
            mirror_id: None,
            received_at: Timestamp::now(),
        }
    }

    fn source(url: &str, owner: &str, repo: &str) -> ScmSource {
        ScmSource::Bitbucket {
            server_url: url.into(),
            repo_owner: owner.into(),
            repository: repo.into(),
        }
    }

    #[test]
    fn navigator_match_requires_backend_url_and_owner() {
        let event = server_event(EventType::Updated, vec![]);
        let nav = |url: &str, owner: &str| ScmNavigator::Bitbucket {
            server_url: url.into(),
            repo_owner: owner.into(),
        };
        assert!(event.is_match_navigator(&nav(SERVER, "prj")));
        assert!(!event.is_match_navigator(&nav("https://other.example.com", "PRJ")));
        assert!(!event.is_match_navigator(&nav("https://bitbucket.org", "PRJ")));
        assert!(!event.is_match_navigator(&nav(SERVER, "OTHER")));
        assert!(!event.is_match_navigator(&ScmNavigator::Other {
            backend: "github".into()
        }));
    }

    #[test]
    fn cloud_events_match_only_cloud_urls() {
        let mut event = server_event(EventType::Updated, vec![]);
        event.instance_type = BitbucketType::Cloud;
        event.server_url = ServerUrl::new(scm::CLOUD_SERVER_URL).unwrap();
        assert!(event.is_match_source(&source("https://bitbucket.org/", "prj", "WIDGET")));
        assert!(!event.is_match_source(&source(SERVER, "PRJ", "widget")));
    }

    #[test]
    fn heads_are_computed_from_changes_only() {
        let event = server_event(
            EventType::Updated,
            vec![
                change(RefType::Branch, "main", Some("abc")),
                change(RefType::Tag, "v1", Some("def")),
            ],
        );
        let heads = event.heads(&source(SERVER, "PRJ", "widget"));
        assert_eq!(heads.len(), 2);
        assert_eq!(
            heads.get(&Head::branch(RefName::new("main").unwrap())),
            Some(&Some(Revision {
                hash: CommitHash::new("abc").unwrap()
            }))
        );
        assert!(heads.contains_key(&Head::tag(RefName::new("v1").unwrap())));
    }

    #[test]
    fn removed_heads_have_no_revision_and_unmatched_sources_get_nothing() {
        let event = server_event(
            EventType::Removed,
            vec![change(RefType::Branch, "stale", Some("abc"))],
        );
        let heads = event.heads(&source(SERVER, "PRJ", "widget"));
        assert_eq!(heads.values().next(), Some(&None));
        assert!(event.heads(&source(SERVER, "PRJ", "gadget")).is_empty());
        assert!(event
            .heads(&ScmSource::Other {
                backend: "git".into()
            })
            .is_empty());
    }
}
