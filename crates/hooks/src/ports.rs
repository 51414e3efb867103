//! Outbound ports of the hook processors.
//!
//! Both collaborators are fire-and-forget: the processors never wait for a
//! scan or a notification to complete.

use std::time::Duration;

use serde::Serialize;

use scm::{MirrorId, OwnerName, RepositoryName};

use crate::HeadEvent;

/// Delivers canonical head events to whatever ultimately runs matching
/// navigators and sources.
pub trait EventNotifier: Send + Sync {
    /// Hands `event` over, to fire after `delay` has elapsed.
    fn notify(&self, event: HeadEvent, delay: Duration);
}

/// Schedules a full re-index of one repository.
pub trait ReindexTrigger: Send + Sync {
    /// Re-enumerates every ref of `owner/repository`, optionally scoped to
    /// the mirror that reported the change.
    fn reindex(&self, owner: &OwnerName, repository: &RepositoryName, mirror_id: Option<&MirrorId>);
}

/// A re-index request as handed to [`ReindexTrigger`], in owned form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexRequest {
    pub owner: OwnerName,
    pub repository: RepositoryName,
    pub mirror_id: Option<MirrorId>,
}

impl ReindexRequest {
    pub fn new(owner: &OwnerName, repository: &RepositoryName, mirror_id: Option<&MirrorId>) -> Self {
        Self {
            owner: owner.clone(),
            repository: repository.clone(),
            mirror_id: mirror_id.cloned(),
        }
    }
}
