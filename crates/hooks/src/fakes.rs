//! Recording implementations of the outbound ports, for tests and dry runs.

use std::sync::Mutex;
use std::time::Duration;

use scm::{MirrorId, OwnerName, RepositoryName};

use crate::{EventNotifier, HeadEvent, ReindexRequest, ReindexTrigger};

/// Remembers every notification instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(HeadEvent, Duration)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notified events with their delays, in notification order.
    pub fn events(&self) -> Vec<(HeadEvent, Duration)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventNotifier for RecordingNotifier {
    fn notify(&self, event: HeadEvent, delay: Duration) {
        if let Ok(mut events) = self.events.lock() {
            events.push((event, delay));
        }
    }
}

/// Remembers every re-index request instead of scheduling a scan.
#[derive(Debug, Default)]
pub struct RecordingReindexer {
    requests: Mutex<Vec<ReindexRequest>>,
}

impl RecordingReindexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ReindexRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ReindexTrigger for RecordingReindexer {
    fn reindex(&self, owner: &OwnerName, repository: &RepositoryName, mirror_id: Option<&MirrorId>) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(ReindexRequest::new(owner, repository, mirror_id));
        }
    }
}
