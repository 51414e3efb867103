//! Channel-backed implementations of the hook ports.
//!
//! Head events and re-index requests leave the listener on unbounded `mpsc`
//! channels; whatever drains them (scan scheduler, event bus) lives outside.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use hooks::{EventNotifier, HeadEvent, ReindexRequest, ReindexTrigger};
use scm::{MirrorId, OwnerName, RepositoryName};

use crate::ListenerError;

/// Forwards each event after its delay, without blocking the caller.
#[derive(Debug, Clone)]
pub struct DelayedNotifier {
    runtime: Handle,
    sender: UnboundedSender<HeadEvent>,
}

impl DelayedNotifier {
    /// Creates a notifier bound to the current tokio runtime, together with
    /// the receiving end of its channel.
    pub fn channel() -> Result<(Self, UnboundedReceiver<HeadEvent>), ListenerError> {
        let runtime = Handle::try_current().map_err(|_| ListenerError::NoRuntime)?;
        let (sender, receiver) = unbounded_channel();
        Ok((Self { runtime, sender }, receiver))
    }
}

impl EventNotifier for DelayedNotifier {
    fn notify(&self, event: HeadEvent, delay: Duration) {
        debug!(
            delivery_id = %event.delivery_id,
            event_type = %event.event_type,
            delay_secs = delay.as_secs(),
            "Scheduling head event"
        );
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if sender.send(event).is_err() {
                warn!("Head event receiver is gone; dropping event");
            }
        });
    }
}

/// Queues re-index requests for the scan scheduler.
#[derive(Debug, Clone)]
pub struct ChannelReindexer {
    sender: UnboundedSender<ReindexRequest>,
}

impl ChannelReindexer {
    pub fn channel() -> (Self, UnboundedReceiver<ReindexRequest>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ReindexTrigger for ChannelReindexer {
    fn reindex(&self, owner: &OwnerName, repository: &RepositoryName, mirror_id: Option<&MirrorId>) {
        info!(
            owner = %owner,
            repository = %repository,
            mirror_id = mirror_id.map(MirrorId::as_str),
            "Re-index requested"
        );
        if self
            .sender
            .send(ReindexRequest::new(owner, repository, mirror_id))
            .is_err()
        {
            warn!(owner = %owner, repository = %repository, "Re-index receiver is gone; dropping request");
        }
    }
}
