//! Push hook processors.
//!
//! The webhook transport hands every delivery to a [`HookProcessor`]. A
//! processor decodes the payload, then either triggers a full re-index (when
//! the provider did not enumerate enough changes) or emits one [`HeadEvent`]
//! per canonical event type found in the change list.
//!
//! Processing never fails from the transport's point of view: malformed
//! payloads and unsupported event kinds are logged and dropped, because an
//! error response would make the provider retry and alert.

use std::sync::Arc;

use tracing::{debug, error, info, info_span};

use scm::{
    BitbucketType, Change, CommitHash, DeliveryId, MirrorId, Repository, ServerUrl, Timestamp,
    CLOUD_SERVER_URL,
};

use crate::config::SCAN_ON_EMPTY_CHANGES_ENV;
use crate::payload::{parse_event, ParsedEvent};
use crate::{group_changes, EventNotifier, HeadEvent, HookConfig, HookError, HookEventType, ReindexTrigger};

/// Entry point invoked by the webhook transport for every delivery.
pub trait HookProcessor: Send + Sync {
    /// Processes one delivery. Never reports failure to the caller.
    ///
    /// * `payload` - raw body; `None` or blank bodies are ignored.
    /// * `origin` - free-form description of the sender, copied onto events.
    /// * `server_url` - base URL of the sending instance, when known.
    fn process(
        &self,
        kind: HookEventType,
        payload: Option<&str>,
        instance_type: BitbucketType,
        origin: &str,
        server_url: Option<&str>,
    );
}

/// What a parsed delivery asks the emitter to do.
enum Outcome {
    Emit(PushData),
    Reindexed,
}

struct PushData {
    repository: Repository,
    changes: Vec<Change>,
    head_commit: Option<CommitHash>,
    mirror_id: Option<MirrorId>,
}

/// Shared tail of every push processor: empty-change policy, grouping and
/// notification.
#[derive(Clone)]
struct Emitter {
    notifier: Arc<dyn EventNotifier>,
    reindexer: Arc<dyn ReindexTrigger>,
    config: HookConfig,
}

struct Delivery<'a> {
    id: DeliveryId,
    kind: HookEventType,
    instance_type: BitbucketType,
    origin: &'a str,
    server_url: ServerUrl,
}

impl Emitter {
    fn reindex(&self, repository: &Repository, mirror_id: Option<&MirrorId>) {
        self.reindexer.reindex(repository.owner(), repository.name(), mirror_id);
    }

    /// Mirror syncs that exceeded the provider's ref limit carry no usable
    /// change list and are turned into a re-index straight away.
    fn outcome(&self, event: ParsedEvent) -> Outcome {
        match event {
            ParsedEvent::RefsChanged(event) => Outcome::Emit(PushData {
                repository: event.repository,
                changes: event.changes,
                head_commit: event.to_commit,
                mirror_id: None,
            }),
            ParsedEvent::MirrorSynchronized(event) if event.ref_limit_exceeded => {
                info!(
                    owner = %event.repository.owner(),
                    repository = %event.repository.name(),
                    mirror_id = %event.mirror_id,
                    "Received mirror synchronized event with refLimitExceeded from Bitbucket; \
                     indexing the repository"
                );
                self.reindex(&event.repository, Some(&event.mirror_id));
                Outcome::Reindexed
            }
            ParsedEvent::MirrorSynchronized(event) => Outcome::Emit(PushData {
                repository: event.repository,
                changes: event.changes,
                head_commit: None,
                mirror_id: Some(event.mirror_id),
            }),
        }
    }

    fn handle(&self, delivery: &Delivery<'_>, result: Result<Outcome, HookError>) {
        match result {
            Ok(Outcome::Emit(data)) => self.emit(delivery, data),
            Ok(Outcome::Reindexed) => {}
            Err(err @ HookError::UnsupportedEvent { .. }) => {
                error!(event_kind = %delivery.kind, error = %err, "Unsupported hook event");
            }
            Err(HookError::Payload(err)) => {
                error!(event_kind = %delivery.kind, error = %err, "Can not read hook payload");
            }
        }
    }

    fn emit(&self, delivery: &Delivery<'_>, data: PushData) {
        let owner = data.repository.owner().clone();
        let repository_name = data.repository.name().clone();

        if data.changes.is_empty() {
            if self.config.scan_on_empty_changes {
                info!(
                    owner = %owner,
                    repository = %repository_name,
                    event_kind = %delivery.kind,
                    "Received push hook with empty changes from Bitbucket; indexing the repository. \
                     Set {SCAN_ON_EMPTY_CHANGES_ENV}=false to skip this scan"
                );
                self.reindex(&data.repository, data.mirror_id.as_ref());
            } else {
                info!(
                    owner = %owner,
                    repository = %repository_name,
                    event_kind = %delivery.kind,
                    "Received push hook with empty changes from Bitbucket; skipping"
                );
            }
            return;
        }

        for (event_type, changes) in group_changes(data.changes).into_groups() {
            debug!(
                owner = %owner,
                repository = %repository_name,
                event_type = %event_type,
                changes = changes.len(),
                "Emitting head event"
            );
            let event = HeadEvent {
                delivery_id: delivery.id,
                server_url: delivery.server_url.clone(),
                instance_type: delivery.instance_type,
                event_type,
                changes,
                origin: delivery.origin.to_string(),
                repository: data.repository.clone(),
                head_commit: data.head_commit.clone(),
                mirror_id: data.mirror_id.clone(),
                received_at: Timestamp::now(),
            };
            self.notifier.notify(event, self.config.event_delay);
        }
    }
}

fn non_blank(payload: Option<&str>) -> Option<&str> {
    payload.filter(|p| !p.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Bitbucket Server native events
// ---------------------------------------------------------------------------

/// Handles Bitbucket Server `repo:refs_changed` and `mirror:repo_synchronized`.
#[derive(Clone)]
pub struct NativeServerPushProcessor {
    emitter: Emitter,
}

impl NativeServerPushProcessor {
    pub fn new(
        notifier: Arc<dyn EventNotifier>,
        reindexer: Arc<dyn ReindexTrigger>,
        config: HookConfig,
    ) -> Self {
        Self {
            emitter: Emitter {
                notifier,
                reindexer,
                config,
            },
        }
    }

    fn parse(&self, kind: HookEventType, payload: &str) -> Result<Outcome, HookError> {
        match kind {
            HookEventType::ServerRefsChanged | HookEventType::ServerMirrorRepoSynchronized => {
                Ok(self.emitter.outcome(parse_event(kind, payload)?))
            }
            HookEventType::Push | HookEventType::ServerPing => Err(HookError::UnsupportedEvent {
                kind,
                processor: "native server push",
            }),
        }
    }
}

impl HookProcessor for NativeServerPushProcessor {
    fn process(
        &self,
        kind: HookEventType,
        payload: Option<&str>,
        instance_type: BitbucketType,
        origin: &str,
        server_url: Option<&str>,
    ) {
        let Some(payload) = non_blank(payload) else {
            return;
        };
        // Without a server URL the event could never match a navigator or source.
        let Some(server_url) = server_url.and_then(ServerUrl::new) else {
            debug!(event_kind = %kind, "Ignoring native server hook without a server URL");
            return;
        };

        let delivery = Delivery {
            id: DeliveryId::new_random(),
            kind,
            instance_type,
            origin,
            server_url,
        };
        let span = info_span!(
            "hook.process",
            delivery_id = %delivery.id,
            event_kind = %kind,
            instance_type = %instance_type,
            origin = origin
        );
        let _entered = span.enter();

        self.emitter.handle(&delivery, self.parse(kind, payload));
    }
}

// ---------------------------------------------------------------------------
// Bitbucket Cloud push events
// ---------------------------------------------------------------------------

/// Handles Bitbucket Cloud `repo:push`.
#[derive(Clone)]
pub struct CloudPushProcessor {
    emitter: Emitter,
}

impl CloudPushProcessor {
    pub fn new(
        notifier: Arc<dyn EventNotifier>,
        reindexer: Arc<dyn ReindexTrigger>,
        config: HookConfig,
    ) -> Self {
        Self {
            emitter: Emitter {
                notifier,
                reindexer,
                config,
            },
        }
    }

    fn parse(&self, kind: HookEventType, payload: &str) -> Result<Outcome, HookError> {
        if kind != HookEventType::Push {
            return Err(HookError::UnsupportedEvent {
                kind,
                processor: "cloud push",
            });
        }
        Ok(self.emitter.outcome(parse_event(kind, payload)?))
    }
}

impl HookProcessor for CloudPushProcessor {
    fn process(
        &self,
        kind: HookEventType,
        payload: Option<&str>,
        instance_type: BitbucketType,
        origin: &str,
        server_url: Option<&str>,
    ) {
        let Some(payload) = non_blank(payload) else {
            return;
        };
        let server_url = match instance_type {
            BitbucketType::Cloud => ServerUrl::new(CLOUD_SERVER_URL),
            BitbucketType::Server => server_url.and_then(ServerUrl::new),
        };
        let Some(server_url) = server_url else {
            debug!(event_kind = %kind, "Ignoring server push hook without a server URL");
            return;
        };

        let delivery = Delivery {
            id: DeliveryId::new_random(),
            kind,
            instance_type,
            origin,
            server_url,
        };
        let span = info_span!(
            "hook.process",
            delivery_id = %delivery.id,
            event_kind = %kind,
            instance_type = %instance_type,
            origin = origin
        );
        let _entered = span.enter();

        self.emitter.handle(&delivery, self.parse(kind, payload));
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Routes each event kind to the processor that understands its wire format.
#[derive(Clone)]
pub struct HookDispatcher {
    server: NativeServerPushProcessor,
    cloud: CloudPushProcessor,
}

impl HookDispatcher {
    pub fn new(
        notifier: Arc<dyn EventNotifier>,
        reindexer: Arc<dyn ReindexTrigger>,
        config: HookConfig,
    ) -> Self {
        Self {
            server: NativeServerPushProcessor::new(notifier.clone(), reindexer.clone(), config.clone()),
            cloud: CloudPushProcessor::new(notifier, reindexer, config),
        }
    }
}

impl HookProcessor for HookDispatcher {
    fn process(
        &self,
        kind: HookEventType,
        payload: Option<&str>,
        instance_type: BitbucketType,
        origin: &str,
        server_url: Option<&str>,
    ) {
        match kind {
            HookEventType::Push => self.cloud.process(kind, payload, instance_type, origin, server_url),
            HookEventType::ServerRefsChanged | HookEventType::ServerMirrorRepoSynchronized => {
                self.server.process(kind, payload, instance_type, origin, server_url)
            }
            HookEventType::ServerPing => {
                debug!(origin = origin, "Received Bitbucket Server webhook ping");
            }
        }
    }
}
