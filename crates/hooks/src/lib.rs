//! Bitbucket webhook normalisation.
//!
//! Turns provider-specific push payloads (Bitbucket Cloud `repo:push`,
//! Bitbucket Server `repo:refs_changed` and `mirror:repo_synchronized`) into
//! canonical [`HeadEvent`]s, one per [`scm::EventType`] present in the
//! delivery, or into a full re-index when the provider did not say enough.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** Notification delivery and scan
//! scheduling are external collaborators reached through [`EventNotifier`]
//! and [`ReindexTrigger`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`event_type`] | [`HookEventType`], keyed by `X-Event-Key` |
//! | [`payload`] | Per-kind parsers producing typed event records |
//! | [`grouping`] | Partitioning of changes by canonical event type |
//! | [`processor`] | [`HookProcessor`] implementations and routing |
//! | [`event`] | [`HeadEvent`] and navigator/source matching |
//! | [`ports`] | Outbound notify / re-index ports |
//! | [`config`] | [`HookConfig`] |
//! | [`fakes`] | Recording port implementations |

pub mod config;
pub mod errors;
pub mod event;
pub mod event_type;
pub mod fakes;
pub mod grouping;
pub mod payload;
pub mod ports;
pub mod processor;

pub use config::HookConfig;
pub use errors::{ConfigError, HookError};
pub use event::{HeadEvent, ScmNavigator, ScmSource};
pub use event_type::HookEventType;
pub use grouping::{group_changes, ChangeGroups};
pub use payload::{parse_event, MirrorSynchronizedEvent, ParsedEvent, RefsChangedEvent};
pub use ports::{EventNotifier, ReindexRequest, ReindexTrigger};
pub use processor::{CloudPushProcessor, HookDispatcher, HookProcessor, NativeServerPushProcessor};
