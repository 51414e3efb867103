//! Bitbucket webhook transport adapter.
//!
//! Sits between an HTTP front end and the [`hooks`] processors:
//!
//! - [`WebhookDelivery`] carries headers, body and sender details; the event
//!   kind comes from `X-Event-Key` and the instance type from the kind or an
//!   explicit `X-Bitbucket-Type: server` header.
//! - [`HookListener`] acknowledges every delivery and hands push events to a
//!   [`hooks::HookProcessor`].
//! - [`DelayedNotifier`] and [`ChannelReindexer`] implement the outbound
//!   ports on tokio channels.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** No normalisation or matching happens here.

pub mod delivery;
pub mod errors;
pub mod listener;
pub mod notifier;

pub use delivery::{WebhookDelivery, BITBUCKET_TYPE_HEADER, EVENT_KEY_HEADER};
pub use errors::ListenerError;
pub use listener::{Acknowledgement, HookListener};
pub use notifier::{ChannelReindexer, DelayedNotifier};
