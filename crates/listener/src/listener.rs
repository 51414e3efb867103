//! Hands webhook deliveries to the hook processors.

use std::sync::Arc;

use tracing::{debug, warn};

use hooks::{HookEventType, HookProcessor};

use crate::{ListenerError, WebhookDelivery};

/// What the transport should answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Handed to a processor.
    Processed(HookEventType),
    /// A webhook test ping; nothing to do.
    Ping,
    /// Not a hook event this listener handles.
    Ignored,
}

/// Maps deliveries onto [`HookProcessor::process`].
///
/// Every delivery is acknowledged; failures are logged here or by the
/// processor and never reach the provider.
#[derive(Clone)]
pub struct HookListener {
    processor: Arc<dyn HookProcessor>,
}

impl HookListener {
    pub fn new(processor: Arc<dyn HookProcessor>) -> Self {
        Self { processor }
    }

    pub fn receive(&self, delivery: &WebhookDelivery) -> Acknowledgement {
        let kind = match delivery.event_kind() {
            Ok(kind) => kind,
            Err(ListenerError::UnknownEventKey(event_key)) => {
                warn!(
                    event_key = %event_key,
                    origin = %delivery.origin,
                    "Unsupported hook event; ignoring webhook delivery"
                );
                return Acknowledgement::Ignored;
            }
            Err(err) => {
                warn!(origin = %delivery.origin, error = %err, "Ignoring webhook delivery");
                return Acknowledgement::Ignored;
            }
        };

        if kind == HookEventType::ServerPing {
            debug!(origin = %delivery.origin, "Webhook ping");
            return Acknowledgement::Ping;
        }

        self.processor.process(
            kind,
            delivery.body.as_deref(),
            delivery.instance_type(kind),
            &delivery.origin,
            delivery.server_url.as_deref(),
        );
        Acknowledgement::Processed(kind)
    }
}
