//! One webhook delivery as received by the HTTP front end.

use std::collections::HashMap;

use hooks::HookEventType;
use scm::BitbucketType;

use crate::ListenerError;

pub const EVENT_KEY_HEADER: &str = "X-Event-Key";
pub const BITBUCKET_TYPE_HEADER: &str = "X-Bitbucket-Type";

/// Headers, body and sender details of one delivery.
#[derive(Debug, Clone, Default)]
pub struct WebhookDelivery {
    headers: HashMap<String, String>,
    pub body: Option<String>,
    /// Base URL of the sending instance; required for Server events.
    pub server_url: Option<String>,
    /// Free-form sender description, usually the remote address.
    pub origin: String,
}

impl WebhookDelivery {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Adds a header. Names are case-insensitive.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = Some(server_url.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The event kind named by `X-Event-Key`.
    pub fn event_kind(&self) -> Result<HookEventType, ListenerError> {
        let key = self
            .header(EVENT_KEY_HEADER)
            .ok_or(ListenerError::MissingEventKey)?;
        HookEventType::from_event_key(key).ok_or_else(|| ListenerError::UnknownEventKey(key.to_string()))
    }

    /// Server when the kind only exists on Server or the sender says so;
    /// Cloud otherwise.
    pub fn instance_type(&self, kind: HookEventType) -> BitbucketType {
        let declared_server = self
            .header(BITBUCKET_TYPE_HEADER)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("server"));
        if kind.is_native_server() || declared_server {
            BitbucketType::Server
        } else {
            BitbucketType::Cloud
        }
    }
}
