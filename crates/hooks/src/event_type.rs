//! Webhook event kinds understood by the hook processors.

use serde::{Deserialize, Serialize};

/// Closed set of webhook event kinds, keyed by Bitbucket's `X-Event-Key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEventType {
    /// Bitbucket Cloud `repo:push`.
    Push,
    /// Bitbucket Server `repo:refs_changed`.
    ServerRefsChanged,
    /// Bitbucket Server `mirror:repo_synchronized`, sent by a mirror farm.
    ServerMirrorRepoSynchronized,
    /// Bitbucket Server `diagnostics:ping`, sent when testing a webhook.
    ServerPing,
}

impl HookEventType {
    const ALL: [HookEventType; 4] = [
        Self::Push,
        Self::ServerRefsChanged,
        Self::ServerMirrorRepoSynchronized,
        Self::ServerPing,
    ];

    /// The provider's event key.
    pub fn event_key(self) -> &'static str {
        match self {
            Self::Push => "repo:push",
            Self::ServerRefsChanged => "repo:refs_changed",
            Self::ServerMirrorRepoSynchronized => "mirror:repo_synchronized",
            Self::ServerPing => "diagnostics:ping",
        }
    }

    /// Looks up a kind by its `X-Event-Key` value.
    pub fn from_event_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.event_key() == key.trim())
    }

    /// Returns `true` for kinds only Bitbucket Server emits.
    pub fn is_native_server(self) -> bool {
        !matches!(self, Self::Push)
    }
}

impl std::fmt::Display for HookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_key())
    }
}
