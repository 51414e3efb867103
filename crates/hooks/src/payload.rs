//! Parsers for push-style webhook payloads.
//!
//! Each parser takes the raw JSON body of one event kind and produces a typed
//! event record whose repository and changes are already normalised into
//! domain values. Cloud and Server disagree on almost every field name; after
//! this module nothing downstream can tell them apart.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use scm::wire::{commit_hash, CloudRepository, ServerRepository};
use scm::{Change, ChangeType, CommitHash, MirrorId, PayloadError, RefName, RefType, Repository};

use crate::{HookError, HookEventType};

const REFS_CHANGED: &str = "repo:refs_changed";
const MIRROR_SYNCHRONIZED: &str = "mirror:repo_synchronized";
const CLOUD_PUSH: &str = "repo:push";

/// Refs of a repository moved (server push or Cloud push).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefsChangedEvent {
    pub repository: Repository,
    pub changes: Vec<Change>,
    /// Commit the push ended on, when the provider reports one.
    pub to_commit: Option<CommitHash>,
}

/// A mirror finished synchronising a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSynchronizedEvent {
    pub repository: Repository,
    pub changes: Vec<Change>,
    pub mirror_id: MirrorId,
    /// Set instead of enumerating changes when the change set was too large
    /// for the provider to include. Distinct from an empty `changes` list.
    pub ref_limit_exceeded: bool,
}

/// Any push-style event, normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    RefsChanged(RefsChangedEvent),
    MirrorSynchronized(MirrorSynchronizedEvent),
}

impl ParsedEvent {
    pub fn repository(&self) -> &Repository {
        match self {
            Self::RefsChanged(e) => &e.repository,
            Self::MirrorSynchronized(e) => &e.repository,
        }
    }
}

/// Parses `payload` with the parser registered for `kind`.
///
/// Kinds that carry no push data have no parser and are reported as
/// [`HookError::UnsupportedEvent`].
pub fn parse_event(kind: HookEventType, payload: &str) -> Result<ParsedEvent, HookError> {
    let event = match kind {
        HookEventType::Push => ParsedEvent::RefsChanged(parse_cloud_push(payload)?),
        HookEventType::ServerRefsChanged => {
            ParsedEvent::RefsChanged(parse_server_refs_changed(payload)?)
        }
        HookEventType::ServerMirrorRepoSynchronized => {
            ParsedEvent::MirrorSynchronized(parse_server_mirror_synchronized(payload)?)
        }
        HookEventType::ServerPing => {
            return Err(HookError::UnsupportedEvent {
                kind,
                processor: "payload parser",
            })
        }
    };
    Ok(event)
}

fn decode<'de, T: Deserialize<'de>>(kind: &'static str, payload: &'de str) -> Result<T, PayloadError> {
    serde_json::from_str(payload).map_err(|source| PayloadError::Malformed { kind, source })
}

// ---------------------------------------------------------------------------
// Bitbucket Server
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeRef {
    #[serde(default)]
    id: String,
    #[serde(default)]
    display_id: String,
    #[serde(rename = "type", default)]
    ref_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeChange {
    #[serde(rename = "ref")]
    git_ref: NativeRef,
    from_hash: Option<String>,
    to_hash: Option<String>,
    #[serde(rename = "type")]
    change_type: ChangeType,
}

impl NativeChange {
    fn into_change(self, kind: &'static str) -> Result<Change, PayloadError> {
        let NativeRef {
            id,
            display_id,
            ref_type,
        } = self.git_ref;

        let is_tag = ref_type.eq_ignore_ascii_case("TAG") || id.starts_with("refs/tags/");
        let name = if display_id.is_empty() {
            id.strip_prefix("refs/heads/")
                .or_else(|| id.strip_prefix("refs/tags/"))
                .unwrap_or(id.as_str())
                .to_string()
        } else {
            display_id
        };

        Ok(Change {
            ref_type: if is_tag { RefType::Tag } else { RefType::Branch },
            ref_name: RefName::new(name).ok_or(PayloadError::MissingField {
                kind,
                field: "changes.ref.displayId",
            })?,
            change_type: self.change_type,
            from_hash: commit_hash(self.from_hash),
            to_hash: commit_hash(self.to_hash),
        })
    }
}

/// Decodes change entries one at a time. An entry that cannot be decoded is
/// logged and skipped; the rest of the delivery is still processed.
fn native_changes(kind: &'static str, changes: Option<Vec<Value>>) -> Vec<Change> {
    changes
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| {
            let decoded = serde_json::from_value::<NativeChange>(entry)
                .map_err(|source| PayloadError::Malformed { kind, source })
                .and_then(|c| c.into_change(kind));
            match decoded {
                Ok(change) => Some(change),
                Err(err) => {
                    info!(event_kind = kind, error = %err, "Skipping undecodable change");
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct NativeCommit {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeRefsChanged {
    repository: ServerRepository,
    changes: Option<Vec<Value>>,
    to_commit: Option<NativeCommit>,
}

#[derive(Debug, Deserialize)]
struct NativeMirrorServer {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeMirrorSynchronized {
    repository: ServerRepository,
    mirror_server: NativeMirrorServer,
    changes: Option<Vec<Value>>,
    #[serde(default)]
    ref_limit_exceeded: bool,
}

/// Parses a Bitbucket Server `repo:refs_changed` body.
pub fn parse_server_refs_changed(payload: &str) -> Result<RefsChangedEvent, PayloadError> {
    let raw: NativeRefsChanged = decode(REFS_CHANGED, payload)?;
    Ok(RefsChangedEvent {
        repository: raw.repository.into_repository(REFS_CHANGED)?,
        changes: native_changes(REFS_CHANGED, raw.changes),
        to_commit: commit_hash(raw.to_commit.map(|c| c.id)),
    })
}

/// Parses a Bitbucket Server `mirror:repo_synchronized` body.
///
/// When `refLimitExceeded` is set the change list is not decoded at all: the
/// processor re-indexes the whole repository whatever the list contains.
pub fn parse_server_mirror_synchronized(
    payload: &str,
) -> Result<MirrorSynchronizedEvent, PayloadError> {
    let raw: NativeMirrorSynchronized = decode(MIRROR_SYNCHRONIZED, payload)?;
    Ok(MirrorSynchronizedEvent {
        repository: raw.repository.into_repository(MIRROR_SYNCHRONIZED)?,
        changes: if raw.ref_limit_exceeded {
            Vec::new()
        } else {
            native_changes(MIRROR_SYNCHRONIZED, raw.changes)
        },
        mirror_id: MirrorId::new(raw.mirror_server.id).ok_or(PayloadError::MissingField {
            kind: MIRROR_SYNCHRONIZED,
            field: "mirrorServer.id",
        })?,
        ref_limit_exceeded: raw.ref_limit_exceeded,
    })
}

// ---------------------------------------------------------------------------
// Bitbucket Cloud
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CloudTarget {
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloudRefState {
    #[serde(rename = "type", default)]
    ref_type: String,
    name: String,
    target: Option<CloudTarget>,
}

impl CloudRefState {
    fn hash(&self) -> Option<CommitHash> {
        commit_hash(self.target.as_ref().and_then(|t| t.hash.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct CloudPushChange {
    new: Option<CloudRefState>,
    old: Option<CloudRefState>,
    #[serde(default)]
    created: bool,
    #[serde(default)]
    closed: bool,
}

impl CloudPushChange {
    fn into_change(self) -> Result<Change, PayloadError> {
        let change_type = if self.created {
            ChangeType::Add
        } else if self.closed || self.new.is_none() {
            ChangeType::Delete
        } else {
            ChangeType::Update
        };

        let from_hash = self.old.as_ref().and_then(CloudRefState::hash);
        let to_hash = self.new.as_ref().and_then(CloudRefState::hash);
        let state = self.new.or(self.old).ok_or(PayloadError::MissingField {
            kind: CLOUD_PUSH,
            field: "push.changes.new",
        })?;

        let ref_type = match state.ref_type.as_str() {
            "tag" | "annotated_tag" => RefType::Tag,
            _ => RefType::Branch,
        };

        Ok(Change {
            ref_type,
            ref_name: RefName::new(state.name).ok_or(PayloadError::MissingField {
                kind: CLOUD_PUSH,
                field: "push.changes.name",
            })?,
            change_type,
            from_hash,
            to_hash,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CloudPushBody {
    #[serde(default)]
    changes: Vec<CloudPushChange>,
}

#[derive(Debug, Deserialize)]
struct CloudPush {
    repository: CloudRepository,
    push: Option<CloudPushBody>,
}

/// Parses a Bitbucket Cloud `repo:push` body.
///
/// Cloud flags each change as `created`/`closed` instead of tagging it; these
/// are normalised onto the same `ADD`/`UPDATE`/`DELETE` tags Server uses.
pub fn parse_cloud_push(payload: &str) -> Result<RefsChangedEvent, PayloadError> {
    let raw: CloudPush = decode(CLOUD_PUSH, payload)?;
    let changes = raw
        .push
        .map(|p| p.changes)
        .unwrap_or_default()
        .into_iter()
        .map(CloudPushChange::into_change)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RefsChangedEvent {
        repository: raw.repository.into_repository(CLOUD_PUSH)?,
        changes,
        to_commit: None,
    })
}
