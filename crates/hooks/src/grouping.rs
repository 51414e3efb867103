//! Partitioning of raw changes by canonical event type.

use scm::{Change, EventType};
use tracing::info;

/// Changes partitioned by [`EventType`], in order of first appearance.
///
/// Every change with a recognised tag lands in exactly one group; changes
/// with an unrecognised tag are kept aside in [`ChangeGroups::dropped`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeGroups {
    groups: Vec<(EventType, Vec<Change>)>,
    dropped: Vec<Change>,
}

impl ChangeGroups {
    /// Non-empty groups in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (EventType, &[Change])> {
        self.groups.iter().map(|(kind, changes)| (*kind, changes.as_slice()))
    }

    /// Changes in the group for `kind`; empty if none.
    pub fn get(&self, kind: EventType) -> &[Change] {
        self.groups
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, changes)| changes.as_slice())
            .unwrap_or_default()
    }

    /// Changes whose provider tag was not recognised.
    pub fn dropped(&self) -> &[Change] {
        &self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> Vec<(EventType, Vec<Change>)> {
        self.groups
    }
}

/// Groups `changes` by canonical event type.
///
/// `ADD` becomes [`EventType::Created`], `UPDATE` becomes
/// [`EventType::Updated`], `DELETE` becomes [`EventType::Removed`]. Anything
/// else is logged and dropped.
pub fn group_changes(changes: impl IntoIterator<Item = Change>) -> ChangeGroups {
    let mut grouped = ChangeGroups::default();
    for change in changes {
        match change.change_type.event_type() {
            Some(kind) => match grouped.groups.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, bucket)) => bucket.push(change),
                None => grouped.groups.push((kind, vec![change])),
            },
            None => {
                info!(
                    change_type = change.change_type.as_str(),
                    ref_name = %change.ref_name,
                    "Unknown change event type received from Bitbucket; ignoring change"
                );
                grouped.dropped.push(change);
            }
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use scm::{ChangeType, RefName, RefType};

    fn change(name: &str, tag: &str) -> Change {
        Change {
            ref_type: RefType::Branch,
            ref_name: RefName::new(name).unwrap(),
            change_type: ChangeType::from(tag.to_string()),
            from_hash: None,
            to_hash: None,
        }
    }

    #[test]
    fn groups_follow_first_appearance() {
        let grouped = group_changes(vec![
            change("main", "UPDATE"),
            change("feature/x", "ADD"),
            change("develop", "UPDATE"),
            change("old", "DELETE"),
        ]);
        let kinds: Vec<_> = grouped.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![EventType::Updated, EventType::Created, EventType::Removed]);
        assert_eq!(grouped.get(EventType::Updated).len(), 2);
        assert_eq!(grouped.get(EventType::Created)[0].ref_name.as_str(), "feature/x");
    }

    #[test]
    fn unknown_tags_are_dropped() {
        let grouped = group_changes(vec![change("main", "RENAME")]);
        assert!(grouped.is_empty());
        assert_eq!(grouped.dropped().len(), 1);
        assert!(grouped.get(EventType::Created).is_empty());
    }
}
