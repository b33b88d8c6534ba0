//! Combiner: folds a new notification into its most recent neighbour.
//!
//! The store keeps records newest-first, so the neighbour is always the
//! first non-dynamic record. Bulk ingestion walks the server batch oldest to
//! newest and goes through the same rule, which gives live and bulk
//! ingestion one merge behaviour.
//!
//! # Rule
//!
//! 1. No neighbour, a different kind, a different (or unknown) user, or a
//!    timestamp gap above the window: the incoming record is inserted at
//!    the front.
//! 2. Kind-specific equivalence:
//!    - `put`: same destination parent. Node lists are concatenated,
//!      older first.
//!    - `d`: removed handles are concatenated.
//!    - `puu`: same parent, same upload origin and same seen state.
//!    - every other kind: never combined.
//! 3. On a match the merged record replaces the neighbour; the older of
//!    the two is discarded.
//!
//! Dynamic records never combine. They are upserted by id and a repeated
//! id is skipped.

use tracing::debug;

use crate::model::{Notification, NotificationData};

/// Tunables for the combination rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombineRules {
    /// Maximum timestamp gap, in seconds, between two combinable events.
    pub window_secs: i64,
}

impl Default for CombineRules {
    fn default() -> Self {
        Self { window_secs: 300 }
    }
}

/// What happened to an incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folded {
    /// Inserted as a new record at the front.
    Inserted,
    /// Merged into the front record.
    Merged,
    /// A dynamic record with this id is already held; nothing changed.
    Duplicate,
}

/// Fold `incoming` into `records` (newest-first).
pub fn fold_into(
    records: &mut Vec<Notification>,
    mut incoming: Notification,
    rules: &CombineRules,
) -> Folded {
    if let Some(id) = incoming.dynamic_id() {
        if records.iter().any(|r| r.dynamic_id() == Some(id)) {
            debug!(id, "skipping duplicate dynamic notification");
            return Folded::Duplicate;
        }
        records.insert(0, incoming);
        return Folded::Inserted;
    }

    // Dynamic records sit outside the timeline, so skip past them.
    let Some(pos) = records.iter().position(|r| !r.is_dynamic()) else {
        records.insert(0, incoming);
        return Folded::Inserted;
    };

    let front = &records[pos];
    if !are_neighbours(front, &incoming, rules) || !absorb(front, &mut incoming) {
        records.insert(0, incoming);
        return Folded::Inserted;
    }

    debug!(
        kind = %incoming.kind,
        items = incoming.all_data_items.len(),
        "combined notification with previous"
    );
    records[pos] = incoming;
    Folded::Merged
}

/// Same kind, same known user, and within the combination window.
fn are_neighbours(previous: &Notification, incoming: &Notification, rules: &CombineRules) -> bool {
    if previous.kind != incoming.kind || previous.is_dynamic() {
        return false;
    }

    match (&previous.user_handle, &incoming.user_handle) {
        (Some(a), Some(b)) if a == b => {}
        _ => return false,
    }

    (incoming.timestamp - previous.timestamp).abs() <= rules.window_secs
}

/// Pull `previous`'s content into `incoming` when the kind-specific
/// equivalence holds. Returns `false`, leaving `incoming` untouched, when
/// the two must stay separate.
fn absorb(previous: &Notification, incoming: &mut Notification) -> bool {
    let seen_matches = previous.seen == incoming.seen;

    match (&previous.data, &mut incoming.data) {
        (NotificationData::NewSharedFiles(old), NotificationData::NewSharedFiles(new)) => {
            if old.parent.is_empty() || old.parent != new.parent {
                return false;
            }
            let mut nodes = old.nodes.clone();
            nodes.append(&mut new.nodes);
            new.nodes = nodes;
        }
        (NotificationData::RemovedSharedNode(old), NotificationData::RemovedSharedNode(new)) => {
            let mut nodes = old.nodes.clone();
            nodes.append(&mut new.nodes);
            new.nodes = nodes;
        }
        (NotificationData::FileRequestUpload(old), NotificationData::FileRequestUpload(new)) => {
            if !seen_matches
                || old.parent.is_empty()
                || old.parent != new.parent
                || old.origin != new.origin
            {
                return false;
            }
            let mut nodes = old.nodes.clone();
            nodes.append(&mut new.nodes);
            new.nodes = nodes;
        }
        _ => return false,
    }

    incoming.all_data_items = union_items(&previous.all_data_items, &incoming.all_data_items);
    true
}

/// Older items first, then any new ones not already present.
fn union_items(older: &[String], newer: &[String]) -> Vec<String> {
    let mut merged = older.to_vec();
    for item in newer {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DynamicData, FileRequestUploadData, NodeEntry, NodesAddedData, NodesRemovedData,
        NotificationId, NotificationKind, ShareData,
    };

    fn node(h: &str) -> NodeEntry {
        NodeEntry {
            handle: h.to_string(),
            node_type: 0,
        }
    }

    fn record(id: &str, user: &str, ts: i64, data: NotificationData) -> Notification {
        Notification {
            id: NotificationId::Local(id.to_string()),
            kind: data.kind(),
            all_data_items: data.node_handles(),
            data,
            user_handle: Some(user.to_string()),
            timestamp: ts,
            time_delta: 0,
            seen: false,
        }
    }

    fn put(id: &str, user: &str, parent: &str, ts: i64, handles: &[&str]) -> Notification {
        record(
            id,
            user,
            ts,
            NotificationData::NewSharedFiles(NodesAddedData {
                parent: parent.to_string(),
                nodes: handles.iter().map(|h| node(h)).collect(),
            }),
        )
    }

    fn puu(id: &str, user: &str, parent: &str, origin: &str, ts: i64, handles: &[&str]) -> Notification {
        record(
            id,
            user,
            ts,
            NotificationData::FileRequestUpload(FileRequestUploadData {
                parent: parent.to_string(),
                origin: origin.to_string(),
                nodes: handles.iter().map(|h| node(h)).collect(),
            }),
        )
    }

    fn dynamic(id: u64) -> Notification {
        let data = NotificationData::Dynamic(DynamicData {
            id,
            title: String::new(),
            description: String::new(),
            image: None,
            primary_action: None,
            secondary_action: None,
            start: None,
            expiry: None,
            remaining: None,
        });
        Notification {
            id: NotificationId::Dynamic(id),
            kind: NotificationKind::Dynamic,
            data,
            user_handle: None,
            timestamp: 0,
            time_delta: 0,
            seen: false,
            all_data_items: Vec::new(),
        }
    }

    #[test]
    fn put_within_window_merges() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        assert_eq!(fold_into(&mut records, put("1", "a", "X", 100, &["h1"]), &rules), Folded::Inserted);
        assert_eq!(fold_into(&mut records, put("2", "a", "X", 399, &["h2"]), &rules), Folded::Merged);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, NotificationId::Local("2".to_string()));
        assert_eq!(records[0].timestamp, 399);
        assert_eq!(records[0].all_data_items, vec!["h1", "h2"]);
        assert_eq!(records[0].data.node_handles(), vec!["h1", "h2"]);
    }

    #[test]
    fn put_outside_window_inserts() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        fold_into(&mut records, put("1", "a", "X", 100, &["h1"]), &rules);
        assert_eq!(fold_into(&mut records, put("2", "a", "X", 401, &["h2"]), &rules), Folded::Inserted);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        fold_into(&mut records, put("1", "a", "X", 0, &["h1"]), &rules);
        assert_eq!(fold_into(&mut records, put("2", "a", "X", 300, &["h2"]), &rules), Folded::Merged);
    }

    #[test]
    fn put_different_parent_or_user_inserts() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        fold_into(&mut records, put("1", "a", "X", 100, &["h1"]), &rules);
        fold_into(&mut records, put("2", "a", "Y", 110, &["h2"]), &rules);
        fold_into(&mut records, put("3", "b", "Y", 120, &["h3"]), &rules);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn only_front_record_is_considered() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        fold_into(&mut records, put("1", "a", "X", 100, &["h1"]), &rules);
        fold_into(&mut records, put("2", "b", "X", 110, &["h2"]), &rules);
        // Matches record 1, but record 2 is in front.
        fold_into(&mut records, put("3", "a", "X", 120, &["h3"]), &rules);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn removed_nodes_accumulate() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        let removal = |id: &str, ts: i64, nodes: &[&str]| {
            record(
                id,
                "a",
                ts,
                NotificationData::RemovedSharedNode(NodesRemovedData {
                    nodes: nodes.iter().map(|s| (*s).to_string()).collect(),
                }),
            )
        };
        fold_into(&mut records, removal("1", 10, &["n1"]), &rules);
        fold_into(&mut records, removal("2", 20, &["n2", "n3"]), &rules);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data.node_handles(), vec!["n1", "n2", "n3"]);
    }

    #[test]
    fn upload_requires_same_origin_and_seen() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        fold_into(&mut records, puu("1", "a", "X", "o1", 10, &["h1"]), &rules);
        assert_eq!(
            fold_into(&mut records, puu("2", "a", "X", "o2", 20, &["h2"]), &rules),
            Folded::Inserted
        );

        let mut seen = puu("3", "a", "X", "o2", 30, &["h3"]);
        seen.seen = true;
        assert_eq!(fold_into(&mut records, seen, &rules), Folded::Inserted);

        let mut seen_again = puu("4", "a", "X", "o2", 40, &["h4", "h3"]);
        seen_again.seen = true;
        assert_eq!(fold_into(&mut records, seen_again, &rules), Folded::Merged);
        assert_eq!(records[0].all_data_items, vec!["h3", "h4"]);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn other_kinds_never_combine() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        let share = |id: &str| {
            record(
                id,
                "a",
                10,
                NotificationData::NewShare(ShareData {
                    node: "x".to_string(),
                }),
            )
        };
        fold_into(&mut records, share("1"), &rules);
        fold_into(&mut records, share("2"), &rules);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn unknown_user_never_combines() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        let mut first = put("1", "a", "X", 10, &["h1"]);
        first.user_handle = None;
        let mut second = put("2", "a", "X", 20, &["h2"]);
        second.user_handle = None;
        fold_into(&mut records, first, &rules);
        assert_eq!(fold_into(&mut records, second, &rules), Folded::Inserted);
    }

    #[test]
    fn dynamic_records_do_not_split_a_run() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        fold_into(&mut records, put("1", "a", "X", 10, &["h1"]), &rules);
        fold_into(&mut records, dynamic(7), &rules);
        assert_eq!(fold_into(&mut records, put("2", "a", "X", 20, &["h2"]), &rules), Folded::Merged);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dynamic_id(), Some(7));
        assert_eq!(records[1].all_data_items, vec!["h1", "h2"]);
    }

    #[test]
    fn dynamic_is_idempotent_by_id() {
        let rules = CombineRules::default();
        let mut records = Vec::new();
        assert_eq!(fold_into(&mut records, dynamic(5), &rules), Folded::Inserted);
        fold_into(&mut records, put("1", "a", "X", 10, &["h1"]), &rules);
        assert_eq!(fold_into(&mut records, dynamic(5), &rules), Folded::Duplicate);
        assert_eq!(fold_into(&mut records, dynamic(6), &rules), Folded::Inserted);
        assert_eq!(records.len(), 3);
    }
}
