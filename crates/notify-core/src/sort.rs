//! Display ordering.
//!
//! Total order, applied to a copy of the store before every render pass:
//!
//! 1. dynamic records before all others;
//! 2. dynamic records by id, descending;
//! 3. other records by timestamp, descending.
//!
//! Records with equal keys keep their relative canonical order.

use std::cmp::Ordering;

use crate::model::Notification;

/// Return references to `records` in display order. The input is not touched.
#[must_use]
pub fn sort_for_display(records: &[Notification]) -> Vec<&Notification> {
    let mut ordered: Vec<&Notification> = records.iter().collect();
    ordered.sort_by(|a, b| display_order(a, b));
    ordered
}

/// Comparator behind [`sort_for_display`].
#[must_use]
pub fn display_order(a: &Notification, b: &Notification) -> Ordering {
    match (a.dynamic_id(), b.dynamic_id()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.timestamp.cmp(&a.timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DynamicData, NotificationData, NotificationId, NotificationKind, ShareData,
    };

    fn local(id: &str, ts: i64) -> Notification {
        Notification {
            id: NotificationId::Local(id.to_string()),
            kind: NotificationKind::NewShare,
            data: NotificationData::NewShare(ShareData {
                node: "n".to_string(),
            }),
            user_handle: Some("u".to_string()),
            timestamp: ts,
            time_delta: 0,
            seen: false,
            all_data_items: Vec::new(),
        }
    }

    fn dynamic(id: u64, ts: i64) -> Notification {
        Notification {
            id: NotificationId::Dynamic(id),
            kind: NotificationKind::Dynamic,
            data: NotificationData::Dynamic(DynamicData {
                id,
                title: String::new(),
                description: String::new(),
                image: None,
                primary_action: None,
                secondary_action: None,
                start: None,
                expiry: None,
                remaining: None,
            }),
            user_handle: None,
            timestamp: ts,
            time_delta: 0,
            seen: false,
            all_data_items: Vec::new(),
        }
    }

    fn ids(ordered: &[&Notification]) -> Vec<String> {
        ordered.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn dynamic_first_then_recency() {
        let records = vec![
            local("old", 10),
            dynamic(2, 999),
            local("new", 50),
            dynamic(7, 0),
            local("mid", 30),
        ];
        let ordered = sort_for_display(&records);
        assert_eq!(ids(&ordered), vec!["dyn-7", "dyn-2", "new", "mid", "old"]);
    }

    #[test]
    fn equal_timestamps_keep_canonical_order() {
        let records = vec![local("first", 10), local("second", 10)];
        let ordered = sort_for_display(&records);
        assert_eq!(ids(&ordered), vec!["first", "second"]);
    }

    #[test]
    fn empty_input() {
        assert!(sort_for_display(&[]).is_empty());
    }
}
