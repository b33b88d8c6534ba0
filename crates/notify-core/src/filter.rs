//! Preference filter: drops events the user opted out of.
//!
//! Every kind passes two gates. The coarse gate checks that its category
//! (cloud or contacts) is enabled; the fine gate checks the toggle for the
//! specific subtype. Account-level kinds cannot be muted.

use crate::config::Preferences;
use crate::model::{Category, ContactChangeData, IncomingEvent, NotificationData};

/// Returns `true` when `event` must be dropped before combination.
#[must_use]
pub fn is_unwanted(event: &IncomingEvent, prefs: &Preferences) -> bool {
    !category_enabled(event.kind.category(), prefs) || !subtype_enabled(&event.data, prefs)
}

const fn category_enabled(category: Category, prefs: &Preferences) -> bool {
    match category {
        Category::Cloud => prefs.cloud_enabled,
        Category::Contacts => prefs.contacts_enabled,
        Category::Account => true,
    }
}

fn subtype_enabled(data: &NotificationData, prefs: &Preferences) -> bool {
    match data {
        NotificationData::NewSharedFiles(_) => prefs.cloud_new_files,
        NotificationData::NewShare(_) => prefs.cloud_new_share,
        NotificationData::DeletedShare(_) => prefs.cloud_deleted_share,
        NotificationData::RemovedSharedNode(_) => prefs.cloud_removed_node,
        NotificationData::FileRequestUpload(_) => prefs.cloud_upload_requests,
        NotificationData::IncomingPendingContact(_) => prefs.contacts_request_received,
        NotificationData::UpdatedPendingContactOutgoing(_) => prefs.contacts_request_accepted,
        // Only removals are individually mutable; other contact changes
        // follow the category toggle.
        NotificationData::ContactChange(change) => {
            change.primary_change() != Some(ContactChangeData::REMOVED) || prefs.contacts_removed
        }
        NotificationData::UpdatedPendingContactIncoming(_)
        | NotificationData::Payment(_)
        | NotificationData::PaymentReminder(_)
        | NotificationData::Takedown(_)
        | NotificationData::ScheduledMeeting(_)
        | NotificationData::Dynamic(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawEvent;
    use serde_json::{Value, json};

    fn event(value: Value) -> IncomingEvent {
        serde_json::from_value::<RawEvent>(value)
            .expect("raw")
            .parse()
            .expect("parse")
    }

    #[test]
    fn everything_passes_with_defaults() {
        let prefs = Preferences::default();
        for ev in [
            json!({ "t": "put", "u": "a", "n": "p", "f": [] }),
            json!({ "t": "share", "u": "a", "n": "x" }),
            json!({ "t": "ipc", "u": "a", "m": "a@example.com" }),
            json!({ "t": "psts", "r": "s" }),
        ] {
            assert!(!is_unwanted(&event(ev), &prefs));
        }
    }

    #[test]
    fn category_gate_drops_whole_group() {
        let prefs = Preferences {
            cloud_enabled: false,
            ..Preferences::default()
        };
        assert!(is_unwanted(&event(json!({ "t": "put", "u": "a", "n": "p" })), &prefs));
        assert!(is_unwanted(&event(json!({ "t": "dshare", "u": "a", "n": "x" })), &prefs));
        assert!(!is_unwanted(&event(json!({ "t": "ipc", "u": "a", "m": "m" })), &prefs));
    }

    #[test]
    fn subtype_gate_is_independent() {
        let prefs = Preferences {
            cloud_new_files: false,
            ..Preferences::default()
        };
        assert!(is_unwanted(&event(json!({ "t": "put", "u": "a", "n": "p" })), &prefs));
        assert!(!is_unwanted(&event(json!({ "t": "share", "u": "a", "n": "x" })), &prefs));
    }

    #[test]
    fn contact_removal_has_its_own_toggle() {
        let prefs = Preferences {
            contacts_removed: false,
            ..Preferences::default()
        };
        let removed = event(json!({ "t": "c", "u": [{ "u": "a", "c": 0 }] }));
        let added = event(json!({ "t": "c", "u": [{ "u": "a", "c": 1 }] }));
        assert!(is_unwanted(&removed, &prefs));
        assert!(!is_unwanted(&added, &prefs));
    }

    #[test]
    fn account_kinds_cannot_be_muted() {
        let prefs = Preferences {
            cloud_enabled: false,
            contacts_enabled: false,
            ..Preferences::default()
        };
        assert!(!is_unwanted(&event(json!({ "t": "pses", "ts": 10 })), &prefs));
        assert!(!is_unwanted(&event(json!({ "t": "dynamic", "id": 3 })), &prefs));
    }
}
