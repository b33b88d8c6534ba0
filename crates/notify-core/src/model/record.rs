use serde::Serialize;
use std::fmt;

use super::data::NotificationData;
use super::kind::NotificationKind;

/// Identity of a notification record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum NotificationId {
    /// Session-scoped id generated on ingestion.
    Local(String),
    /// Server-issued monotonic id of a promotional notice.
    Dynamic(u64),
}

impl NotificationId {
    #[must_use]
    pub const fn dynamic_id(&self) -> Option<u64> {
        match self {
            Self::Dynamic(id) => Some(*id),
            Self::Local(_) => None,
        }
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(s) => f.write_str(s),
            Self::Dynamic(id) => write!(f, "dyn-{id}"),
        }
    }
}

/// A notification held in the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub data: NotificationData,
    /// Canonical originating user, if the event names one.
    pub user_handle: Option<String>,
    /// Event time, unix seconds.
    pub timestamp: i64,
    /// Age of the event in seconds when it was ingested.
    pub time_delta: i64,
    /// Stored seen flag. Meaningless for dynamic records, whose seen state
    /// is derived from the watermark.
    pub seen: bool,
    /// Every node handle this record has ever covered, merges included.
    pub all_data_items: Vec<String>,
}

impl Notification {
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        self.kind.is_dynamic()
    }

    #[must_use]
    pub const fn dynamic_id(&self) -> Option<u64> {
        self.id.dynamic_id()
    }

    #[must_use]
    pub const fn expiry(&self) -> Option<i64> {
        self.data.expiry()
    }

    /// Effective seen state given the current dynamic watermark.
    #[must_use]
    pub fn is_seen(&self, watermark: u64) -> bool {
        match self.dynamic_id() {
            Some(id) => id <= watermark,
            None => self.seen,
        }
    }

    /// Whether a dynamic record has passed its expiry. Records without an
    /// expiry never expire.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiry().is_some_and(|expiry| expiry < now)
    }
}
