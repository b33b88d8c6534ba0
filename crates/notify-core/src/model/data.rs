//! Typed payload structs for each notification kind.
//!
//! Field names follow the compact wire keys of the action packets; the
//! Rust-side names are descriptive and mapped with `#[serde(rename)]`.
//! Unknown wire fields are ignored so newer servers can add fields freely.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::kind::NotificationKind;

// ---------------------------------------------------------------------------
// NotificationData — the unified payload enum
// ---------------------------------------------------------------------------

/// Typed payload of a notification. The discriminant comes from the `t`
/// field of the raw event, not from the payload itself.
///
/// Use [`NotificationData::deserialize_for`] with a known
/// [`NotificationKind`] to build one from raw JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NotificationData {
    NewShare(ShareData),
    NewSharedFiles(NodesAddedData),
    RemovedSharedNode(NodesRemovedData),
    DeletedShare(ShareData),
    ContactChange(ContactChangeData),
    IncomingPendingContact(PendingContactData),
    UpdatedPendingContactIncoming(PendingContactUpdateData),
    UpdatedPendingContactOutgoing(PendingContactUpdateData),
    Payment(PaymentData),
    PaymentReminder(PaymentReminderData),
    Takedown(TakedownData),
    ScheduledMeeting(ScheduledMeetingData),
    FileRequestUpload(FileRequestUploadData),
    Dynamic(DynamicData),
}

impl NotificationData {
    /// Deserialize a JSON object into the variant matching `kind`.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] when the payload does not
    /// match the schema of `kind`.
    pub fn deserialize_for(kind: NotificationKind, json: Value) -> Result<Self, serde_json::Error> {
        match kind {
            NotificationKind::NewShare => serde_json::from_value(json).map(Self::NewShare),
            NotificationKind::NewSharedFiles => {
                serde_json::from_value(json).map(Self::NewSharedFiles)
            }
            NotificationKind::RemovedSharedNode => {
                serde_json::from_value(json).map(Self::RemovedSharedNode)
            }
            NotificationKind::DeletedShare => serde_json::from_value(json).map(Self::DeletedShare),
            NotificationKind::ContactChange => {
                serde_json::from_value(json).map(Self::ContactChange)
            }
            NotificationKind::IncomingPendingContact => {
                serde_json::from_value(json).map(Self::IncomingPendingContact)
            }
            NotificationKind::UpdatedPendingContactIncoming => {
                serde_json::from_value(json).map(Self::UpdatedPendingContactIncoming)
            }
            NotificationKind::UpdatedPendingContactOutgoing => {
                serde_json::from_value(json).map(Self::UpdatedPendingContactOutgoing)
            }
            NotificationKind::Payment => serde_json::from_value(json).map(Self::Payment),
            NotificationKind::PaymentReminder => {
                serde_json::from_value(json).map(Self::PaymentReminder)
            }
            NotificationKind::Takedown => serde_json::from_value(json).map(Self::Takedown),
            NotificationKind::ScheduledMeeting => {
                serde_json::from_value(json).map(Self::ScheduledMeeting)
            }
            NotificationKind::FileRequestUpload => {
                serde_json::from_value(json).map(Self::FileRequestUpload)
            }
            NotificationKind::Dynamic => serde_json::from_value(json).map(Self::Dynamic),
        }
    }

    /// The kind this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::NewShare(_) => NotificationKind::NewShare,
            Self::NewSharedFiles(_) => NotificationKind::NewSharedFiles,
            Self::RemovedSharedNode(_) => NotificationKind::RemovedSharedNode,
            Self::DeletedShare(_) => NotificationKind::DeletedShare,
            Self::ContactChange(_) => NotificationKind::ContactChange,
            Self::IncomingPendingContact(_) => NotificationKind::IncomingPendingContact,
            Self::UpdatedPendingContactIncoming(_) => {
                NotificationKind::UpdatedPendingContactIncoming
            }
            Self::UpdatedPendingContactOutgoing(_) => {
                NotificationKind::UpdatedPendingContactOutgoing
            }
            Self::Payment(_) => NotificationKind::Payment,
            Self::PaymentReminder(_) => NotificationKind::PaymentReminder,
            Self::Takedown(_) => NotificationKind::Takedown,
            Self::ScheduledMeeting(_) => NotificationKind::ScheduledMeeting,
            Self::FileRequestUpload(_) => NotificationKind::FileRequestUpload,
            Self::Dynamic(_) => NotificationKind::Dynamic,
        }
    }

    /// Node handles affected by this event, in wire order.
    ///
    /// Seeds `all_data_items` on a freshly created record.
    #[must_use]
    pub fn node_handles(&self) -> Vec<String> {
        match self {
            Self::NewSharedFiles(d) => d.nodes.iter().map(|n| n.handle.clone()).collect(),
            Self::FileRequestUpload(d) => d.nodes.iter().map(|n| n.handle.clone()).collect(),
            Self::RemovedSharedNode(d) => d.nodes.clone(),
            Self::NewShare(d) | Self::DeletedShare(d) => vec![d.node.clone()],
            Self::Takedown(d) => vec![d.handle.clone()],
            _ => Vec::new(),
        }
    }

    /// Expiry (unix seconds) carried by promotional payloads.
    #[must_use]
    pub const fn expiry(&self) -> Option<i64> {
        match self {
            Self::Dynamic(d) => d.expiry,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// One node entry in a node-list payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    #[serde(rename = "h")]
    pub handle: String,
    /// 0 for files, 1 for folders.
    #[serde(rename = "t", default)]
    pub node_type: u8,
}

impl NodeEntry {
    #[must_use]
    pub const fn is_folder(&self) -> bool {
        self.node_type == 1
    }
}

/// Accept either a single string or a list of strings, always yielding a list.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

// ---------------------------------------------------------------------------
// Per-kind payloads
// ---------------------------------------------------------------------------

/// Payload for `share` and `dshare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareData {
    #[serde(rename = "n")]
    pub node: String,
}

/// Payload for `put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesAddedData {
    /// Destination parent folder handle.
    #[serde(rename = "n")]
    pub parent: String,
    #[serde(rename = "f", default)]
    pub nodes: Vec<NodeEntry>,
}

/// Payload for `d`. A scalar `n` on the wire is coerced to a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodesRemovedData {
    #[serde(rename = "n", deserialize_with = "one_or_many")]
    pub nodes: Vec<String>,
}

/// One entry of a `c` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactChangeEntry {
    #[serde(rename = "u")]
    pub user: String,
    /// 0 removed, 1 added, 2 blocked.
    #[serde(rename = "c", default)]
    pub change: u8,
    #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Payload for `c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactChangeData {
    #[serde(rename = "u", default)]
    pub changes: Vec<ContactChangeEntry>,
}

impl ContactChangeData {
    pub const REMOVED: u8 = 0;
    pub const ADDED: u8 = 1;
    pub const BLOCKED: u8 = 2;

    /// Change code of the canonical (first) entry.
    #[must_use]
    pub fn primary_change(&self) -> Option<u8> {
        self.changes.first().map(|c| c.change)
    }
}

/// Payload for `ipc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingContactData {
    #[serde(rename = "m")]
    pub email: String,
    #[serde(rename = "p", default)]
    pub pending_id: Option<String>,
    /// Set when the request was cancelled by its sender.
    #[serde(rename = "dts", default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    /// Set when the sender re-sent a reminder.
    #[serde(rename = "rts", default, skip_serializing_if = "Option::is_none")]
    pub reminded_at: Option<i64>,
}

/// Payload for `upci` and `upco`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingContactUpdateData {
    #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 1 ignored, 2 accepted, 3 denied.
    #[serde(rename = "s", default)]
    pub status: u8,
    #[serde(rename = "p", default)]
    pub pending_id: Option<String>,
}

impl PendingContactUpdateData {
    pub const IGNORED: u8 = 1;
    pub const ACCEPTED: u8 = 2;
    pub const DENIED: u8 = 3;
}

/// Payload for `psts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentData {
    /// `s` for success, anything else for failure.
    #[serde(rename = "r")]
    pub result: String,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<u32>,
}

impl PaymentData {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.result == "s"
    }
}

/// Payload for `pses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReminderData {
    /// Subscription expiry, unix seconds.
    #[serde(rename = "ts")]
    pub expires_at: i64,
}

/// Payload for `ph`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakedownData {
    #[serde(rename = "h")]
    pub handle: String,
    /// 1 taken down, 0 reinstated.
    #[serde(rename = "down", default)]
    pub down: u8,
}

impl TakedownData {
    #[must_use]
    pub const fn is_takedown(&self) -> bool {
        self.down == 1
    }
}

/// Payload for `mcsmp`. Everything beyond the ids is handed to the
/// meeting evaluator untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMeetingData {
    #[serde(rename = "id")]
    pub meeting_id: String,
    #[serde(rename = "cid", default)]
    pub chat_id: Option<String>,
    #[serde(rename = "ou", default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Payload for `puu`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequestUploadData {
    /// Destination parent folder handle.
    #[serde(rename = "n")]
    pub parent: String,
    /// Origin of the upload (the file-request handle it came through).
    #[serde(rename = "pou")]
    pub origin: String,
    #[serde(rename = "f", default)]
    pub nodes: Vec<NodeEntry>,
}

/// Call-to-action button of a promotional notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub text: String,
    pub link: String,
}

/// Payload for promotional (`dynamic`) notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicData {
    pub id: u64,
    #[serde(rename = "t", default)]
    pub title: String,
    #[serde(rename = "d", default)]
    pub description: String,
    #[serde(rename = "dsp", default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "cta1", default, skip_serializing_if = "Option::is_none")]
    pub primary_action: Option<CallToAction>,
    #[serde(rename = "cta2", default, skip_serializing_if = "Option::is_none")]
    pub secondary_action: Option<CallToAction>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    /// Unix seconds after which the notice is withdrawn.
    #[serde(rename = "e", default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    /// Countdown text maintained while the notice is tracked.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
}
