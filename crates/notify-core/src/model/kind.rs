//! Notification kind enum covering the closed set of supported types.
//!
//! The string representation is the short wire code carried in the `t`
//! field of every raw event (`put`, `dshare`, `mcsmp`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The notification types understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NotificationKind {
    /// A folder was shared with the user.
    NewShare,
    /// Files were added to a shared folder.
    NewSharedFiles,
    /// Nodes were removed from a shared folder.
    RemovedSharedNode,
    /// A share the user had access to was deleted.
    DeletedShare,
    /// A contact relationship changed (added, removed, blocked).
    ContactChange,
    /// An incoming contact request arrived.
    IncomingPendingContact,
    /// An incoming contact request changed state.
    UpdatedPendingContactIncoming,
    /// An outgoing contact request changed state (accepted, denied).
    UpdatedPendingContactOutgoing,
    /// A payment completed or failed.
    Payment,
    /// A subscription is about to expire.
    PaymentReminder,
    /// A node was taken down or reinstated.
    Takedown,
    /// A scheduled meeting was created, changed or cancelled.
    ScheduledMeeting,
    /// Files arrived through a file request.
    FileRequestUpload,
    /// Server-pushed promotional notice.
    Dynamic,
}

/// Error returned when parsing an unknown kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown notification type '{}'", self.raw)
    }
}

impl std::error::Error for UnknownKind {}

/// Coarse preference group a kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Cloud,
    Contacts,
    /// Account-level notices that cannot be muted.
    Account,
}

impl NotificationKind {
    /// All known kinds in catalog order.
    pub const ALL: [Self; 14] = [
        Self::NewShare,
        Self::NewSharedFiles,
        Self::RemovedSharedNode,
        Self::DeletedShare,
        Self::ContactChange,
        Self::IncomingPendingContact,
        Self::UpdatedPendingContactIncoming,
        Self::UpdatedPendingContactOutgoing,
        Self::Payment,
        Self::PaymentReminder,
        Self::Takedown,
        Self::ScheduledMeeting,
        Self::FileRequestUpload,
        Self::Dynamic,
    ];

    /// Return the wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewShare => "share",
            Self::NewSharedFiles => "put",
            Self::RemovedSharedNode => "d",
            Self::DeletedShare => "dshare",
            Self::ContactChange => "c",
            Self::IncomingPendingContact => "ipc",
            Self::UpdatedPendingContactIncoming => "upci",
            Self::UpdatedPendingContactOutgoing => "upco",
            Self::Payment => "psts",
            Self::PaymentReminder => "pses",
            Self::Takedown => "ph",
            Self::ScheduledMeeting => "mcsmp",
            Self::FileRequestUpload => "puu",
            Self::Dynamic => "dynamic",
        }
    }

    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::NewShare
            | Self::NewSharedFiles
            | Self::RemovedSharedNode
            | Self::DeletedShare
            | Self::FileRequestUpload => Category::Cloud,
            Self::ContactChange
            | Self::IncomingPendingContact
            | Self::UpdatedPendingContactIncoming
            | Self::UpdatedPendingContactOutgoing => Category::Contacts,
            Self::Payment
            | Self::PaymentReminder
            | Self::Takedown
            | Self::ScheduledMeeting
            | Self::Dynamic => Category::Account,
        }
    }

    /// Whether this is the promotional kind whose seen state is derived
    /// from the watermark instead of stored per record.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind { raw: s.to_string() })
    }
}

impl Serialize for NotificationKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
