//! Notification data model.
//!
//! A raw event ([`RawEvent`]) is decoded into an [`IncomingEvent`] with a
//! typed [`NotificationData`] payload, and becomes a stored
//! [`Notification`] once it passes the preference filter.

pub mod data;
pub mod kind;
pub mod raw;
pub mod record;

pub use data::{
    CallToAction, ContactChangeData, ContactChangeEntry, DynamicData, FileRequestUploadData,
    NodeEntry, NodesAddedData, NodesRemovedData, NotificationData, PaymentData,
    PaymentReminderData, PendingContactData, PendingContactUpdateData, ScheduledMeetingData,
    ShareData, TakedownData,
};
pub use kind::{Category, NotificationKind, UnknownKind};
pub use raw::{BulkFetch, IncomingEvent, PendingContact, RawEvent};
pub use record::{Notification, NotificationId};
