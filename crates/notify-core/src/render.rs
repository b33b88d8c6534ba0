//! Render-ready descriptors, one handler per notification kind.

use chrono::DateTime;
use serde::Serialize;

use crate::directory::UserDirectory;
use crate::model::{
    CallToAction, ContactChangeData, Notification, NotificationData, NotificationId,
    NotificationKind, PendingContactUpdateData,
};

/// What the display surface needs to draw one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderItem {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    pub timestamp: i64,
    pub seen: bool,
    /// Number of nodes the (possibly combined) record covers.
    pub item_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CallToAction>,
}

/// Either a descriptor, or the user handle whose name is still unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Ready(RenderItem),
    Pending { handle: String },
}

/// Build the descriptor for `record`, or report which user is missing.
#[must_use]
pub fn describe(record: &Notification, directory: &UserDirectory, watermark: u64) -> Rendered {
    let actor = match actor_handle(record) {
        Some(handle) => match directory.get(handle) {
            Some(contact) => Some(contact.display_name().to_string()),
            None => {
                return Rendered::Pending {
                    handle: handle.to_string(),
                };
            }
        },
        None => None,
    };

    let who = actor.as_deref().unwrap_or("Someone");
    let (text, remaining, action) = match &record.data {
        NotificationData::NewShare(_) => (format!("{who} shared a folder with you"), None, None),
        NotificationData::DeletedShare(_) => {
            (format!("{who} stopped sharing a folder with you"), None, None)
        }
        NotificationData::NewSharedFiles(d) => {
            let folders = d.nodes.iter().filter(|n| n.is_folder()).count();
            let files = d.nodes.len() - folders;
            (format!("{who} added {}", describe_counts(files, folders)), None, None)
        }
        NotificationData::RemovedSharedNode(d) => (
            format!("{who} removed {}", plural(d.nodes.len(), "item")),
            None,
            None,
        ),
        NotificationData::ContactChange(d) => {
            let label = d
                .changes
                .first()
                .and_then(|c| c.email.as_deref())
                .unwrap_or(who);
            let text = match d.primary_change() {
                Some(ContactChangeData::REMOVED) => format!("{label} deleted you as a contact"),
                Some(ContactChangeData::BLOCKED) => format!("{label} blocked you as a contact"),
                _ => format!("You and {label} are now contacts"),
            };
            (text, None, None)
        }
        NotificationData::IncomingPendingContact(d) => {
            let text = if d.deleted_at.is_some() {
                format!("{} cancelled their contact request", d.email)
            } else if d.reminded_at.is_some() {
                format!("{} sent you a contact request reminder", d.email)
            } else {
                format!("{} sent you a contact request", d.email)
            };
            (text, None, None)
        }
        NotificationData::UpdatedPendingContactIncoming(d) => {
            let verb = match d.status {
                PendingContactUpdateData::ACCEPTED => "accepted",
                PendingContactUpdateData::DENIED => "denied",
                _ => "ignored",
            };
            (format!("You {verb} a contact request"), None, None)
        }
        NotificationData::UpdatedPendingContactOutgoing(d) => {
            let verb = match d.status {
                PendingContactUpdateData::ACCEPTED => "accepted",
                PendingContactUpdateData::DENIED => "denied",
                _ => "ignored",
            };
            let label = d.email.as_deref().unwrap_or(who);
            (format!("{label} {verb} your contact request"), None, None)
        }
        NotificationData::Payment(d) => {
            let text = if d.succeeded() {
                "Your payment has been received".to_string()
            } else {
                "Your payment failed".to_string()
            };
            (text, None, None)
        }
        NotificationData::PaymentReminder(d) => {
            let date = DateTime::from_timestamp(d.expires_at, 0)
                .map_or_else(|| d.expires_at.to_string(), |dt| dt.format("%-d %B %Y").to_string());
            (format!("Your subscription expires on {date}"), None, None)
        }
        NotificationData::Takedown(d) => {
            let text = if d.is_takedown() {
                "Your publicly shared item has been taken down"
            } else {
                "Your publicly shared item has been reinstated"
            };
            (text.to_string(), None, None)
        }
        NotificationData::ScheduledMeeting(_) => {
            (format!("{who} updated a scheduled meeting"), None, None)
        }
        NotificationData::FileRequestUpload(d) => (
            format!("{} uploaded to your file request", plural(d.nodes.len(), "file")),
            None,
            None,
        ),
        NotificationData::Dynamic(d) => (
            d.title.clone(),
            d.remaining.clone(),
            d.primary_action.clone(),
        ),
    };

    Rendered::Ready(RenderItem {
        id: record.id.clone(),
        kind: record.kind,
        text,
        actor,
        timestamp: record.timestamp,
        seen: record.is_seen(watermark),
        item_count: record.all_data_items.len(),
        remaining,
        action,
    })
}

/// The user whose display name the text for `record` needs, if any.
#[must_use]
pub fn actor_handle(record: &Notification) -> Option<&str> {
    match &record.data {
        NotificationData::NewShare(_)
        | NotificationData::DeletedShare(_)
        | NotificationData::NewSharedFiles(_)
        | NotificationData::RemovedSharedNode(_) => record.user_handle.as_deref(),
        NotificationData::ContactChange(d) => {
            if d.changes.first().is_some_and(|c| c.email.is_some()) {
                None
            } else {
                record.user_handle.as_deref()
            }
        }
        NotificationData::UpdatedPendingContactOutgoing(d) => {
            if d.email.is_some() {
                None
            } else {
                record.user_handle.as_deref()
            }
        }
        NotificationData::ScheduledMeeting(d) => {
            d.organizer.as_deref().or(record.user_handle.as_deref())
        }
        NotificationData::IncomingPendingContact(_)
        | NotificationData::UpdatedPendingContactIncoming(_)
        | NotificationData::Payment(_)
        | NotificationData::PaymentReminder(_)
        | NotificationData::Takedown(_)
        | NotificationData::FileRequestUpload(_)
        | NotificationData::Dynamic(_) => None,
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn describe_counts(files: usize, folders: usize) -> String {
    match (files, folders) {
        (0, 0) => "nothing".to_string(),
        (f, 0) => plural(f, "file"),
        (0, d) => plural(d, "folder"),
        (f, d) => format!("{} and {}", plural(f, "file"), plural(d, "folder")),
    }
}
