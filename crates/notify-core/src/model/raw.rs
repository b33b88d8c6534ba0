//! Wire shapes consumed from the transport collaborator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::data::NotificationData;
use super::kind::NotificationKind;
use crate::error::IngestError;

/// A raw event record as it arrives from the bulk fetch or the live stream.
///
/// Only the envelope is typed here. The type-specific payload stays in
/// `fields` until [`RawEvent::parse`] knows which schema applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Age of the event in seconds at the moment it was delivered.
    #[serde(rename = "td", default)]
    pub time_delta: i64,

    /// Originating user. A plain handle, a list of handles, or a list of
    /// contact-change objects each carrying a `u` handle.
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,

    /// Session user that caused the event (live stream only).
    #[serde(rename = "ou", default, skip_serializing_if = "Option::is_none")]
    pub origin_user: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawEvent {
    /// Canonical user handle: the handle itself, or the first element of a list.
    #[must_use]
    pub fn canonical_user(&self) -> Option<String> {
        match self.user.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => match items.first()? {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj.get("u").and_then(Value::as_str).map(str::to_string),
                _ => None,
            },
            _ => None,
        }
    }

    /// Resolve the kind and decode the typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingKind`] or [`IngestError::UnknownKind`]
    /// when the type field is absent or unrecognized, and
    /// [`IngestError::MalformedPayload`] when the payload does not fit.
    pub fn parse(self) -> Result<IncomingEvent, IngestError> {
        let raw_kind = self.kind.clone().ok_or(IngestError::MissingKind)?;
        let kind: NotificationKind = raw_kind
            .parse()
            .map_err(|_| IngestError::UnknownKind { raw: raw_kind })?;

        let user_handle = self.canonical_user();
        let mut payload = self.fields;
        if let Some(user) = self.user {
            payload.insert("u".to_string(), user);
        }
        if kind == NotificationKind::ScheduledMeeting {
            if let Some(origin) = &self.origin_user {
                payload.insert("ou".to_string(), Value::String(origin.clone()));
            }
        }

        let data = NotificationData::deserialize_for(kind, Value::Object(payload))
            .map_err(|source| IngestError::MalformedPayload { kind, source })?;

        Ok(IncomingEvent {
            kind,
            data,
            user_handle,
            origin_user: self.origin_user,
            time_delta: self.time_delta.max(0),
        })
    }
}

/// A raw event whose kind and payload have been decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEvent {
    pub kind: NotificationKind,
    pub data: NotificationData,
    pub user_handle: Option<String>,
    pub origin_user: Option<String>,
    pub time_delta: i64,
}

/// Display data for a user who is not (yet) a full contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingContact {
    #[serde(rename = "u")]
    pub handle: String,
    #[serde(rename = "m")]
    pub email: String,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of the initial bulk fetch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BulkFetch {
    /// Server-side notification count.
    #[serde(rename = "c", default)]
    pub count: usize,

    /// Time delta of the last acknowledgement; events at least this old are seen.
    #[serde(rename = "ltd", default)]
    pub last_time_delta: i64,

    /// Events, newest first as delivered by the server.
    #[serde(rename = "a", default)]
    pub events: Vec<RawEvent>,

    #[serde(rename = "u", default)]
    pub pending_contacts: Vec<PendingContact>,
}
