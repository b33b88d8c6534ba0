//! Display names for the users notifications refer to.
//!
//! A name that is not known yet must be fetched asynchronously. Concurrent
//! requests for the same handle collapse into one pending lookup; every
//! record that asked is remembered and handed back when the lookup lands,
//! so the caller can re-render exactly those.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{NotificationId, PendingContact};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub handle: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Contact {
    /// Best available label: name, then email, then the bare handle.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.handle)
    }
}

impl From<PendingContact> for Contact {
    fn from(pending: PendingContact) -> Self {
        Self {
            handle: pending.handle,
            email: Some(pending.email),
            name: pending.name,
        }
    }
}

/// Outcome of [`UserDirectory::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Already resolved; no fetch needed.
    Known,
    /// A fetch for this handle is in flight; the waiter was added to it.
    Joined,
    /// No fetch was in flight; the caller must issue one.
    Issue,
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    known: HashMap<String, Contact>,
    in_flight: HashMap<String, Vec<NotificationId>>,
}

impl UserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, contact: Contact) {
        self.known.insert(contact.handle.clone(), contact);
    }

    #[must_use]
    pub fn get(&self, handle: &str) -> Option<&Contact> {
        self.known.get(handle)
    }

    #[must_use]
    pub fn is_in_flight(&self, handle: &str) -> bool {
        self.in_flight.contains_key(handle)
    }

    /// Register `waiter` as needing `handle`.
    pub fn request(&mut self, handle: &str, waiter: NotificationId) -> Lookup {
        if self.known.contains_key(handle) {
            return Lookup::Known;
        }

        if let Some(waiters) = self.in_flight.get_mut(handle) {
            if !waiters.contains(&waiter) {
                waiters.push(waiter);
            }
            return Lookup::Joined;
        }

        self.in_flight.insert(handle.to_string(), vec![waiter]);
        Lookup::Issue
    }

    /// Store a resolved contact and return everyone who was waiting on it.
    pub fn complete(&mut self, contact: Contact) -> Vec<NotificationId> {
        let waiters = self.in_flight.remove(&contact.handle).unwrap_or_default();
        self.insert(contact);
        waiters
    }

    /// Forget an in-flight lookup so the next render pass can retry.
    pub fn abandon(&mut self, handle: &str) -> Vec<NotificationId> {
        self.in_flight.remove(handle).unwrap_or_default()
    }
}
