//! Notification store and seen-state tracking.
//!
//! Records are kept newest-appended-first: index 0 is always the record the
//! combiner compares against. Recency order for display is a separate,
//! materialised view (see [`crate::sort`]).
//!
//! Seen state comes in two flavours:
//!
//! - local records carry a `seen` flag that only ever goes from `false` to
//!   `true`;
//! - dynamic records are seen iff their id is at or below the watermark, the
//!   highest dynamic id the user acknowledged. The watermark never regresses.

use std::collections::HashSet;

use crate::combine::{CombineRules, Folded, fold_into};
use crate::model::{DynamicData, Notification, NotificationData};

/// Outcome of [`Store::mark_all_seen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeenChange {
    /// Local records flipped from unseen to seen.
    pub marked: usize,
    /// New watermark, when it moved.
    pub advanced_to: Option<u64>,
}

impl SeenChange {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.marked == 0 && self.advanced_to.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Store {
    records: Vec<Notification>,
    watermark: u64,
}

impl Store {
    #[must_use]
    pub const fn new(watermark: u64) -> Self {
        Self {
            records: Vec::new(),
            watermark,
        }
    }

    /// Records in canonical (newest-appended-first) order.
    #[must_use]
    pub fn records(&self) -> &[Notification] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn watermark(&self) -> u64 {
        self.watermark
    }

    /// Raise the watermark to `id` if it is higher. Returns whether it moved.
    pub fn raise_watermark(&mut self, id: u64) -> bool {
        if id > self.watermark {
            self.watermark = id;
            true
        } else {
            false
        }
    }

    pub fn fold(&mut self, record: Notification, rules: &CombineRules) -> Folded {
        fold_into(&mut self.records, record, rules)
    }

    #[must_use]
    pub fn find_dynamic(&self, id: u64) -> Option<&Notification> {
        self.records.iter().find(|r| r.dynamic_id() == Some(id))
    }

    pub fn dynamic_data_mut(&mut self, id: u64) -> Option<&mut DynamicData> {
        self.records
            .iter_mut()
            .find(|r| r.dynamic_id() == Some(id))
            .and_then(|r| match &mut r.data {
                NotificationData::Dynamic(data) => Some(data),
                _ => None,
            })
    }

    /// Ids of every dynamic record held.
    pub fn dynamic_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.iter().filter_map(Notification::dynamic_id)
    }

    /// Mark every local record seen and lift the watermark to the highest
    /// dynamic id held.
    pub fn mark_all_seen(&mut self) -> SeenChange {
        let mut marked = 0;
        for record in self.records.iter_mut().filter(|r| !r.is_dynamic()) {
            if !record.seen {
                record.seen = true;
                marked += 1;
            }
        }

        let highest = self.dynamic_ids().max();
        let advanced_to = highest.filter(|&max| self.raise_watermark(max));

        SeenChange {
            marked,
            advanced_to,
        }
    }

    /// Remove a dynamic record. Returns it when it was held.
    pub fn remove_dynamic(&mut self, id: u64) -> Option<Notification> {
        let idx = self.records.iter().position(|r| r.dynamic_id() == Some(id))?;
        Some(self.records.remove(idx))
    }

    /// Drop every dynamic record whose id is not in `valid`. Returns the
    /// evicted ids.
    pub fn retain_dynamic(&mut self, valid: &HashSet<u64>) -> Vec<u64> {
        let mut evicted = Vec::new();
        self.records.retain(|r| match r.dynamic_id() {
            Some(id) if !valid.contains(&id) => {
                evicted.push(id);
                false
            }
            _ => true,
        });
        evicted
    }
}
