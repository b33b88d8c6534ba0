//! The notification service.
//!
//! One [`Engine`] is built per session. It owns the store, the watermark,
//! the countdown and the user directory, and reaches everything outside
//! through [`Collaborators`]. All mutation goes through `&mut self`, so
//! the host's event loop serialises it; every method leaves the store
//! consistent before returning.
//!
//! # Load barrier
//!
//! Until [`Engine::load_bulk`] has run, live events are queued in arrival
//! order instead of applied, and the unseen count reads zero. The queue is
//! drained right after the bulk batch is folded in. A failed bulk fetch
//! ([`Engine::bulk_failed`]) keeps the barrier closed; a later successful
//! `load_bulk` still opens it.

use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, trace, warn};

use crate::combine::{CombineRules, Folded};
use crate::config::EngineConfig;
use crate::countdown::{Countdown, Registration, format_remaining};
use crate::counter::{CountContext, count_unseen};
use crate::directory::{Contact, Lookup, UserDirectory};
use crate::error::{ErrorCode, IngestError};
use crate::filter::is_unwanted;
use crate::host::Collaborators;
use crate::model::{
    BulkFetch, CallToAction, DynamicData, IncomingEvent, Notification, NotificationData,
    NotificationId, NotificationKind, RawEvent,
};
use crate::render::{RenderItem, Rendered, describe};
use crate::sort::sort_for_display;
use crate::store::Store;

/// Telemetry id emitted when the user marks everything seen.
pub const EVENT_MARK_ALL_SEEN: &str = "notify.mark_all_seen";
/// Telemetry id emitted when a promotion expires.
pub const EVENT_DYNAMIC_EXPIRED: &str = "notify.dynamic_expired";
/// Telemetry id emitted on promotion click-through.
pub const EVENT_DYNAMIC_CLICK: &str = "notify.dynamic_click";
/// Cross-session topic for expired promotions.
pub const TOPIC_DYNAMIC_EXPIRED: &str = "notify.dynamic_expired";

/// Where a mark-all-seen request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenOrigin {
    /// The user acted in this session; the server must be told.
    Local,
    /// Another session already told the server; only mirror the state.
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Waiting,
    Loaded,
    /// The bulk fetch failed. Counting and rendering stay blocked.
    Failed,
}

#[derive(Debug, Clone)]
enum Deferred {
    Raw(RawEvent),
    Dynamic(DynamicData),
}

pub struct Engine {
    config: EngineConfig,
    rules: CombineRules,
    store: Store,
    countdown: Countdown,
    directory: UserDirectory,
    host: Collaborators,
    load: LoadState,
    deferred: VecDeque<Deferred>,
    surface_open: bool,
    seq: u64,
}

impl Engine {
    /// Build an engine, reading the persisted watermark. An unreadable
    /// watermark falls back to 0.
    #[must_use]
    pub fn new(config: EngineConfig, mut host: Collaborators) -> Self {
        let watermark = host.watermark.load().unwrap_or_else(|err| {
            warn!(
                code = %ErrorCode::WatermarkUnavailable,
                error = %err,
                hint = ErrorCode::WatermarkUnavailable.hint().unwrap_or_default(),
                "{}", ErrorCode::WatermarkUnavailable.message()
            );
            0
        });

        Self {
            rules: CombineRules {
                window_secs: config.combine_window_secs,
            },
            countdown: Countdown::new(
                config.countdown_horizon_secs,
                Duration::from_millis(config.tick_interval_ms),
            ),
            config,
            store: Store::new(watermark),
            directory: UserDirectory::new(),
            host,
            load: LoadState::Waiting,
            deferred: VecDeque::new(),
            surface_open: false,
            seq: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn load_state(&self) -> LoadState {
        self.load
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.load == LoadState::Loaded
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn watermark(&self) -> u64 {
        self.store.watermark()
    }

    #[must_use]
    pub const fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    #[must_use]
    pub const fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Live events waiting for the bulk barrier.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Fold the initial batch in, open the barrier and apply queued live
    /// events. A second batch after a successful load is ignored.
    pub fn load_bulk(&mut self, bulk: BulkFetch) {
        if self.is_loaded() {
            warn!("bulk notifications already loaded; ignoring second batch");
            return;
        }

        for pending in bulk.pending_contacts {
            self.directory.insert(Contact::from(pending));
        }

        let now = self.host.clock.now();
        let ltd = bulk.last_time_delta;
        let total = bulk.events.len();

        // The server lists newest first; fold oldest first so index 0 is
        // always the newest record seen so far. Equal ages keep wire order.
        let mut events = bulk.events;
        events.reverse();
        events.sort_by_key(|raw| Reverse(raw.time_delta));

        for raw in events {
            let Some(event) = self.accept(raw, false) else {
                continue;
            };
            let seen = event.time_delta >= ltd;
            self.fold_event(event, seen, now);
        }

        self.load = LoadState::Loaded;
        info!(
            events = total,
            held = self.store.len(),
            server_count = bulk.count,
            "initial notifications loaded"
        );

        while let Some(deferred) = self.deferred.pop_front() {
            match deferred {
                Deferred::Raw(raw) => self.apply_live_now(raw),
                Deferred::Dynamic(data) => self.apply_dynamic_now(data),
            }
        }

        self.refresh();
    }

    /// Record that the bulk fetch failed. The barrier stays closed.
    pub fn bulk_failed(&mut self, reason: &str) {
        if self.is_loaded() {
            return;
        }
        self.load = LoadState::Failed;
        warn!(
            code = %ErrorCode::InitialLoadFailed,
            reason,
            hint = ErrorCode::InitialLoadFailed.hint().unwrap_or_default(),
            queued = self.deferred.len(),
            "{}", ErrorCode::InitialLoadFailed.message()
        );
    }

    /// Apply one live action packet, or queue it behind the load barrier.
    pub fn apply_live(&mut self, raw: RawEvent) {
        if !self.is_loaded() {
            self.deferred.push_back(Deferred::Raw(raw));
            return;
        }
        self.apply_live_now(raw);
        self.refresh();
    }

    /// Ingest a promotional notice, keyed by its id.
    pub fn ingest_dynamic(&mut self, data: DynamicData) {
        if !self.is_loaded() {
            self.deferred.push_back(Deferred::Dynamic(data));
            return;
        }
        self.apply_dynamic_now(data);
        self.refresh();
    }

    fn apply_live_now(&mut self, raw: RawEvent) {
        if let Some(event) = self.accept(raw, true) {
            let now = self.host.clock.now();
            self.fold_event(event, false, now);
        }
    }

    fn apply_dynamic_now(&mut self, data: DynamicData) {
        let event = IncomingEvent {
            kind: NotificationKind::Dynamic,
            data: NotificationData::Dynamic(data),
            user_handle: None,
            origin_user: None,
            time_delta: 0,
        };
        let now = self.host.clock.now();
        self.fold_event(event, false, now);
    }

    /// Decode and filter a raw event. Everything rejected is dropped here.
    fn accept(&self, raw: RawEvent, live: bool) -> Option<IncomingEvent> {
        let event = match raw.parse() {
            Ok(event) => event,
            Err(err @ (IngestError::UnknownKind { .. } | IngestError::MissingKind)) => {
                trace!(error = %err, "dropping notification");
                return None;
            }
            Err(err) => {
                debug!(code = %err.code(), error = %err, "dropping notification");
                return None;
            }
        };

        if live
            && event.origin_user.is_some()
            && event.origin_user.as_deref() == self.config.self_handle.as_deref()
        {
            trace!(kind = %event.kind, "dropping self-originated notification");
            return None;
        }

        if is_unwanted(&event, &self.config.preferences) {
            trace!(kind = %event.kind, "dropping unwanted notification");
            return None;
        }

        Some(event)
    }

    fn fold_event(&mut self, event: IncomingEvent, seen: bool, now: i64) {
        if let NotificationData::Dynamic(data) = &event.data {
            if data.expiry.is_some_and(|expiry| expiry <= now) {
                debug!(id = data.id, "dropping expired dynamic notification");
                return;
            }
        }

        let record = self.build_record(event, seen, now);
        let dynamic = record.dynamic_id().zip(record.expiry());

        if self.store.fold(record, &self.rules) == Folded::Inserted {
            if let Some((id, expiry)) = dynamic {
                self.track_expiry(id, expiry, now);
            }
        }
    }

    fn build_record(&mut self, event: IncomingEvent, seen: bool, now: i64) -> Notification {
        let (id, timestamp) = match &event.data {
            NotificationData::Dynamic(d) => (NotificationId::Dynamic(d.id), d.start.unwrap_or(now)),
            _ => {
                let timestamp = now - event.time_delta;
                (self.next_local_id(&event, timestamp), timestamp)
            }
        };

        Notification {
            id,
            kind: event.kind,
            all_data_items: event.data.node_handles(),
            data: event.data,
            user_handle: event.user_handle,
            timestamp,
            time_delta: event.time_delta,
            seen,
        }
    }

    fn next_local_id(&mut self, event: &IncomingEvent, timestamp: i64) -> NotificationId {
        self.seq += 1;
        let mut hasher = blake3::Hasher::new();
        hasher.update(event.kind.as_str().as_bytes());
        hasher.update(event.user_handle.as_deref().unwrap_or_default().as_bytes());
        hasher.update(&timestamp.to_le_bytes());
        hasher.update(&self.seq.to_le_bytes());
        let hex = hasher.finalize().to_hex();
        NotificationId::Local(format!("n-{}", &hex.as_str()[..16]))
    }

    fn track_expiry(&mut self, id: u64, expiry: i64, now: i64) -> Registration {
        let outcome = self
            .countdown
            .register(id, expiry, now, self.host.ticker.as_mut());
        if outcome == Registration::Registered {
            if let Some(data) = self.store.dynamic_data_mut(id) {
                data.remaining = Some(format_remaining(expiry - now));
            }
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Seen state
    // -----------------------------------------------------------------------

    /// Mark every notification seen.
    ///
    /// The watermark is written at most once per call, and only when it
    /// moved. A [`SeenOrigin::Remote`] call skips the server
    /// acknowledgement and the telemetry event.
    pub fn mark_all_seen(&mut self, origin: SeenOrigin) {
        let change = self.store.mark_all_seen();
        if change.is_noop() {
            trace!(?origin, "nothing new to mark seen");
        }

        if let Some(watermark) = change.advanced_to {
            if let Err(err) = self.host.watermark.save(watermark) {
                warn!(
                    code = %ErrorCode::WatermarkWriteFailed,
                    watermark,
                    error = %err,
                    hint = ErrorCode::WatermarkWriteFailed.hint().unwrap_or_default(),
                    "{}", ErrorCode::WatermarkWriteFailed.message()
                );
            }
        }

        if origin == SeenOrigin::Local {
            self.host.signals.acknowledge_seen();
            self.host.signals.emit(
                EVENT_MARK_ALL_SEEN,
                json!({ "marked": change.marked, "watermark": self.store.watermark() }),
            );
        }

        debug!(
            ?origin,
            marked = change.marked,
            watermark = self.store.watermark(),
            "marked all notifications seen"
        );
        self.refresh();
    }

    // -----------------------------------------------------------------------
    // Reconciliation and countdown
    // -----------------------------------------------------------------------

    /// Drop every held dynamic notification whose id is not in `valid_ids`.
    pub fn reconcile_dynamic(&mut self, valid_ids: &[u64]) {
        let valid: HashSet<u64> = valid_ids.iter().copied().collect();
        let evicted = self.store.retain_dynamic(&valid);
        if evicted.is_empty() {
            return;
        }

        for id in &evicted {
            self.countdown.unregister(*id, self.host.ticker.as_mut());
        }
        debug!(?evicted, "reconciled dynamic notifications");
        self.refresh();
    }

    /// One countdown tick: refresh remaining-time text and evict whatever
    /// reached zero.
    pub fn on_tick(&mut self) {
        let now = self.host.clock.now();
        let mut evicted = self.refresh_countdown(now);
        let tick = self.countdown.tick(now, self.host.ticker.as_mut());

        for (id, text) in tick.updates {
            if let Some(data) = self.store.dynamic_data_mut(id) {
                data.remaining = Some(text);
            }
        }

        for id in tick.expired {
            self.expire_dynamic(id);
            evicted += 1;
        }

        if evicted > 0 {
            self.refresh();
        } else if self.surface_open {
            self.present();
        }
    }

    /// Register any held dynamic notification that has come within the
    /// countdown horizon since it was ingested, and evict the ones whose
    /// expiry passed before they were ever tracked. Returns how many were
    /// evicted.
    fn refresh_countdown(&mut self, now: i64) -> usize {
        let candidates: Vec<(u64, i64)> = self
            .store
            .records()
            .iter()
            .filter_map(|r| r.dynamic_id().zip(r.expiry()))
            .filter(|(id, _)| !self.countdown.is_tracked(*id))
            .collect();

        let mut evicted = 0;
        for (id, expiry) in candidates {
            if self.track_expiry(id, expiry, now) == Registration::Expired {
                self.expire_dynamic(id);
                evicted += 1;
            }
        }
        evicted
    }

    /// Withdraw an expired promotion: close its surface, tell sibling
    /// sessions, record telemetry and drop it from the store.
    fn expire_dynamic(&mut self, id: u64) {
        self.countdown.unregister(id, self.host.ticker.as_mut());
        self.host
            .presenter
            .disable_surface(&NotificationId::Dynamic(id));
        self.host
            .signals
            .broadcast(TOPIC_DYNAMIC_EXPIRED, json!({ "id": id }));
        self.host
            .signals
            .emit(EVENT_DYNAMIC_EXPIRED, json!({ "id": id }));
        self.store.remove_dynamic(id);
        info!(id, "dynamic notification expired");
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    /// Badge count. Zero until the initial load completed.
    #[must_use]
    pub fn unseen_count(&self) -> usize {
        if !self.is_loaded() {
            return 0;
        }
        let ctx = CountContext {
            now: self.host.clock.now(),
            watermark: self.store.watermark(),
            chat: self.host.chat.as_ref(),
        };
        count_unseen(self.store.records(), &ctx)
    }

    /// Records in display order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Notification> {
        sort_for_display(self.store.records())
    }

    /// Build the ordered descriptors for a render pass.
    ///
    /// Records whose actor name is not known yet are left out and a lookup
    /// is requested for them (once per handle); they show up on a later
    /// pass after [`Engine::complete_lookup`].
    pub fn render_pass(&mut self) -> Vec<RenderItem> {
        if !self.is_loaded() {
            return Vec::new();
        }

        let now = self.host.clock.now();
        if self.refresh_countdown(now) > 0 {
            let unseen = self.unseen_count();
            self.host.presenter.badge(unseen);
        }

        let watermark = self.store.watermark();
        let mut items = Vec::new();
        let mut missing = Vec::new();

        for record in sort_for_display(self.store.records()) {
            if record.is_expired(now) {
                continue;
            }
            match describe(record, &self.directory, watermark) {
                Rendered::Ready(item) => items.push(item),
                Rendered::Pending { handle } => missing.push((handle, record.id.clone())),
            }
        }

        for (handle, waiter) in missing {
            if self.directory.request(&handle, waiter) == Lookup::Issue {
                debug!(handle = %handle, "requesting user lookup");
                self.host.lookup.request(&handle);
            }
        }

        items
    }

    /// A user lookup finished. Re-renders if anything was waiting on it and
    /// a surface is open.
    pub fn complete_lookup(&mut self, contact: Contact) {
        let waiters = self.directory.complete(contact);
        if !waiters.is_empty() && self.surface_open {
            self.present();
        }
    }

    /// A user lookup failed. The affected records stay pending and the next
    /// render pass asks again.
    pub fn lookup_failed(&mut self, handle: &str) {
        if !self.directory.is_in_flight(handle) {
            trace!(handle, "ignoring failure for a lookup that is not in flight");
            return;
        }
        let waiters = self.directory.abandon(handle);
        debug!(handle, waiting = waiters.len(), "user lookup failed");
    }

    // -----------------------------------------------------------------------
    // Display surface
    // -----------------------------------------------------------------------

    pub fn open_surface(&mut self) {
        self.surface_open = true;
        self.present();
    }

    pub fn close_surface(&mut self) {
        self.surface_open = false;
    }

    #[must_use]
    pub const fn is_surface_open(&self) -> bool {
        self.surface_open
    }

    /// Click-through on a promotion. Returns its call to action, if any.
    pub fn activate_dynamic(&mut self, id: u64) -> Option<CallToAction> {
        let NotificationData::Dynamic(data) = &self.store.find_dynamic(id)?.data else {
            return None;
        };
        let action = data.primary_action.clone();
        self.host.signals.emit(
            EVENT_DYNAMIC_CLICK,
            json!({ "id": id, "link": action.as_ref().map(|a| a.link.clone()) }),
        );
        action
    }

    /// Re-publish the badge, and re-render while a surface is open.
    fn refresh(&mut self) {
        if !self.is_loaded() {
            return;
        }
        let unseen = self.unseen_count();
        self.host.presenter.badge(unseen);
        if self.surface_open {
            self.present();
        }
    }

    fn present(&mut self) {
        if !self.is_loaded() {
            return;
        }
        let items = self.render_pass();
        self.host.presenter.present(&items);
    }
}
