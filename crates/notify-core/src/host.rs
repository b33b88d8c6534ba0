//! Seams to the collaborators that live outside the engine.
//!
//! The engine never talks to a transport, a UI or attribute storage
//! directly. Each concern is one small trait, bundled in [`Collaborators`]
//! when the engine is constructed. The `Memory*` / `Recording*` types are
//! in-process implementations for tests and offline replay; their clones
//! share state so a caller can keep a handle for inspection.

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::model::{Notification, NotificationId};
use crate::render::RenderItem;

/// Persisted last-seen dynamic notification id.
pub trait WatermarkStore {
    /// # Errors
    ///
    /// Returns an error when the stored value cannot be read.
    fn load(&mut self) -> anyhow::Result<u64>;

    /// # Errors
    ///
    /// Returns an error when the value cannot be written.
    fn save(&mut self, watermark: u64) -> anyhow::Result<()>;
}

/// Telemetry, cross-session broadcast and server acknowledgement.
pub trait Signals {
    /// Record a telemetry event.
    fn emit(&mut self, event_id: &str, payload: Value);
    /// Tell sibling sessions about a state change.
    fn broadcast(&mut self, topic: &str, payload: Value);
    /// Ask the server to record that the user has seen everything.
    fn acknowledge_seen(&mut self);
}

/// Result of evaluating a scheduled-meeting notification.
#[derive(Debug, Clone, PartialEq)]
pub enum MeetingVerdict {
    /// The meeting cannot be resolved (unknown chat, ambiguous state).
    Rejected,
    /// Nothing to show, e.g. the current user authored the change.
    Zero,
    /// Displayable metadata.
    Metadata(Value),
}

/// Chat subsystem as seen by the counter.
pub trait ChatGate {
    fn is_ready(&self) -> bool;
    fn evaluate_meeting(&self, record: &Notification) -> MeetingVerdict;
}

/// The periodic timer driving the countdown. `start` and `stop` may be
/// called repeatedly; implementations must tolerate that.
pub trait Ticker {
    fn start(&mut self, period: Duration);
    fn stop(&mut self);
}

/// Asynchronous user attribute fetch. The answer comes back through
/// [`crate::engine::Engine::complete_lookup`].
pub trait UserLookup {
    fn request(&mut self, handle: &str);
}

/// The display surface.
pub trait Presenter {
    /// Publish the unseen badge count.
    fn badge(&mut self, unseen: usize);
    /// Show the ordered, render-ready notifications.
    fn present(&mut self, items: &[RenderItem]);
    /// Disable any open interaction tied to `id` (expired promotion).
    fn disable_surface(&mut self, id: &NotificationId);
}

/// Everything the engine needs from the outside world.
pub struct Collaborators {
    pub clock: Box<dyn Clock>,
    pub watermark: Box<dyn WatermarkStore>,
    pub signals: Box<dyn Signals>,
    pub chat: Box<dyn ChatGate>,
    pub ticker: Box<dyn Ticker>,
    pub lookup: Box<dyn UserLookup>,
    pub presenter: Box<dyn Presenter>,
}

impl Default for Collaborators {
    /// System clock, in-memory watermark, and inert everything else.
    fn default() -> Self {
        Self {
            clock: Box::new(SystemClock),
            watermark: Box::new(MemoryWatermark::default()),
            signals: Box::new(RecordingSignals::default()),
            chat: Box::new(StaticChat::default()),
            ticker: Box::new(ManualTicker::default()),
            lookup: Box::new(RecordingLookup::default()),
            presenter: Box::new(RecordingPresenter::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// In-process implementations
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct WatermarkCell {
    value: u64,
    saves: Vec<u64>,
}

/// Watermark held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryWatermark {
    inner: Rc<RefCell<WatermarkCell>>,
}

impl MemoryWatermark {
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(WatermarkCell {
                value,
                saves: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.inner.borrow().value
    }

    /// Every value passed to `save`, in order.
    #[must_use]
    pub fn saves(&self) -> Vec<u64> {
        self.inner.borrow().saves.clone()
    }
}

impl WatermarkStore for MemoryWatermark {
    fn load(&mut self) -> anyhow::Result<u64> {
        Ok(self.inner.borrow().value)
    }

    fn save(&mut self, watermark: u64) -> anyhow::Result<()> {
        let mut cell = self.inner.borrow_mut();
        cell.value = watermark;
        cell.saves.push(watermark);
        Ok(())
    }
}

/// One recorded outbound signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Emit { event_id: String, payload: Value },
    Broadcast { topic: String, payload: Value },
    AcknowledgeSeen,
}

/// Keeps every signal for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSignals {
    log: Rc<RefCell<Vec<Signal>>>,
}

impl RecordingSignals {
    #[must_use]
    pub fn signals(&self) -> Vec<Signal> {
        self.log.borrow().clone()
    }

    #[must_use]
    pub fn acknowledgements(&self) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|s| matches!(s, Signal::AcknowledgeSeen))
            .count()
    }
}

impl Signals for RecordingSignals {
    fn emit(&mut self, event_id: &str, payload: Value) {
        self.log.borrow_mut().push(Signal::Emit {
            event_id: event_id.to_string(),
            payload,
        });
    }

    fn broadcast(&mut self, topic: &str, payload: Value) {
        self.log.borrow_mut().push(Signal::Broadcast {
            topic: topic.to_string(),
            payload,
        });
    }

    fn acknowledge_seen(&mut self) {
        self.log.borrow_mut().push(Signal::AcknowledgeSeen);
    }
}

#[derive(Debug, Default)]
struct ChatState {
    ready: bool,
    verdict: Option<MeetingVerdict>,
}

/// Chat gate with a switchable readiness flag and a fixed meeting verdict.
#[derive(Debug, Clone, Default)]
pub struct StaticChat {
    state: Rc<RefCell<ChatState>>,
}

impl StaticChat {
    pub fn set_ready(&self, ready: bool) {
        self.state.borrow_mut().ready = ready;
    }

    /// Verdict returned for every meeting. Defaults to empty metadata.
    pub fn set_verdict(&self, verdict: MeetingVerdict) {
        self.state.borrow_mut().verdict = Some(verdict);
    }
}

impl ChatGate for StaticChat {
    fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    fn evaluate_meeting(&self, _record: &Notification) -> MeetingVerdict {
        self.state
            .borrow()
            .verdict
            .clone()
            .unwrap_or(MeetingVerdict::Metadata(Value::Null))
    }
}

#[derive(Debug, Default)]
struct TickerState {
    running: bool,
    starts: usize,
    stops: usize,
}

/// Ticker that only records start/stop; the caller drives ticks by hand.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    state: Rc<RefCell<TickerState>>,
}

impl ManualTicker {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    #[must_use]
    pub fn starts(&self) -> usize {
        self.state.borrow().starts
    }

    #[must_use]
    pub fn stops(&self) -> usize {
        self.state.borrow().stops
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, _period: Duration) {
        let mut state = self.state.borrow_mut();
        if !state.running {
            state.running = true;
            state.starts += 1;
        }
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.running {
            state.running = false;
            state.stops += 1;
        }
    }
}

/// Records requested handles.
#[derive(Debug, Clone, Default)]
pub struct RecordingLookup {
    requests: Rc<RefCell<Vec<String>>>,
}

impl RecordingLookup {
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl UserLookup for RecordingLookup {
    fn request(&mut self, handle: &str) {
        self.requests.borrow_mut().push(handle.to_string());
    }
}

#[derive(Debug, Default)]
struct PresenterState {
    badges: Vec<usize>,
    last_items: Vec<RenderItem>,
    presentations: usize,
    disabled: Vec<NotificationId>,
}

/// Keeps the last presented list, every badge value and disabled ids.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    state: Rc<RefCell<PresenterState>>,
}

impl RecordingPresenter {
    #[must_use]
    pub fn last_badge(&self) -> Option<usize> {
        self.state.borrow().badges.last().copied()
    }

    #[must_use]
    pub fn badges(&self) -> Vec<usize> {
        self.state.borrow().badges.clone()
    }

    #[must_use]
    pub fn last_items(&self) -> Vec<RenderItem> {
        self.state.borrow().last_items.clone()
    }

    #[must_use]
    pub fn presentations(&self) -> usize {
        self.state.borrow().presentations
    }

    #[must_use]
    pub fn disabled(&self) -> Vec<NotificationId> {
        self.state.borrow().disabled.clone()
    }
}

impl Presenter for RecordingPresenter {
    fn badge(&mut self, unseen: usize) {
        self.state.borrow_mut().badges.push(unseen);
    }

    fn present(&mut self, items: &[RenderItem]) {
        let mut state = self.state.borrow_mut();
        state.last_items = items.to_vec();
        state.presentations += 1;
    }

    fn disable_surface(&mut self, id: &NotificationId) {
        self.state.borrow_mut().disabled.push(id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_watermark_records_saves() -> anyhow::Result<()> {
        let handle = MemoryWatermark::new(4);
        let mut store = handle.clone();
        assert_eq!(store.load()?, 4);
        store.save(9)?;
        assert_eq!(handle.value(), 9);
        assert_eq!(handle.saves(), vec![9]);
        Ok(())
    }

    #[test]
    fn manual_ticker_start_stop_are_idempotent() {
        let handle = ManualTicker::default();
        let mut ticker = handle.clone();
        ticker.start(Duration::from_secs(1));
        ticker.start(Duration::from_secs(1));
        assert!(handle.is_running());
        assert_eq!(handle.starts(), 1);
        ticker.stop();
        ticker.stop();
        assert!(!handle.is_running());
        assert_eq!(handle.stops(), 1);
    }

    #[test]
    fn static_chat_defaults_to_not_ready() {
        let chat = StaticChat::default();
        assert!(!chat.is_ready());
        chat.set_ready(true);
        assert!(chat.is_ready());
    }
}
