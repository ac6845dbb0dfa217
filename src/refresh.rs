//! Keeps a derived view fresh by re-fetching it on activation, on topic
//! publishes, and on a fixed interval.
//!
//! Fetches are never coalesced. Each one gets a request number when issued,
//! and results are applied in the order they complete, so the view always
//! holds the most recently completed response. Once the handle is dropped,
//! late responses are discarded.

use crate::sync::{Subscription, SyncBus, Topic};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// What caused a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Activation,
    Topic(Topic),
    Interval,
    Manual,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "view", rename_all = "snake_case")]
pub enum ViewState<T> {
    /// Nothing has completed yet.
    Pending,
    Ready(Arc<T>),
    /// The last completed fetch failed.
    Unavailable(String),
}

impl<T> Clone for ViewState<T> {
    fn clone(&self) -> Self {
        match self {
            ViewState::Pending => ViewState::Pending,
            ViewState::Ready(view) => ViewState::Ready(Arc::clone(view)),
            ViewState::Unavailable(reason) => ViewState::Unavailable(reason.clone()),
        }
    }
}

impl<T> ViewState<T> {
    pub fn ready(&self) -> Option<&Arc<T>> {
        match self {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViewSnapshot<T> {
    #[serde(flatten)]
    pub state: ViewState<T>,
    /// Request number of the fetch whose result is shown; 0 before any.
    pub request: u64,
    /// How many results have been applied so far.
    pub completion: u64,
}

impl<T> Clone for ViewSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            request: self.request,
            completion: self.completion,
        }
    }
}

impl<T> ViewSnapshot<T> {
    fn pending() -> Self {
        Self {
            state: ViewState::Pending,
            request: 0,
            completion: 0,
        }
    }
}

struct Slot<T> {
    active: AtomicBool,
    requests: AtomicU64,
    completions: Mutex<u64>,
    tx: watch::Sender<ViewSnapshot<T>>,
}

impl<T> Slot<T> {
    fn next_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply(&self, request: u64, state: ViewState<T>) -> bool {
        let mut completions = self.completions.lock();
        if !self.active.load(Ordering::SeqCst) {
            return false;
        }
        *completions += 1;
        self.tx.send_replace(ViewSnapshot {
            state,
            request,
            completion: *completions,
        });
        true
    }

    fn deactivate(&self) {
        let _completions = self.completions.lock();
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Builder for a refreshing view over one fetch function.
#[derive(Clone)]
pub struct RefreshScheduler {
    bus: SyncBus,
    topics: Vec<Topic>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(bus: SyncBus, topics: impl IntoIterator<Item = Topic>) -> Self {
        Self {
            bus,
            topics: topics.into_iter().collect(),
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts refreshing. The first fetch is issued right away.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// handle stops the timer and releases the subscriptions.
    pub fn activate<T, E, F, Fut>(&self, fetch: F) -> RefreshHandle<T>
    where
        T: Send + Sync + 'static,
        E: Display + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, _rx) = watch::channel(ViewSnapshot::pending());
        let slot = Arc::new(Slot {
            active: AtomicBool::new(true),
            requests: AtomicU64::new(0),
            completions: Mutex::new(0),
            tx,
        });
        let (trigger_tx, mut trigger_rx) = mpsc::unbounded_channel();

        let subscriptions = self
            .topics
            .iter()
            .map(|&topic| {
                let trigger_tx = trigger_tx.clone();
                self.bus.subscribe(topic, move || {
                    let _ = trigger_tx.send(Trigger::Topic(topic));
                })
            })
            .collect();

        let fetch = Arc::new(fetch);
        spawn_fetch(&slot, &fetch, Trigger::Activation);

        let period = self.interval;
        let driver_slot = Arc::clone(&slot);
        let driver = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let trigger = tokio::select! {
                    _ = ticker.tick() => Trigger::Interval,
                    received = trigger_rx.recv() => match received {
                        Some(trigger) => trigger,
                        None => break,
                    },
                };
                spawn_fetch(&driver_slot, &fetch, trigger);
            }
        });

        RefreshHandle {
            slot,
            triggers: trigger_tx,
            driver,
            subscriptions,
        }
    }
}

fn spawn_fetch<T, E, F, Fut>(slot: &Arc<Slot<T>>, fetch: &Arc<F>, trigger: Trigger)
where
    T: Send + Sync + 'static,
    E: Display + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let request = slot.next_request();
    debug!(?trigger, request, "refresh requested");
    let pending = fetch();
    let slot = Arc::clone(slot);
    tokio::spawn(async move {
        let state = match pending.await {
            Ok(view) => ViewState::Ready(Arc::new(view)),
            Err(err) => {
                warn!(request, "refresh failed: {err}");
                ViewState::Unavailable(err.to_string())
            }
        };
        if !slot.apply(request, state) {
            debug!(request, "discarding result for deactivated view");
        }
    });
}

/// An active refreshing view. Dropping it deactivates the view.
pub struct RefreshHandle<T> {
    slot: Arc<Slot<T>>,
    triggers: mpsc::UnboundedSender<Trigger>,
    driver: JoinHandle<()>,
    subscriptions: Vec<Subscription>,
}

impl<T> RefreshHandle<T> {
    pub fn watch(&self) -> watch::Receiver<ViewSnapshot<T>> {
        self.slot.tx.subscribe()
    }

    pub fn snapshot(&self) -> ViewSnapshot<T> {
        self.slot.tx.borrow().clone()
    }

    pub fn refresh_now(&self) {
        let _ = self.triggers.send(Trigger::Manual);
    }

    pub fn is_active(&self) -> bool {
        self.slot.active.load(Ordering::SeqCst)
    }

    /// Stops refreshing now; equivalent to dropping the handle.
    pub fn deactivate(self) {
        drop(self);
    }
}

impl<T> Drop for RefreshHandle<T> {
    fn drop(&mut self) {
        self.slot.deactivate();
        self.subscriptions.clear();
        self.driver.abort();
        debug!("refresh view deactivated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
    ) -> impl Fn() -> std::future::Ready<Result<usize, String>> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || std::future::ready(Ok(calls.fetch_add(1, Ordering::SeqCst) + 1))
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_on_activation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = RefreshScheduler::new(SyncBus::new(), Topic::ALL).activate(counting_fetch(&calls));

        sleep(Duration::from_millis(10)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.state.ready().map(|v| **v), Some(1));
        assert_eq!(snapshot.request, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_triggers_refetch() {
        let bus = SyncBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _handle = RefreshScheduler::new(bus.clone(), [Topic::DataUpdated]).activate(counting_fetch(&calls));
        sleep(Duration::from_millis(10)).await;

        bus.publish(Topic::DataUpdated);
        bus.publish(Topic::ProfileUpdated);
        sleep(Duration::from_millis(10)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_keeps_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let _handle = RefreshScheduler::new(SyncBus::new(), Topic::ALL).activate(counting_fetch(&calls));

        sleep(Duration::from_secs(61)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_fetches_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = RefreshScheduler::new(SyncBus::new(), [Topic::ProfileUpdated]).activate(counting_fetch(&calls));
        sleep(Duration::from_millis(10)).await;

        handle.refresh_now();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.snapshot().completion, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn last_completed_fetch_wins_over_last_issued() {
        let bus = SyncBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = RefreshScheduler::new(bus.clone(), [Topic::DataUpdated]).activate(move || {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let delay = if call == 1 { 500 } else { 50 };
                sleep(Duration::from_millis(delay)).await;
                Ok::<_, String>(format!("fetch-{call}"))
            }
        });

        sleep(Duration::from_millis(10)).await;
        bus.publish(Topic::DataUpdated);

        sleep(Duration::from_millis(100)).await;
        let early = handle.snapshot();
        assert_eq!(early.state.ready().map(|v| v.as_str()), Some("fetch-2"));
        assert_eq!(early.request, 2);

        sleep(Duration::from_secs(1)).await;
        let settled = handle.snapshot();
        assert_eq!(settled.state.ready().map(|v| v.as_str()), Some("fetch-1"));
        assert_eq!(settled.request, 1);
        assert_eq!(settled.completion, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_marks_view_unavailable() {
        let handle = RefreshScheduler::new(SyncBus::new(), [Topic::ProfileUpdated])
            .activate(|| async { Err::<u32, _>("backend down".to_string()) });

        sleep(Duration::from_millis(10)).await;

        match handle.snapshot().state {
            ViewState::Unavailable(reason) => assert_eq!(reason, "backend down"),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_stops_fetches_and_drops_late_results() {
        let bus = SyncBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = RefreshScheduler::new(bus.clone(), Topic::ALL).activate(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                sleep(Duration::from_millis(200)).await;
                Ok::<_, String>(42)
            }
        });
        let mut updates = handle.watch();
        assert_eq!(bus.subscriber_count(Topic::DataUpdated), 1);

        handle.deactivate();
        bus.publish(Topic::DataUpdated);
        sleep(Duration::from_secs(90)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(Topic::DataUpdated), 0);
        assert!(matches!(updates.borrow_and_update().state, ViewState::Pending));
    }
}
