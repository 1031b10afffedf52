//! Background polling.
//!
//! A [`PollingStore`] owns one refresh loop: on every tick it calls its
//! [`DataSource`], folds the returned batch into the current [`Snapshot`]
//! according to a [`MergePolicy`], and publishes the result on a
//! [`watch`] channel that any number of panels can subscribe to.
//!
//! ## Timing
//!
//! The first fetch happens one interval after [`PollingStore::start`] unless
//! [`StoreConfig::eager_first_fetch`] is set.  Ticks are never delayed by a
//! slow fetch: each fetch runs in its own task, so requests can overlap.
//!
//! ## Overlapping requests
//!
//! Every fetch gets a sequence number when it starts.  A completion is only
//! applied if its number is higher than the last applied one, so a slow old
//! response can never overwrite a newer one.  Completions that arrive after
//! [`PollingStore::stop`] are dropped as well.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, StoreError};
use crate::source::DataSource;

/// How a freshly fetched batch is combined with the records already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// The new batch overwrites the snapshot.
    #[default]
    Replace,
    /// The new batch is appended; the snapshot grows without bound.
    Append,
}

impl MergePolicy {
    pub fn apply<T>(self, records: &mut Vec<T>, batch: Vec<T>) {
        match self {
            MergePolicy::Replace => *records = batch,
            MergePolicy::Append => records.extend(batch),
        }
    }
}

/// Outcome of the most recent applied fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    /// Only shown while the very first fetch is in flight.
    Loading,
    Ready,
    Error(String),
}

impl FetchState {
    pub fn is_error(&self) -> bool {
        matches!(self, FetchState::Error(_))
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Idle => f.write_str("idle"),
            FetchState::Loading => f.write_str("loading"),
            FetchState::Ready => f.write_str("ready"),
            FetchState::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// What subscribers see: the records plus the state that produced them.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Insertion-ordered records; newest batch last under `Append`.
    pub records: Vec<T>,
    pub state: FetchState,
    /// Wall-clock time of the last successful merge.
    pub updated_at: Option<DateTime<Utc>>,
    /// Sequence number of the last applied completion (0 = none yet).
    pub generation: u64,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            state: FetchState::Idle,
            updated_at: None,
            generation: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub interval: Duration,
    pub merge_policy: MergePolicy,
    /// Fire one fetch immediately on `start` instead of waiting a full interval.
    pub eager_first_fetch: bool,
}

impl StoreConfig {
    pub fn new(interval: Duration, merge_policy: MergePolicy) -> Self {
        Self {
            interval,
            merge_policy,
            eager_first_fetch: false,
        }
    }

    pub fn eager(mut self, eager: bool) -> Self {
        self.eager_first_fetch = eager;
        self
    }
}

/// State shared between the store handle, its loop task and its fetch tasks.
struct Shared<T> {
    source: Arc<dyn DataSource<Record = T>>,
    merge_policy: MergePolicy,
    next_seq: AtomicU64,
    tx: watch::Sender<Snapshot<T>>,
    cancel: CancellationToken,
}

impl<T> Shared<T> {
    /// Cancel while holding the snapshot lock, so no completion can be
    /// applied once this returns.  Returns `false` if already cancelled.
    fn shut_down(&self) -> bool {
        let mut first = false;
        self.tx.send_if_modified(|_| {
            first = !self.cancel.is_cancelled();
            self.cancel.cancel();
            false
        });
        first
    }
}

/// A periodically refreshed, subscribable sequence of records.
pub struct PollingStore<T> {
    config: StoreConfig,
    started: AtomicBool,
    shared: Arc<Shared<T>>,
}

impl<T> PollingStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Build a store around `source`.  Nothing is fetched until [`start`](Self::start).
    pub fn new(
        config: StoreConfig,
        source: Arc<dyn DataSource<Record = T>>,
    ) -> Result<Self, StoreError> {
        if config.interval.is_zero() {
            return Err(StoreError::InvalidInterval);
        }

        let (tx, _rx) = watch::channel(Snapshot::default());
        Ok(Self {
            config,
            started: AtomicBool::new(false),
            shared: Arc::new(Shared {
                source,
                merge_policy: config.merge_policy,
                next_seq: AtomicU64::new(0),
                tx,
                cancel: CancellationToken::new(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        self.shared.source.name()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Begin ticking on the ambient tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime context.
    pub fn start(&self) -> Result<(), StoreError> {
        if self.shared.cancel.is_cancelled() {
            return Err(StoreError::Stopped);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(StoreError::AlreadyRunning);
        }

        tracing::info!(
            source = self.name(),
            interval_ms = self.config.interval.as_millis() as u64,
            merge = ?self.config.merge_policy,
            eager = self.config.eager_first_fetch,
            "polling started"
        );

        if self.config.eager_first_fetch {
            spawn_fetch(&self.shared);
        }

        let first_tick = Instant::now() + self.config.interval;
        let shared = Arc::clone(&self.shared);
        let interval = self.config.interval;
        tokio::spawn(async move {
            tick_loop(shared, first_tick, interval).await;
        });

        Ok(())
    }

    /// Cancel the timer.  Fetches already in flight finish but are discarded.
    ///
    /// Safe to call any number of times.
    pub fn stop(&self) {
        if self.shared.shut_down() {
            tracing::info!(source = self.name(), "polling stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Issue one fetch outside the regular schedule.
    pub fn fetch_now(&self) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        spawn_fetch(&self.shared);
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.shared.tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.shared.tx.borrow().clone()
    }
}

impl<T> Drop for PollingStore<T> {
    fn drop(&mut self) {
        // The loop task holds its own `Arc`; cancelling is what ends it.
        self.shared.shut_down();
    }
}

async fn tick_loop<T>(shared: Arc<Shared<T>>, first_tick: Instant, interval: Duration)
where
    T: Clone + Send + Sync + 'static,
{
    let mut ticker = time::interval_at(first_tick, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = ticker.tick() => spawn_fetch(&shared),
        }
    }

    tracing::debug!(source = shared.source.name(), "tick loop exited");
}

fn spawn_fetch<T>(shared: &Arc<Shared<T>>)
where
    T: Clone + Send + Sync + 'static,
{
    let seq = shared.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

    shared.tx.send_if_modified(|snap| {
        if snap.state == FetchState::Idle {
            snap.state = FetchState::Loading;
            true
        } else {
            false
        }
    });

    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        tracing::debug!(source = shared.source.name(), seq, "fetch started");
        let result = shared.source.fetch().await;
        complete(&shared, seq, result);
    });
}

fn complete<T>(shared: &Shared<T>, seq: u64, result: Result<Vec<T>, FetchError>)
where
    T: Clone + Send + Sync + 'static,
{
    let source = shared.source.name();
    let error = result.as_ref().err().map(ToString::to_string);
    let policy = shared.merge_policy;
    let mut cancelled = false;

    // The stop check shares the lock with `Shared::shut_down`.
    let applied = shared.tx.send_if_modified(|snap| {
        if shared.cancel.is_cancelled() {
            cancelled = true;
            return false;
        }
        if seq <= snap.generation {
            return false;
        }
        snap.generation = seq;
        match result {
            Ok(batch) => {
                let batch = match policy {
                    MergePolicy::Append => shared.source.dedupe_appended(&snap.records, batch),
                    MergePolicy::Replace => batch,
                };
                policy.apply(&mut snap.records, batch);
                snap.state = FetchState::Ready;
                snap.updated_at = Some(Utc::now());
            }
            Err(e) => {
                // Existing records stay visible.
                snap.state = FetchState::Error(e.to_string());
            }
        }
        true
    });

    match (applied, error) {
        _ if cancelled => tracing::debug!(source, seq, "discarding completion after stop"),
        (false, _) => tracing::debug!(source, seq, "discarding stale completion"),
        (true, Some(error)) => tracing::warn!(source, seq, %error, "fetch failed"),
        (true, None) => tracing::debug!(source, seq, "fetch applied"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
