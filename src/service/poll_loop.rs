//! The periodic fetch, diff, dispatch cycle.
//!
//! The diff baseline is explicit state: [`PollLoop::run_cycle`] takes the
//! previous [`PollState`] and returns the next one, and only [`PollLoop::run`]
//! holds it between cycles. Other components see snapshots and reports
//! through `watch` channels, never the baseline itself.
//!
//! The baseline is replaced after every cycle, degraded or not, and
//! whether or not delivery succeeded. It lives in memory only, so the
//! first cycle after a restart is silent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use super::dispatcher::{DispatchReport, Dispatcher};
use crate::chat::ChatTransport;
use crate::domain::{FeedCategory, Snapshot, diff};
use crate::feed::{FeedSource, Normalizer};
use crate::store::AlertRepository;

/// Diff baseline carried from one cycle to the next.
#[derive(Debug, Clone, Default)]
pub enum PollState {
    /// No cycle has completed since startup.
    #[default]
    Uninitialized,
    /// The snapshot of the previous cycle.
    Steady(Arc<Snapshot>),
}

impl PollState {
    /// Previous snapshot, if any.
    #[must_use]
    pub fn previous(&self) -> Option<&Snapshot> {
        match self {
            Self::Uninitialized => None,
            Self::Steady(snapshot) => Some(snapshot.as_ref()),
        }
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CycleReport {
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// When the cycle began.
    pub started_at: DateTime<Utc>,
    /// When the cycle finished.
    pub finished_at: DateTime<Utc>,
    /// Categories that failed to fetch or parse.
    pub degraded_categories: Vec<FeedCategory>,
    /// Notices in the cycle's delta.
    pub notices: usize,
    /// Messages sent successfully.
    pub delivered: usize,
    /// Messages whose send failed.
    pub failed: usize,
}

/// Latest cycle report; `None` until the first cycle completes.
pub type ReportReceiver = watch::Receiver<Option<CycleReport>>;

/// Drives the notifier on a fixed cadence.
#[derive(Debug)]
pub struct PollLoop<F, C> {
    normalizer: Normalizer<F>,
    dispatcher: Dispatcher<C>,
    alerts: AlertRepository,
    interval: Duration,
    cycles: AtomicU64,
    snapshots: watch::Sender<Option<Arc<Snapshot>>>,
    reports: watch::Sender<Option<CycleReport>>,
}

impl<F: FeedSource, C: ChatTransport> PollLoop<F, C> {
    /// Creates a loop that runs every `interval`.
    #[must_use]
    pub fn new(
        normalizer: Normalizer<F>,
        dispatcher: Dispatcher<C>,
        alerts: AlertRepository,
        interval: Duration,
    ) -> Self {
        Self {
            normalizer,
            dispatcher,
            alerts,
            interval,
            cycles: AtomicU64::new(0),
            snapshots: watch::Sender::new(None),
            reports: watch::Sender::new(None),
        }
    }

    /// Receiver of every snapshot the loop publishes.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshots.subscribe()
    }

    /// Receiver of every cycle report.
    #[must_use]
    pub fn reports(&self) -> ReportReceiver {
        self.reports.subscribe()
    }

    /// Runs one cycle: fetch, diff against `state`, dispatch, refresh the
    /// legacy alert list, publish.
    ///
    /// Never fails. Feed, store and chat errors are logged and reflected in
    /// the report; the returned state always holds the new snapshot.
    pub async fn run_cycle(&self, state: PollState) -> (PollState, CycleReport) {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let started_at = Utc::now();
        tracing::debug!(cycle, "poll cycle started");

        let current = Arc::new(self.normalizer.snapshot().await);
        let delta = diff(state.previous(), &current);
        if matches!(state, PollState::Uninitialized) {
            tracing::info!(cycle, "baseline snapshot taken, no notifications this cycle");
        }

        let dispatched = match self.dispatcher.dispatch(&delta).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(cycle, error = %e, "dispatch aborted");
                DispatchReport::default()
            }
        };

        self.refresh_alerts().await;

        let report = CycleReport {
            cycle,
            started_at,
            finished_at: Utc::now(),
            degraded_categories: current.degraded.clone(),
            notices: delta.len(),
            delivered: dispatched.delivered,
            failed: dispatched.failed,
        };
        tracing::info!(
            cycle,
            notices = report.notices,
            delivered = report.delivered,
            failed = report.failed,
            degraded = report.degraded_categories.len(),
            "poll cycle finished"
        );

        self.snapshots.send_replace(Some(Arc::clone(&current)));
        self.reports.send_replace(Some(report.clone()));
        (PollState::Steady(current), report)
    }

    /// Replaces the stored legacy alerts. Keeps the old list on failure.
    async fn refresh_alerts(&self) {
        let alerts = match self.normalizer.legacy_alerts().await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::warn!(error = %e, "legacy alerts unavailable, keeping stored list");
                return;
            }
        };
        if let Err(e) = self.alerts.save_alerts(&alerts).await {
            tracing::error!(error = %e, "failed to store legacy alerts");
        }
    }

    /// Runs cycles until `shutdown` fires. The first cycle starts
    /// immediately; an in-flight cycle is allowed to finish.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut state = PollState::Uninitialized;
        tracing::info!(interval_secs = self.interval.as_secs(), "poll loop started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let (next, _) = self.run_cycle(state).await;
            state = next;
        }

        tracing::info!("poll loop stopped");
    }
}
