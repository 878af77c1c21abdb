//! Drives aggregation passes for the overview screen.
//!
//! Passes are triggered once on activation, on a fixed interval, and on manual
//! request. All passes run on a single task, one at a time; manual requests
//! that pile up while a pass is running are folded into one follow-up pass.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::DashboardEngine;
use crate::error::{DashboardError, DashboardResult};
use crate::models::DashboardOverview;
use crate::store::{RecordSource, SlotStore};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(300_000);
pub const DEFAULT_MANUAL_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period between automatic passes.
    pub refresh_interval: Duration,
    /// Pause before a manual pass so the loading state is visible.
    pub manual_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            manual_delay: DEFAULT_MANUAL_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Periodic,
    Manual,
}

#[derive(Debug, Clone)]
pub enum PassOutcome {
    Completed(Arc<DashboardOverview>),
    /// The pass was dropped; the previous overview is still the latest.
    Abandoned(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub total_passes: u64,
    pub completed_passes: u64,
    pub abandoned_passes: u64,
    pub manual_requests: u64,
    pub coalesced_requests: u64,
}

type ManualRequest = Option<oneshot::Sender<PassOutcome>>;

pub struct RefreshScheduler<S, K>
where
    S: RecordSource + ?Sized + 'static,
    K: SlotStore + ?Sized + 'static,
{
    engine: Arc<DashboardEngine<S, K>>,
    config: SchedulerConfig,
}

impl<S, K> RefreshScheduler<S, K>
where
    S: RecordSource + ?Sized + 'static,
    K: SlotStore + ?Sized + 'static,
{
    pub fn new(engine: Arc<DashboardEngine<S, K>>, config: SchedulerConfig) -> Self {
        Self { engine, config }
    }

    /// Starts the scheduler task. The initial pass begins immediately.
    pub fn spawn(self) -> SchedulerHandle {
        let (manual_tx, manual_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(RefreshState::Idle);
        let (overview_tx, overview_rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            self.run_loop(manual_rx, shutdown_rx, state_tx, overview_tx).await
        });

        SchedulerHandle {
            manual_tx,
            shutdown_tx: Some(shutdown_tx),
            state_rx,
            overview_rx,
            task,
        }
    }

    async fn run_loop(
        self,
        mut manual_rx: mpsc::UnboundedReceiver<ManualRequest>,
        mut shutdown_rx: oneshot::Receiver<()>,
        state_tx: watch::Sender<RefreshState>,
        overview_tx: watch::Sender<Option<Arc<DashboardOverview>>>,
    ) -> SchedulerStats {
        let mut stats = SchedulerStats::default();
        info!(
            interval_ms = self.config.refresh_interval.as_millis() as u64,
            "refresh scheduler started"
        );

        self.run_pass(Trigger::Initial, &state_tx, &overview_tx, &mut stats)
            .await;

        let period = self.config.refresh_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    self.run_pass(Trigger::Periodic, &state_tx, &overview_tx, &mut stats)
                        .await;
                }
                request = manual_rx.recv() => {
                    let Some(first) = request else { break };
                    stats.manual_requests += 1;
                    let mut waiters: Vec<oneshot::Sender<PassOutcome>> = first.into_iter().collect();

                    state_tx.send_replace(RefreshState::Refreshing);
                    sleep(self.config.manual_delay).await;

                    while let Ok(extra) = manual_rx.try_recv() {
                        stats.manual_requests += 1;
                        stats.coalesced_requests += 1;
                        waiters.extend(extra);
                    }

                    let outcome = self
                        .run_pass(Trigger::Manual, &state_tx, &overview_tx, &mut stats)
                        .await;
                    for waiter in waiters {
                        let _ = waiter.send(outcome.clone());
                    }
                }
            }
        }

        state_tx.send_replace(RefreshState::Idle);
        info!(
            passes = stats.total_passes,
            abandoned = stats.abandoned_passes,
            "refresh scheduler stopped"
        );
        stats
    }

    async fn run_pass(
        &self,
        trigger: Trigger,
        state_tx: &watch::Sender<RefreshState>,
        overview_tx: &watch::Sender<Option<Arc<DashboardOverview>>>,
        stats: &mut SchedulerStats,
    ) -> PassOutcome {
        state_tx.send_replace(RefreshState::Refreshing);
        stats.total_passes += 1;
        let pass = stats.total_passes;
        debug!(pass, ?trigger, "refresh pass starting");

        let now = Local::now();
        let outcome = match self.engine.run_pass(&now).await {
            Ok(overview) => {
                stats.completed_passes += 1;
                let overview = Arc::new(overview);
                overview_tx.send_replace(Some(overview.clone()));
                PassOutcome::Completed(overview)
            }
            Err(err) => {
                stats.abandoned_passes += 1;
                warn!(pass, ?trigger, error = %err, "refresh pass abandoned, keeping previous overview");
                PassOutcome::Abandoned(err.to_string())
            }
        };

        state_tx.send_replace(RefreshState::Idle);
        outcome
    }
}

/// Control surface for a running scheduler. Dropping it also stops the task.
pub struct SchedulerHandle {
    manual_tx: mpsc::UnboundedSender<ManualRequest>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    state_rx: watch::Receiver<RefreshState>,
    overview_rx: watch::Receiver<Option<Arc<DashboardOverview>>>,
    task: JoinHandle<SchedulerStats>,
}

impl SchedulerHandle {
    /// Queues a manual pass without waiting for it.
    pub fn request_refresh(&self) -> DashboardResult<()> {
        self.manual_tx
            .send(None)
            .map_err(|_| DashboardError::SchedulerClosed)
    }

    /// Queues a manual pass and waits for the pass that serves it.
    pub async fn refresh_now(&self) -> DashboardResult<PassOutcome> {
        let (done_tx, done_rx) = oneshot::channel();
        self.manual_tx
            .send(Some(done_tx))
            .map_err(|_| DashboardError::SchedulerClosed)?;
        done_rx.await.map_err(|_| DashboardError::SchedulerClosed)
    }

    pub fn state(&self) -> RefreshState {
        *self.state_rx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RefreshState> {
        self.state_rx.clone()
    }

    pub fn latest_overview(&self) -> Option<Arc<DashboardOverview>> {
        self.overview_rx.borrow().clone()
    }

    pub fn subscribe_overview(&self) -> watch::Receiver<Option<Arc<DashboardOverview>>> {
        self.overview_rx.clone()
    }

    /// Cancels the timer, waits for any in-flight pass, and returns run statistics.
    pub async fn shutdown(mut self) -> SchedulerStats {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        match (&mut self.task).await {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "refresh scheduler task failed");
                SchedulerStats::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, CandidateStatus, Mentor};
    use crate::store::testing::{MemoryRecordSource, MemorySlotStore};
    use chrono::Utc;
    use std::sync::atomic::Ordering;
    use tokio::time::sleep_until;
    use uuid::Uuid;

    fn source() -> Arc<MemoryRecordSource> {
        let candidate = Candidate {
            id: Uuid::new_v4(),
            full_name: "Malika Ergasheva".to_string(),
            position: "Data Analyst".to_string(),
            status: CandidateStatus::Accepted,
            created_at: Utc::now(),
        };
        let mentor = Mentor {
            id: Uuid::new_v4(),
            full_name: "Aziz Badalov".to_string(),
            specialty: "Full Stack Developer".to_string(),
            rating: 4.8,
            students: 38,
            verified: true,
            active: true,
        };
        Arc::new(MemoryRecordSource::new(vec![candidate], vec![], vec![mentor]))
    }

    fn scheduler(source: Arc<MemoryRecordSource>, interval_ms: u64) -> SchedulerHandle {
        let store = Arc::new(MemorySlotStore::default());
        let engine = Arc::new(DashboardEngine::new(source, store));
        RefreshScheduler::new(
            engine,
            SchedulerConfig {
                refresh_interval: Duration::from_millis(interval_ms),
                manual_delay: DEFAULT_MANUAL_DELAY,
            },
        )
        .spawn()
    }

    #[tokio::test(start_paused = true)]
    async fn initial_pass_runs_on_activation() {
        let handle = scheduler(source(), 60_000);
        let mut overview = handle.subscribe_overview();
        overview.wait_for(|o| o.is_some()).await.unwrap();
        assert_eq!(handle.latest_overview().unwrap().trend, "+12%");

        let stats = handle.shutdown().await;
        assert_eq!(stats.total_passes, 1);
        assert_eq!(stats.completed_passes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_passes_follow_the_interval() {
        let handle = scheduler(source(), 1_000);
        sleep(Duration::from_millis(2_500)).await;

        let stats = handle.shutdown().await;
        assert_eq!(stats.total_passes, 3);
        assert_eq!(stats.manual_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_timer() {
        let source = source();
        let handle = scheduler(source.clone(), 1_000);
        sleep(Duration::from_millis(1_500)).await;
        let stats = handle.shutdown().await;
        let reads = source.reads.load(Ordering::SeqCst);

        sleep(Duration::from_millis(5_000)).await;
        assert_eq!(source.reads.load(Ordering::SeqCst), reads);
        assert_eq!(stats.total_passes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_waits_for_the_delay() {
        let handle = scheduler(source(), 3_600_000);
        let started = Instant::now();

        let outcome = handle.refresh_now().await.unwrap();
        assert!(matches!(outcome, PassOutcome::Completed(_)));
        assert!(started.elapsed() >= DEFAULT_MANUAL_DELAY);
        assert_eq!(handle.state(), RefreshState::Idle);

        let stats = handle.shutdown().await;
        assert_eq!(stats.total_passes, 2);
        assert_eq!(stats.manual_requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_manual_requests_share_one_pass() {
        let handle = scheduler(source(), 3_600_000);

        let (a, b, c) = tokio::join!(handle.refresh_now(), handle.refresh_now(), handle.refresh_now());
        for outcome in [a, b, c] {
            assert!(matches!(outcome.unwrap(), PassOutcome::Completed(_)));
        }

        let stats = handle.shutdown().await;
        assert_eq!(stats.total_passes, 2);
        assert_eq!(stats.manual_requests, 3);
        assert_eq!(stats.coalesced_requests, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_pass_keeps_previous_overview() {
        let source = source();
        let handle = scheduler(source.clone(), 3_600_000);
        handle
            .subscribe_overview()
            .wait_for(|o| o.is_some())
            .await
            .unwrap();
        let before = handle.latest_overview().unwrap();

        source.fail_reads.store(true, Ordering::SeqCst);
        let outcome = handle.refresh_now().await.unwrap();
        assert!(matches!(outcome, PassOutcome::Abandoned(_)));
        assert!(Arc::ptr_eq(&before, &handle.latest_overview().unwrap()));

        source.fail_reads.store(false, Ordering::SeqCst);
        assert!(matches!(
            handle.refresh_now().await.unwrap(),
            PassOutcome::Completed(_)
        ));

        let stats = handle.shutdown().await;
        assert_eq!(stats.abandoned_passes, 1);
        assert_eq!(stats.completed_passes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn state_reads_refreshing_during_the_manual_delay() {
        let handle = scheduler(source(), 3_600_000);
        handle
            .subscribe_overview()
            .wait_for(|o| o.is_some())
            .await
            .unwrap();
        assert_eq!(handle.state(), RefreshState::Idle);

        handle.request_refresh().unwrap();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.state(), RefreshState::Refreshing);

        sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.state(), RefreshState::Idle);

        let stats = handle.shutdown().await;
        assert_eq!(stats.total_passes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_request_waits_for_a_running_periodic_pass() {
        let source = source();
        // Each pass reads three collections, so one pass takes 600ms.
        source.read_delay_ms.store(200, Ordering::SeqCst);
        let started = Instant::now();
        let handle = scheduler(source.clone(), 1_000);

        // Initial pass ends at 600ms; the first periodic pass runs 1600..2200ms.
        sleep_until(started + Duration::from_millis(1_700)).await;
        assert_eq!(handle.state(), RefreshState::Refreshing);

        let requested = Instant::now();
        let outcome = handle.refresh_now().await.unwrap();
        assert!(matches!(outcome, PassOutcome::Completed(_)));
        // 500ms left of the periodic pass, then the manual delay, then a 600ms pass.
        assert!(requested.elapsed() >= Duration::from_millis(1_400));
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);

        let stats = handle.shutdown().await;
        assert_eq!(stats.manual_requests, 1);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fire_and_forget_request_triggers_a_pass() {
        let handle = scheduler(source(), 3_600_000);
        handle.request_refresh().unwrap();
        sleep(Duration::from_millis(1_000)).await;

        let stats = handle.shutdown().await;
        assert_eq!(stats.total_passes, 2);
    }
}
