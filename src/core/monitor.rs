//! Polling loop tying the fetch collaborator, snapshot store and badge
//! together.
//!
//! Fetches run on a coarse interval and on explicit refresh requests. Each
//! request carries a correlation id and is answered exactly once, after its
//! own fetch has finished. Fetches never overlap because the loop handles one
//! trigger at a time.

use anyhow::{Context, Result};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::core::badge::BadgeStateMachine;
use crate::core::client::UsageSource;
use crate::core::store::SnapshotStore;

pub const DEFAULT_FETCH_INTERVAL: Duration = Duration::from_secs(300);

/// Manual refresh request sent to a running monitor.
#[derive(Debug)]
pub struct RefreshRequest {
    pub id: u64,
    reply: oneshot::Sender<RefreshAck>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshAck {
    pub id: u64,
    pub success: bool,
}

/// Cloneable handle for requesting refreshes from a running monitor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<RefreshRequest>,
    next_id: Arc<AtomicU64>,
}

impl MonitorHandle {
    /// Ask the monitor to fetch now and wait for the outcome.
    pub async fn refresh(&self) -> Result<RefreshAck> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RefreshRequest { id, reply })
            .await
            .ok()
            .context("Monitor is no longer running")?;
        rx.await.context("Monitor dropped the refresh request")
    }
}

/// Create the refresh channel shared by a monitor and its handles.
pub fn refresh_channel() -> (MonitorHandle, mpsc::Receiver<RefreshRequest>) {
    let (tx, rx) = mpsc::channel(8);
    let handle = MonitorHandle {
        tx,
        next_id: Arc::new(AtomicU64::new(1)),
    };
    (handle, rx)
}

pub struct UsageMonitor<S> {
    source: S,
    store: Arc<SnapshotStore>,
    badge: BadgeStateMachine,
    fetch_interval: Duration,
}

impl<S: UsageSource> UsageMonitor<S> {
    pub fn new(
        source: S,
        store: Arc<SnapshotStore>,
        badge: BadgeStateMachine,
        fetch_interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            badge,
            fetch_interval,
        }
    }

    pub fn badge(&self) -> &BadgeStateMachine {
        &self.badge
    }

    /// Fetch once, store the snapshot and restart the badge. Any failure
    /// switches the badge to its error indicator.
    pub async fn refresh_once(&mut self) -> bool {
        match self.source.fetch_snapshot().await {
            Ok(snapshot) => {
                info!(
                    org = %snapshot.org.uuid,
                    five_hour = ?snapshot.usage.five_hour.as_ref().map(|w| w.utilization),
                    seven_day = ?snapshot.usage.seven_day.as_ref().map(|w| w.utilization),
                    "Usage updated"
                );
                self.store.set(snapshot);
                self.badge.display();
                true
            }
            Err(e) => {
                warn!("Failed to fetch usage: {}", e);
                self.badge.show_error();
                false
            }
        }
    }

    /// Run until `shutdown` resolves. The first fetch happens immediately.
    pub async fn run(
        mut self,
        mut requests: mpsc::Receiver<RefreshRequest>,
        shutdown: impl Future<Output = ()>,
    ) {
        let mut ticker = tokio::time::interval(self.fetch_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("Monitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.refresh_once().await;
                }
                Some(request) = requests.recv() => {
                    debug!(id = request.id, "Refresh requested");
                    let success = self.refresh_once().await;
                    let ack = RefreshAck { id: request.id, success };
                    if request.reply.send(ack).is_err() {
                        debug!(id = ack.id, "Refresh requester went away");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::badge::{BadgeState, IndicatorSink, DEFAULT_ROTATE_INTERVAL};
    use crate::core::client::FetchError;
    use crate::core::models::badge::BadgeFace;
    use crate::core::models::usage::{
        Organization, Snapshot, UsageReport, UsageWindow, WindowKind,
    };
    use crate::core::tier::ThresholdTable;
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct RecordingSink {
        faces: Mutex<Vec<BadgeFace>>,
    }

    impl IndicatorSink for RecordingSink {
        fn set_indicator(&self, face: &BadgeFace) {
            self.faces.lock().push(face.clone());
        }
    }

    /// Replays queued outcomes; succeeds once the queue is empty.
    #[derive(Default)]
    struct ScriptedSource {
        outcomes: Mutex<VecDeque<Result<Snapshot, FetchError>>>,
        calls: Arc<AtomicUsize>,
    }

    impl UsageSource for ScriptedSource {
        async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes.lock().pop_front().unwrap_or_else(|| Ok(snapshot(97.0)))
        }
    }

    fn snapshot(five_hour: f64) -> Snapshot {
        Snapshot {
            org: Organization {
                uuid: "org-1".to_string(),
                name: None,
                rate_limit_tier: None,
            },
            usage: UsageReport {
                five_hour: Some(UsageWindow {
                    utilization: five_hour,
                    resets_at: None,
                }),
                seven_day: None,
                ..Default::default()
            },
            last_updated: Utc::now(),
        }
    }

    fn monitor(
        source: ScriptedSource,
    ) -> (UsageMonitor<ScriptedSource>, Arc<RecordingSink>, Arc<SnapshotStore>) {
        let store = Arc::new(SnapshotStore::in_memory());
        let sink = Arc::new(RecordingSink::default());
        let badge = BadgeStateMachine::new(
            Arc::clone(&store),
            sink.clone(),
            ThresholdTable::default(),
            DEFAULT_ROTATE_INTERVAL,
        );
        let monitor = UsageMonitor::new(source, Arc::clone(&store), badge, DEFAULT_FETCH_INTERVAL);
        (monitor, sink, store)
    }

    #[tokio::test(start_paused = true)]
    async fn successful_fetch_stores_and_displays() {
        let (mut monitor, sink, store) = monitor(ScriptedSource::default());
        assert!(monitor.refresh_once().await);
        assert_eq!(store.latest().unwrap().usage.five_hour.unwrap().utilization, 97.0);
        assert_eq!(
            monitor.badge().state(),
            BadgeState::Displaying(WindowKind::Short)
        );
        assert_eq!(sink.faces.lock().last().unwrap().text, "H97");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_shows_error_and_keeps_old_snapshot() {
        let source = ScriptedSource::default();
        source.outcomes.lock().push_back(Ok(snapshot(50.0)));
        source.outcomes.lock().push_back(Err(FetchError::NoOrganization));
        let (mut monitor, sink, store) = monitor(source);

        assert!(monitor.refresh_once().await);
        assert!(!monitor.refresh_once().await);
        assert_eq!(monitor.badge().state(), BadgeState::ErrorOverride);
        assert_eq!(*sink.faces.lock().last().unwrap(), BadgeFace::error());
        assert!(store.latest().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_usage_is_an_error_override() {
        let source = ScriptedSource::default();
        source
            .outcomes
            .lock()
            .push_back(Err(FetchError::NoUsageData("org-1".to_string())));
        let (mut monitor, _sink, _store) = monitor(source);
        assert!(!monitor.refresh_once().await);
        assert_eq!(monitor.badge().state(), BadgeState::ErrorOverride);
    }

    #[tokio::test(start_paused = true)]
    async fn run_fetches_immediately_and_on_interval() {
        let source = ScriptedSource::default();
        let calls = Arc::clone(&source.calls);
        let (monitor, _sink, _store) = monitor(source);
        let (_handle, requests) = refresh_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(monitor.run(requests, async {
            let _ = stop_rx.await;
        }));

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        stop_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_requests_are_acknowledged_with_their_id() {
        let source = ScriptedSource::default();
        source.outcomes.lock().push_back(Ok(snapshot(10.0)));
        source.outcomes.lock().push_back(Err(FetchError::NoOrganization));
        let calls = Arc::clone(&source.calls);
        let (monitor, _sink, _store) = monitor(source);
        let (handle, requests) = refresh_channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(monitor.run(requests, async {
            let _ = stop_rx.await;
        }));

        let first = handle.refresh().await.unwrap();
        let second = handle.refresh().await.unwrap();
        assert_eq!(first.id + 1, second.id);
        // the scheduled startup fetch consumed the first scripted outcome
        assert!(!first.success);
        assert!(second.success);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        stop_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn refresh_fails_once_monitor_is_gone() {
        let (handle, requests) = refresh_channel();
        drop(requests);
        assert!(handle.refresh().await.is_err());
    }
}
