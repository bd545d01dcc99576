//! Rotating badge indicator.
//!
//! The state machine alternates between the session and weekly windows on a
//! fixed period, re-rendering each time from the latest stored snapshot and
//! the current wall clock. It owns exactly one rotation timer at a time.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::core::models::badge::BadgeFace;
use crate::core::models::usage::{Snapshot, UsageWindow, WindowKind};
use crate::core::pacing::expected_utilization;
use crate::core::store::SnapshotStore;
use crate::core::tier::{classify_window, Classification, ThresholdTable};

pub const DEFAULT_ROTATE_INTERVAL: Duration = Duration::from_secs(15);

/// Destination of badge writes. Writing the same face twice must be harmless.
pub trait IndicatorSink: Send + Sync {
    fn set_indicator(&self, face: &BadgeFace);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeState {
    /// No snapshot displayed yet
    Idle,
    /// Rotating, currently showing the given window
    Displaying(WindowKind),
    /// Static error indicator, no rotation
    ErrorOverride,
}

/// Round a window's utilization and classify it the way the badge shows it.
///
/// A window missing from the report counts as 0% with an unknown reset time.
/// Returns the rounded value together with its classification.
pub fn classify_reading(
    window: Option<&UsageWindow>,
    kind: WindowKind,
    thresholds: &ThresholdTable,
    now: DateTime<Utc>,
) -> (f64, Classification) {
    let (utilization, resets_at) = match window {
        Some(window) => (window.utilization, window.resets_at),
        None => (0.0, None),
    };
    let rounded = utilization.round();
    let expected = expected_utilization(resets_at.as_ref(), kind.duration_hours(), now);
    (rounded, classify_window(thresholds, kind, rounded, expected))
}

/// Badge face for one window of `snapshot` at `now`.
///
/// Utilization is rounded before classification so the number on the badge
/// is the number that was judged.
pub fn render_face(
    snapshot: &Snapshot,
    kind: WindowKind,
    thresholds: &ThresholdTable,
    now: DateTime<Utc>,
) -> BadgeFace {
    let (rounded, classification) =
        classify_reading(snapshot.usage.window(kind), kind, thresholds, now);

    match classification.tier.color() {
        Some(color) if classification.visible => BadgeFace {
            text: format!("{}{}", kind.tag(), rounded as i64),
            color: Some(color),
        },
        _ => BadgeFace::cleared(),
    }
}

/// Shared rotation state. `generation` changes whenever the current rotation
/// is superseded; a timer only writes while its generation is current, and
/// every sink write happens with this lock held.
#[derive(Debug)]
struct Rotation {
    state: BadgeState,
    generation: u64,
}

#[derive(Clone)]
struct BadgeRenderer {
    store: Arc<SnapshotStore>,
    sink: Arc<dyn IndicatorSink>,
    thresholds: ThresholdTable,
}

impl BadgeRenderer {
    /// Show `kind` from the latest snapshot. With nothing stored, fall back to
    /// the error override and return false so rotation stops.
    fn show(&self, rotation: &mut Rotation, kind: WindowKind) -> bool {
        match self.store.latest() {
            Some(snapshot) => {
                let face = render_face(&snapshot, kind, &self.thresholds, Utc::now());
                debug!(window = kind.tag(), text = %face.text, "Badge render");
                rotation.state = BadgeState::Displaying(kind);
                self.sink.set_indicator(&face);
                true
            }
            None => {
                debug!("No snapshot stored, showing error indicator");
                self.show_error(rotation);
                false
            }
        }
    }

    fn show_error(&self, rotation: &mut Rotation) {
        rotation.state = BadgeState::ErrorOverride;
        self.sink.set_indicator(&BadgeFace::error());
    }
}

pub struct BadgeStateMachine {
    renderer: BadgeRenderer,
    rotate_interval: Duration,
    rotation: Arc<Mutex<Rotation>>,
    timer: Option<JoinHandle<()>>,
}

impl BadgeStateMachine {
    pub fn new(
        store: Arc<SnapshotStore>,
        sink: Arc<dyn IndicatorSink>,
        thresholds: ThresholdTable,
        rotate_interval: Duration,
    ) -> Self {
        Self {
            renderer: BadgeRenderer {
                store,
                sink,
                thresholds,
            },
            rotate_interval,
            rotation: Arc::new(Mutex::new(Rotation {
                state: BadgeState::Idle,
                generation: 0,
            })),
            timer: None,
        }
    }

    pub fn state(&self) -> BadgeState {
        self.rotation.lock().state
    }

    pub fn is_rotating(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start displaying the stored snapshot: render the session window now and
    /// alternate windows every rotation period. Any previous rotation is
    /// cancelled first. With no snapshot stored the error indicator is shown
    /// instead and nothing rotates. Must be called from within a tokio runtime.
    pub fn display(&mut self) {
        self.cancel_timer();

        let generation = {
            let mut rotation = self.rotation.lock();
            if !self.renderer.show(&mut rotation, WindowKind::Short) {
                return;
            }
            rotation.generation
        };

        let renderer = self.renderer.clone();
        let shared = Arc::clone(&self.rotation);
        let period = self.rotate_interval;
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut rotation = shared.lock();
                if rotation.generation != generation {
                    break;
                }
                let next = match rotation.state {
                    BadgeState::Displaying(WindowKind::Short) => WindowKind::Long,
                    _ => WindowKind::Short,
                };
                if !renderer.show(&mut rotation, next) {
                    break;
                }
            }
        }));
    }

    /// Stop rotating and show the static error indicator.
    pub fn show_error(&mut self) {
        self.cancel_timer();
        let mut rotation = self.rotation.lock();
        self.renderer.show_error(&mut rotation);
    }

    /// Supersede the running rotation. A tick already writing holds the lock,
    /// so once this returns no stale face can reach the sink.
    fn cancel_timer(&mut self) {
        self.rotation.lock().generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for BadgeStateMachine {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
