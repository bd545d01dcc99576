use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::models::usage::{UsageWindow, WindowKind};

const MS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

/// Where a window stands against perfectly linear consumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PacingResult {
    /// Utilization expected at this point of the window (0-100), if computable
    pub expected_utilization: Option<f64>,
    /// Fraction of the window already elapsed (0-1), if computable
    pub elapsed_fraction: Option<f64>,
}

impl PacingResult {
    pub fn unknown() -> Self {
        Self {
            expected_utilization: None,
            elapsed_fraction: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.expected_utilization.is_some()
    }
}

/// Utilization that linear consumption would have reached by `now`.
///
/// Returns `None` when the reset time is unknown, already passed, or lies
/// further out than the window itself (nothing has elapsed yet). The result
/// is not clamped.
pub fn expected_utilization(
    resets_at: Option<&DateTime<Utc>>,
    window_duration_hours: f64,
    now: DateTime<Utc>,
) -> Option<f64> {
    if window_duration_hours <= 0.0 {
        return None;
    }
    let resets_at = resets_at?;

    let remaining_ms = (*resets_at - now).num_milliseconds() as f64;
    if remaining_ms <= 0.0 {
        return None;
    }

    let window_ms = window_duration_hours * MS_PER_HOUR;
    let elapsed_ms = window_ms - remaining_ms;
    if elapsed_ms <= 0.0 {
        return None;
    }

    Some(100.0 * elapsed_ms / window_ms)
}

/// Pacing for one window of the given kind at `now`.
pub fn pacing(window: &UsageWindow, kind: WindowKind, now: DateTime<Utc>) -> PacingResult {
    match expected_utilization(window.resets_at.as_ref(), kind.duration_hours(), now) {
        Some(expected) => PacingResult {
            expected_utilization: Some(expected),
            elapsed_fraction: Some(expected / 100.0),
        },
        None => PacingResult::unknown(),
    }
}
