//! View model for the usage panel: plan, one row per reported window, an
//! overall status line and the last update time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::formatter::format_reset_countdown;
use crate::core::models::badge::{BadgeColor, Tier};
use crate::core::models::usage::{Snapshot, UsageWindow, WindowKind};
use crate::core::pacing::pacing;
use crate::core::badge::classify_reading;
use crate::core::tier::{bar_tier, ThresholdTable};

/// Display name for an organization's rate limit tier.
pub fn plan_name(rate_limit_tier: Option<&str>) -> &'static str {
    match rate_limit_tier {
        Some("default_claude_max_20x") => "Max 20x",
        Some("default_claude_max_5x") => "Max 5x",
        Some("default_claude_pro") => "Pro",
        _ => "Free",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRow {
    pub label: &'static str,
    pub kind: WindowKind,
    pub utilization: f64,
    /// Utilization clamped to 0-100 for bar rendering
    pub bar_percent: f64,
    pub bar_tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_utilization: Option<f64>,
    /// Badge tier for the session and weekly rows; model rows carry none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Normal,
    High,
    NearLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: &'static str,
    pub color: BadgeColor,
}

impl StatusMessage {
    pub fn for_max_utilization(max: f64) -> Self {
        if max > 90.0 {
            Self {
                level: StatusLevel::NearLimit,
                text: "Usage is close to the limit",
                color: BadgeColor::RED,
            }
        } else if max > 80.0 {
            Self {
                level: StatusLevel::High,
                text: "Usage is running high",
                color: BadgeColor::ORANGE,
            }
        } else {
            Self {
                level: StatusLevel::Normal,
                text: "Available as usual",
                color: BadgeColor::GREEN,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsagePanel {
    pub plan: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub windows: Vec<WindowRow>,
    pub status: StatusMessage,
    pub last_updated: DateTime<Utc>,
}

impl UsagePanel {
    pub fn build(snapshot: &Snapshot, thresholds: &ThresholdTable, now: DateTime<Utc>) -> Self {
        let usage = &snapshot.usage;
        let zero = UsageWindow {
            utilization: 0.0,
            resets_at: None,
        };

        // Session and weekly rows always show; model rows only when reported.
        let mut windows = vec![
            row(
                WindowKind::Short.label(),
                WindowKind::Short,
                usage.five_hour.as_ref().unwrap_or(&zero),
                Some(thresholds),
                now,
            ),
            row(
                WindowKind::Long.label(),
                WindowKind::Long,
                usage.seven_day.as_ref().unwrap_or(&zero),
                Some(thresholds),
                now,
            ),
        ];
        if let Some(sonnet) = &usage.seven_day_sonnet {
            windows.push(row("Sonnet", WindowKind::Long, sonnet, None, now));
        }
        if let Some(opus) = &usage.seven_day_opus {
            windows.push(row("Opus", WindowKind::Long, opus, None, now));
        }

        Self {
            plan: plan_name(snapshot.org.rate_limit_tier.as_deref()),
            organization: snapshot.org.name.clone(),
            windows,
            status: StatusMessage::for_max_utilization(usage.max_utilization()),
            last_updated: snapshot.last_updated,
        }
    }
}

/// One panel row. Passing `thresholds` also classifies the row for the badge.
fn row(
    label: &'static str,
    kind: WindowKind,
    window: &UsageWindow,
    thresholds: Option<&ThresholdTable>,
    now: DateTime<Utc>,
) -> WindowRow {
    let pace = pacing(window, kind, now);
    let badge_tier =
        thresholds.map(|table| classify_reading(Some(window), kind, table, now).1.tier);
    WindowRow {
        label,
        kind,
        utilization: window.utilization,
        bar_percent: window.utilization.clamp(0.0, 100.0),
        bar_tier: bar_tier(window.utilization),
        expected_utilization: pace.expected_utilization,
        badge_tier,
        resets_at: window.resets_at,
        reset: window
            .resets_at
            .as_ref()
            .map(|at| format_reset_countdown(at, now)),
    }
}
