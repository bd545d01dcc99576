use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which rolling quota a window belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Rolling 5-hour session quota
    Short,
    /// Rolling 7-day quota
    Long,
}

impl WindowKind {
    pub fn duration_hours(&self) -> f64 {
        match self {
            Self::Short => 5.0,
            Self::Long => 168.0,
        }
    }

    /// One-letter tag shown in front of the badge number.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Short => "H",
            Self::Long => "W",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Short => "Session",
            Self::Long => "Weekly",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "short" | "session" | "five_hour" | "5h" => Some(Self::Short),
            "long" | "weekly" | "seven_day" | "7d" => Some(Self::Long),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageWindow {
    /// Percentage of the quota consumed; may exceed 100
    pub utilization: f64,
    /// When the rolling window resets, if known
    pub resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Plan identifier such as "default_claude_max_5x"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_tier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub five_hour: Option<UsageWindow>,
    pub seven_day: Option<UsageWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seven_day_sonnet: Option<UsageWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seven_day_opus: Option<UsageWindow>,
}

impl UsageReport {
    /// The window tracked by the badge for `kind`.
    pub fn window(&self, kind: WindowKind) -> Option<&UsageWindow> {
        match kind {
            WindowKind::Short => self.five_hour.as_ref(),
            WindowKind::Long => self.seven_day.as_ref(),
        }
    }

    /// Highest utilization across every reported window, 0 when none.
    pub fn max_utilization(&self) -> f64 {
        [
            &self.five_hour,
            &self.seven_day,
            &self.seven_day_sonnet,
            &self.seven_day_opus,
        ]
        .into_iter()
        .flatten()
        .map(|w| w.utilization)
        .fold(0.0, f64::max)
    }
}

/// Last fetched organization and usage, as held by the snapshot store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub org: Organization,
    pub usage: UsageReport,
    pub last_updated: DateTime<Utc>,
}
