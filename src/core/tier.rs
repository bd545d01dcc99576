use serde::{Deserialize, Serialize};

use crate::core::models::badge::Tier;
use crate::core::models::usage::WindowKind;

/// Thresholds for one window kind.
///
/// Without a computable pace only the absolute thresholds apply. With a pace,
/// `paced_min_actual` hides the badge below a floor of actual usage and
/// `paced_hide_ratio` hides it while usage stays comfortably under pace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPolicy {
    pub absolute_critical: f64,
    pub absolute_caution: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paced_min_actual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paced_hide_ratio: Option<f64>,
    #[serde(default = "default_critical_ratio")]
    pub paced_critical_ratio: f64,
}

fn default_critical_ratio() -> f64 {
    1.0
}

impl WindowPolicy {
    pub fn short_default() -> Self {
        Self {
            absolute_critical: 100.0,
            absolute_caution: 90.0,
            paced_min_actual: Some(60.0),
            paced_hide_ratio: None,
            paced_critical_ratio: 1.0,
        }
    }

    pub fn long_default() -> Self {
        Self {
            absolute_critical: 100.0,
            absolute_caution: 80.0,
            paced_min_actual: None,
            paced_hide_ratio: Some(0.8),
            paced_critical_ratio: 1.0,
        }
    }

    fn validate(&self, name: &str, issues: &mut Vec<String>) {
        if self.absolute_caution > self.absolute_critical {
            issues.push(format!(
                "thresholds.{}: absolute_caution ({}) exceeds absolute_critical ({})",
                name, self.absolute_caution, self.absolute_critical
            ));
        }
        if self.paced_critical_ratio <= 0.0 {
            issues.push(format!(
                "thresholds.{}: paced_critical_ratio must be positive",
                name
            ));
        }
        if let Some(hide) = self.paced_hide_ratio {
            if hide <= 0.0 || hide > self.paced_critical_ratio {
                issues.push(format!(
                    "thresholds.{}: paced_hide_ratio ({}) must be in (0, paced_critical_ratio]",
                    name, hide
                ));
            }
        }
    }
}

/// Per-window-kind thresholds used by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    #[serde(default = "WindowPolicy::short_default")]
    pub short: WindowPolicy,
    #[serde(default = "WindowPolicy::long_default")]
    pub long: WindowPolicy,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            short: WindowPolicy::short_default(),
            long: WindowPolicy::long_default(),
        }
    }
}

impl ThresholdTable {
    pub fn policy(&self, kind: WindowKind) -> &WindowPolicy {
        match kind {
            WindowKind::Short => &self.short,
            WindowKind::Long => &self.long,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        self.short.validate("short", &mut issues);
        self.long.validate("long", &mut issues);
        issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub tier: Tier,
    pub visible: bool,
}

impl From<Tier> for Classification {
    fn from(tier: Tier) -> Self {
        Self {
            tier,
            visible: tier.is_visible(),
        }
    }
}

/// Classify actual usage against the expected pace for one window.
///
/// An expected value of zero or below has no meaningful ratio and is treated
/// the same as an unknown pace.
pub fn classify(policy: &WindowPolicy, actual: f64, expected: Option<f64>) -> Classification {
    let tier = match expected.filter(|e| *e > 0.0) {
        None => absolute_tier(policy, actual),
        Some(expected) => paced_tier(policy, actual, expected),
    };
    tier.into()
}

/// Convenience wrapper looking up the policy for `kind` in `table`.
pub fn classify_window(
    table: &ThresholdTable,
    kind: WindowKind,
    actual: f64,
    expected: Option<f64>,
) -> Classification {
    classify(table.policy(kind), actual, expected)
}

fn absolute_tier(policy: &WindowPolicy, actual: f64) -> Tier {
    if actual >= policy.absolute_critical {
        Tier::Critical
    } else if actual >= policy.absolute_caution {
        Tier::Caution
    } else {
        Tier::Hidden
    }
}

fn paced_tier(policy: &WindowPolicy, actual: f64, expected: f64) -> Tier {
    if policy.paced_min_actual.is_some_and(|min| actual < min) {
        return Tier::Hidden;
    }
    let pace_ratio = actual / expected;
    if policy.paced_hide_ratio.is_some_and(|hide| pace_ratio <= hide) {
        return Tier::Hidden;
    }
    if pace_ratio > policy.paced_critical_ratio {
        Tier::Critical
    } else {
        Tier::Caution
    }
}

/// Color tier for a progress bar, from utilization alone.
pub fn bar_tier(utilization: f64) -> Tier {
    let pct = utilization.clamp(0.0, 100.0);
    if pct > 80.0 {
        Tier::Critical
    } else if pct > 50.0 {
        Tier::Caution
    } else {
        Tier::Nominal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(actual: f64, expected: Option<f64>) -> Tier {
        classify_window(&ThresholdTable::default(), WindowKind::Short, actual, expected).tier
    }

    fn long(actual: f64, expected: Option<f64>) -> Tier {
        classify_window(&ThresholdTable::default(), WindowKind::Long, actual, expected).tier
    }

    #[test]
    fn short_window_hidden_below_sixty_regardless_of_pace() {
        assert_eq!(short(59.0, Some(10.0)), Tier::Hidden);
        assert_eq!(short(59.0, Some(99.0)), Tier::Hidden);
    }

    #[test]
    fn short_window_ahead_of_pace_is_critical() {
        assert_eq!(short(61.0, Some(50.0)), Tier::Critical);
    }

    #[test]
    fn short_window_behind_pace_is_caution() {
        assert_eq!(short(61.0, Some(70.0)), Tier::Caution);
        assert_eq!(short(60.0, Some(60.0)), Tier::Caution);
    }

    #[test]
    fn long_window_comfortably_under_pace_is_hidden() {
        assert_eq!(long(50.0, Some(70.0)), Tier::Hidden);
        assert_eq!(long(40.0, Some(50.0)), Tier::Hidden);
    }

    #[test]
    fn long_window_near_pace_is_caution() {
        assert_eq!(long(85.0, Some(90.0)), Tier::Caution);
    }

    #[test]
    fn long_window_ahead_of_pace_is_critical() {
        assert_eq!(long(85.0, Some(80.0)), Tier::Critical);
    }

    #[test]
    fn short_fallback_uses_absolute_thresholds() {
        assert_eq!(short(95.0, None), Tier::Caution);
        assert_eq!(short(100.0, None), Tier::Critical);
        assert_eq!(short(89.0, None), Tier::Hidden);
    }

    #[test]
    fn long_fallback_uses_absolute_thresholds() {
        assert_eq!(long(79.0, None), Tier::Hidden);
        assert_eq!(long(80.0, None), Tier::Caution);
        assert_eq!(long(120.0, None), Tier::Critical);
    }

    #[test]
    fn zero_expected_falls_back_to_absolute() {
        assert_eq!(short(95.0, Some(0.0)), Tier::Caution);
        assert_eq!(long(10.0, Some(0.0)), Tier::Hidden);
    }

    #[test]
    fn visibility_follows_tier() {
        let table = ThresholdTable::default();
        let hidden = classify_window(&table, WindowKind::Short, 10.0, None);
        assert!(!hidden.visible);
        let shown = classify_window(&table, WindowKind::Short, 100.0, None);
        assert!(shown.visible);
    }

    #[test]
    fn custom_policy_changes_decisions() {
        let mut table = ThresholdTable::default();
        table.short.absolute_caution = 50.0;
        assert_eq!(
            classify_window(&table, WindowKind::Short, 55.0, None).tier,
            Tier::Caution
        );
    }

    #[test]
    fn bar_tier_bands() {
        assert_eq!(bar_tier(10.0), Tier::Nominal);
        assert_eq!(bar_tier(50.0), Tier::Nominal);
        assert_eq!(bar_tier(51.0), Tier::Caution);
        assert_eq!(bar_tier(80.0), Tier::Caution);
        assert_eq!(bar_tier(81.0), Tier::Critical);
        assert_eq!(bar_tier(250.0), Tier::Critical);
    }

    #[test]
    fn default_table_is_valid() {
        assert!(ThresholdTable::default().validate().is_empty());
    }

    #[test]
    fn validate_catches_inverted_thresholds() {
        let mut table = ThresholdTable::default();
        table.long.absolute_caution = 120.0;
        table.long.paced_hide_ratio = Some(1.5);
        let issues = table.validate();
        assert!(issues.iter().any(|i| i.contains("absolute_caution")));
        assert!(issues.iter().any(|i| i.contains("paced_hide_ratio")));
    }

    #[test]
    fn parse_partial_table_from_toml() {
        let toml = r#"
[short]
absolute_critical = 100.0
absolute_caution = 85.0
paced_min_actual = 50.0
"#;
        let table: ThresholdTable = toml::from_str(toml).unwrap();
        assert_eq!(table.short.absolute_caution, 85.0);
        assert_eq!(table.short.paced_critical_ratio, 1.0);
        assert_eq!(table.long, WindowPolicy::long_default());
    }
}
