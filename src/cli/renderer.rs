use colored::{control, ColoredString, Colorize};

use crate::core::formatter::{format_last_updated, format_percent, format_usage_bar, mark_pace};
use crate::core::models::badge::{BadgeColor, BadgeFace, Tier};
use crate::core::panel::{UsagePanel, WindowRow};

const BAR_WIDTH: usize = 20;

fn paint(text: &str, color: BadgeColor) -> ColoredString {
    text.truecolor(color.r, color.g, color.b)
}

fn paint_tier(text: &str, tier: Tier) -> ColoredString {
    match tier.color() {
        Some(color) => paint(text, color),
        None => text.normal(),
    }
}

/// Render the usage panel as a colored (or plain) string.
///
/// Layout:
/// ```text
///  Usage · Max 5x (Personal)
///   Session   95% [███████████████████░]  pace 80%  Critical
///             Resets in 1h 0m
///   Weekly    41% [████████░░░░|░░░░░░░]  pace 62%
///             Resets in 3d
///   Sonnet    12% [██░░░░░░░░░░░░░░░░░░]
///   Usage is close to the limit
///   Updated 14:05
/// ```
pub fn render_panel(panel: &UsagePanel, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();

    let header = match &panel.organization {
        Some(org) => format!(" Usage · {} ({})", panel.plan, org),
        None => format!(" Usage · {}", panel.plan),
    };
    lines.push(header.bold().to_string());

    for row in &panel.windows {
        render_row(&mut lines, row);
    }

    lines.push(format!("  {}", paint(panel.status.text, panel.status.color)));
    lines.push(format!("  {}", format_last_updated(&panel.last_updated).dimmed()));

    lines.join("\n")
}

fn render_row(lines: &mut Vec<String>, row: &WindowRow) {
    let bar = format_usage_bar(row.bar_percent, BAR_WIDTH);
    let bar = match row.expected_utilization {
        Some(expected) => mark_pace(&bar, expected, BAR_WIDTH),
        None => bar,
    };
    let percent = format!("{:>4}", format_percent(row.utilization));

    let mut line = format!(
        "  {}  {} {}",
        format!("{:<7}", row.label).cyan(),
        paint_tier(&percent, row.bar_tier),
        paint_tier(&bar, row.bar_tier)
    );
    if let Some(expected) = row.expected_utilization {
        line.push_str(&format!("  {}", format!("pace {}", format_percent(expected)).dimmed()));
    }
    if let Some(tier) = row.badge_tier.filter(|t| t.is_visible()) {
        line.push_str(&format!("  {}", paint_tier(&tier.to_string(), tier).bold()));
    }
    lines.push(line);

    if let Some(reset) = &row.reset {
        // 11 spaces to align under the percent/bar values
        lines.push(format!("           {}", reset.dimmed()));
    }
}

/// Panel shown when there is no organization or usage data.
pub fn render_unavailable(use_color: bool) -> String {
    control::set_override(use_color);
    format!(
        "{}\n  {}",
        " Usage · Unknown".bold(),
        paint("Not logged in or usage unavailable", BadgeColor::GRAY)
    )
}

/// Render a single badge face, e.g. for `pacebadge badge`.
pub fn render_face(face: &BadgeFace, use_color: bool) -> String {
    control::set_override(use_color);
    if face.is_cleared() {
        return "(hidden)".dimmed().to_string();
    }
    match face.color {
        Some(color) => format!(" {} ", face.text)
            .on_truecolor(color.r, color.g, color.b)
            .bold()
            .to_string(),
        None => face.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::usage::{Organization, Snapshot, UsageReport, UsageWindow};
    use crate::core::tier::ThresholdTable;
    use chrono::{Duration, TimeZone, Utc};

    fn panel() -> UsagePanel {
        let now = Utc.with_ymd_and_hms(2025, 12, 4, 12, 0, 0).unwrap();
        let snapshot = Snapshot {
            org: Organization {
                uuid: "org-1".to_string(),
                name: Some("Personal".to_string()),
                rate_limit_tier: Some("default_claude_max_5x".to_string()),
            },
            usage: UsageReport {
                five_hour: Some(UsageWindow {
                    utilization: 95.0,
                    resets_at: Some(now + Duration::hours(1)),
                }),
                seven_day: Some(UsageWindow {
                    utilization: 41.0,
                    resets_at: Some(now + Duration::hours(80)),
                }),
                seven_day_sonnet: Some(UsageWindow {
                    utilization: 12.0,
                    resets_at: None,
                }),
                seven_day_opus: None,
            },
            last_updated: now,
        };
        UsagePanel::build(&snapshot, &ThresholdTable::default(), now)
    }

    #[test]
    fn render_contains_plan_and_org() {
        let output = render_panel(&panel(), false);
        assert!(output.contains("Max 5x"));
        assert!(output.contains("Personal"));
    }

    #[test]
    fn render_contains_labels_and_percentages() {
        let output = render_panel(&panel(), false);
        assert!(output.contains("Session"));
        assert!(output.contains("Weekly"));
        assert!(output.contains("Sonnet"));
        assert!(!output.contains("Opus"));
        assert!(output.contains("95%"));
        assert!(output.contains("41%"));
    }

    #[test]
    fn render_contains_pace_tier_and_countdown() {
        let output = render_panel(&panel(), false);
        assert!(output.contains("pace 80%"));
        assert!(output.contains("Critical"));
        assert!(output.contains("Resets in 1h 0m"));
        assert!(output.contains("Resets in 3d"));
    }

    #[test]
    fn render_contains_status_and_update_time() {
        let output = render_panel(&panel(), false);
        assert!(output.contains("Usage is close to the limit"));
        assert!(output.contains("Updated "));
    }

    #[test]
    fn render_no_ansi_when_color_false() {
        let output = render_panel(&panel(), false);
        assert!(!output.contains('\x1b'), "output should not contain ANSI codes");
    }

    #[test]
    fn unavailable_panel_message() {
        let output = render_unavailable(false);
        assert!(output.contains("Not logged in or usage unavailable"));
    }

    #[test]
    fn face_rendering() {
        assert_eq!(render_face(&BadgeFace::error(), false), " ! ");
        assert_eq!(render_face(&BadgeFace::cleared(), false), "(hidden)");
    }
}
