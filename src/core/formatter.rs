use chrono::{DateTime, Local, Utc};

/// Returns "{pct}%" for utilization clamped to 0-100 and rounded.
pub fn format_percent(utilization: f64) -> String {
    format!("{}%", utilization.clamp(0.0, 100.0).round() as u64)
}

/// Countdown until `resets_at` as seen from `now`.
///
/// Whole days only once a day or more remains, hours and minutes below
/// that, minutes alone under an hour. A reset time in the past yields "Reset".
pub fn format_reset_countdown(resets_at: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = *resets_at - now;
    if duration.num_milliseconds() <= 0 {
        return "Reset".to_string();
    }

    let total_minutes = duration.num_minutes();
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    let days = hours / 24;

    if days > 0 {
        format!("Resets in {}d", days)
    } else if hours > 0 {
        format!("Resets in {}h {}m", hours, minutes)
    } else {
        format!("Resets in {}m", minutes)
    }
}

/// Returns "[████░░░░░░░░]" where █ = used portion, ░ = what is left.
/// Width is the number of block characters inside the brackets.
pub fn format_usage_bar(used_percent: f64, width: usize) -> String {
    let used_percent = used_percent.clamp(0.0, 100.0);
    let used_blocks = ((used_percent / 100.0) * width as f64).round() as usize;
    let remaining_blocks = width.saturating_sub(used_blocks);

    format!("[{}{}]", "█".repeat(used_blocks), "░".repeat(remaining_blocks))
}

/// Places a pace marker `|` inside a bar produced by [`format_usage_bar`].
pub fn mark_pace(bar: &str, expected_percent: f64, width: usize) -> String {
    let mut cells: Vec<char> = bar.chars().collect();
    if cells.len() != width + 2 || width == 0 {
        return bar.to_string();
    }
    let position = ((expected_percent.clamp(0.0, 100.0) / 100.0) * width as f64).floor() as usize;
    cells[1 + position.min(width - 1)] = '|';
    cells.into_iter().collect()
}

/// "Updated HH:MM" in local time.
pub fn format_last_updated(last_updated: &DateTime<Utc>) -> String {
    let local = last_updated.with_timezone(&Local);
    format!("Updated {}", local.format("%H:%M"))
}
