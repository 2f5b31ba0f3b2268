use chrono::{DateTime, TimeZone, Utc};
use num_format::{Locale, ToFormattedString};

/// Rendered wherever a value is absent.
pub const PLACEHOLDER: &str = "-";

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

// Groups the integer part of an already fixed-point string ("1234567.50").
fn group_fixed(fixed: &str) -> String {
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed, None),
    };

    let grouped = match int_part.parse::<u128>() {
        Ok(n) => n.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };

    match frac_part {
        Some(f) if !f.is_empty() => format!("{}.{}", grouped, f),
        _ => grouped,
    }
}

/// Thousands-separated number with up to `max_decimals` fraction digits,
/// trailing zeros trimmed.
pub fn format_number(value: f64, max_decimals: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }

    let mut fixed = format!("{:.*}", max_decimals, value.abs());
    if fixed.contains('.') {
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.').len();
        fixed.truncate(trimmed);
    }

    let grouped = group_fixed(&fixed);
    if value < 0.0 && grouped.chars().any(|c| c != '0' && c != '.' && c != ',') {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// US-dollar amount with exactly `digits` fraction digits, e.g. `$1,234.50`.
pub fn format_currency_digits(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return format!("${:.*}", digits, 0.0);
    }

    let grouped = group_fixed(&format!("{:.*}", digits, value.abs()));
    let is_zero = grouped.chars().all(|c| c == '0' || c == '.' || c == ',');
    if value < 0.0 && !is_zero {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

pub fn format_currency(value: f64) -> String {
    format_currency_digits(value, 2)
}

/// Currency, or the placeholder when the value is unknown.
pub fn format_currency_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format_currency(v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Supply figure followed by the ticker symbol. Unknown or zero supplies
/// render as the placeholder.
pub fn format_supply(value: Option<f64>, symbol: &str) -> String {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => {
            format!("{} {}", format_number(v, 3), symbol.to_uppercase())
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Signed percentage with two decimals: `+2.50%`, `-1.03%`.
pub fn format_change(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v > 0.0 { "+" } else { "" };
            format!("{}{:.2}%", sign, v)
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Relative age of `then_ms` as seen at `now_ms`. Older than four weeks
/// falls back to the calendar date.
pub fn time_ago(then_ms: i64, now_ms: i64) -> String {
    let diff = (now_ms - then_ms).max(0);

    if diff < MINUTE_MS {
        return "just now".to_string();
    }
    if diff < HOUR_MS {
        return format!("{} min", diff / MINUTE_MS);
    }
    if diff < DAY_MS {
        let hours = diff / HOUR_MS;
        return format!("{} hour{}", hours, if hours > 1 { "s" } else { "" });
    }
    if diff < WEEK_MS {
        let days = diff / DAY_MS;
        return format!("{} day{}", days, if days > 1 { "s" } else { "" });
    }
    if diff < 4 * WEEK_MS {
        let weeks = diff / WEEK_MS;
        return format!("{} week{}", weeks, if weeks > 1 { "s" } else { "" });
    }

    match Utc.timestamp_millis_opt(then_ms).single() {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// `time_ago` for an RFC 3339 timestamp string.
pub fn time_ago_str(timestamp: Option<&str>, now_ms: i64) -> String {
    timestamp
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|date| time_ago(date.timestamp_millis(), now_ms))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Calendar date such as `14 Mar 2024`.
pub fn format_date(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|date| date.with_timezone(&Utc).format("%-d %b %Y").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
