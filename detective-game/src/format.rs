//! Display helpers shared by the renderers.
use crate::numbers::{floor_f64_to_usize, round_f64_to_i64};

/// `"2m 05s"` for durations of a minute or more, `"45s"` below that.
#[must_use]
pub fn format_time(seconds: f64) -> String {
    let whole = floor_f64_to_usize(seconds);
    let (minutes, secs) = (whole / 60, whole % 60);
    if minutes == 0 {
        format!("{secs}s")
    } else {
        format!("{minutes}m {secs:02}s")
    }
}

/// `0.257` becomes `"25.7%"`.
#[must_use]
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Dollar amount with thousands separators, e.g. `"$1,234.56"`.
#[must_use]
pub fn format_currency(value: f64) -> String {
    let cents = round_f64_to_i64(value * 100.0);
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Division that yields `fallback` instead of infinities or NaN.
#[must_use]
pub fn safe_divide(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator.abs() <= f64::EPSILON || !denominator.is_finite() {
        return fallback;
    }
    let out = numerator / denominator;
    if out.is_finite() { out } else { fallback }
}

/// Percentage change from `old` to `new`; 0 when `old` is 0.
#[must_use]
pub fn percentage_change(old: f64, new: f64) -> f64 {
    safe_divide(new - old, old.abs(), 0.0) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_uses_minutes_and_padded_seconds() {
        assert_eq!(format_time(125.9), "2m 05s");
        assert_eq!(format_time(45.0), "45s");
        assert_eq!(format_time(-3.0), "0s");
        assert_eq!(format_time(3_600.0), "60m 00s");
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(1_234.567), "$1,234.57");
        assert_eq!(format_currency(0.5), "$0.50");
        assert_eq!(format_currency(-987_654.0), "-$987,654.00");
        assert_eq!(format_currency(100.0), "$100.00");
    }

    #[test]
    fn percentages_and_division() {
        assert_eq!(format_percentage(0.257), "25.7%");
        assert!((safe_divide(1.0, 0.0, -1.0) + 1.0).abs() < f64::EPSILON);
        assert!((safe_divide(9.0, 3.0, 0.0) - 3.0).abs() < f64::EPSILON);
        assert!((percentage_change(0.0, 10.0)).abs() < f64::EPSILON);
        assert!((percentage_change(50.0, 75.0) - 50.0).abs() < 1e-9);
        assert!((percentage_change(-50.0, -25.0) - 50.0).abs() < 1e-9);
    }
}
