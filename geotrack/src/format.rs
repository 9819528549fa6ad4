//! Display formatting for position readouts.

use chrono::{DateTime, Local, TimeZone};

/// Compass points, clockwise from north in 45° steps.
const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Format a latitude or longitude with 6 decimals (~0.1 m).
pub fn format_coordinate(coord: f64) -> String {
    format!("{:.6}", coord)
}

/// Format an accuracy radius, e.g. `12.3m`.
pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.1}m", accuracy)
}

/// Convert m/s to km/h. Missing or zero speed reads as stationary.
pub fn format_speed(speed: Option<f64>) -> String {
    match speed {
        Some(s) if s != 0.0 => format!("{:.1} km/h", s * 3.6),
        _ => "0 km/h".to_string(),
    }
}

/// Format a heading as an 8-point compass direction plus degrees.
///
/// A heading of exactly zero is indistinguishable from "unknown" on most
/// devices, so it reads as `N/A` like a missing heading.
pub fn format_heading(heading: Option<f64>) -> String {
    match heading {
        Some(h) if h != 0.0 => {
            let index = ((h / 45.0).round() as i64).rem_euclid(8) as usize;
            format!("{} ({}°)", COMPASS_POINTS[index], h.round() as i64)
        }
        _ => "N/A".to_string(),
    }
}

/// Format an epoch-millisecond timestamp as local `HH:MM:SS`.
pub fn format_timestamp(timestamp_ms: u64) -> String {
    format_timestamp_in(timestamp_ms, &Local)
}

/// Format in an explicit time zone.
pub fn format_timestamp_in<Tz: TimeZone>(timestamp_ms: u64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let millis = i64::try_from(timestamp_ms).unwrap_or(i64::MAX);
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc.with_timezone(tz).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(-23.5505), "-23.550500");
        assert_eq!(format_coordinate(10.0000004), "10.000000");
    }

    #[test]
    fn test_format_accuracy() {
        assert_eq!(format_accuracy(5.0), "5.0m");
        assert_eq!(format_accuracy(12.345), "12.3m");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(None), "0 km/h");
        assert_eq!(format_speed(Some(0.0)), "0 km/h");
        assert_eq!(format_speed(Some(10.0)), "36.0 km/h");
    }

    #[test]
    fn test_format_heading() {
        assert_eq!(format_heading(None), "N/A");
        assert_eq!(format_heading(Some(0.0)), "N/A");
        assert_eq!(format_heading(Some(45.0)), "NE (45°)");
        assert_eq!(format_heading(Some(100.0)), "E (100°)");
        assert_eq!(format_heading(Some(350.0)), "N (350°)");
        assert_eq!(format_heading(Some(225.4)), "SW (225°)");
    }

    #[test]
    fn test_format_timestamp_utc() {
        // 2024-01-01T12:34:56Z
        assert_eq!(format_timestamp_in(1_704_112_496_000, &Utc), "12:34:56");
    }
}
