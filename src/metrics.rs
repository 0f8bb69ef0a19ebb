//! Unit and metric utilities
//!
//! Pure helpers for durations, pace, distance conversion, calorie estimates
//! and display formatting. None of these fail: malformed input degrades to a
//! zero value the way the entry forms expect.

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{DistanceUnit, Run, RunType};

/// Kilometers per mile
pub const KM_PER_MILE: f64 = 1.60934;

/// Body weight (lbs) the calorie baseline is calibrated for
pub const BASELINE_WEIGHT_LBS: f64 = 150.0;

/// Calories burned per mile at the baseline weight
pub const CALORIES_PER_MILE: f64 = 100.0;

/// Pace shown when there is no distance to divide by
pub const ZERO_PACE: &str = "00:00";

/// Parse `HH:MM:SS` or `MM:SS` into seconds.
///
/// Blank components count as 0. Any other shape, or a non-numeric
/// component, yields 0.
pub fn parse_duration(duration: &str) -> u32 {
    let parts: Option<Vec<u32>> = duration
        .split(':')
        .map(|part| match part.trim() {
            "" => Some(0),
            text => text.parse::<u32>().ok(),
        })
        .collect();

    match parts.as_deref() {
        Some([hours, minutes, seconds]) => hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(*seconds),
        Some([minutes, seconds]) => minutes.saturating_mul(60).saturating_add(*seconds),
        _ => 0,
    }
}

/// Format seconds as zero-padded `HH:MM:SS`
pub fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Pace as `MM:SS` per unit, e.g. `"08:30/mi"`.
///
/// Returns `"00:00"` when distance is zero.
pub fn calculate_pace(distance: f64, duration_seconds: u32, unit: DistanceUnit) -> String {
    if distance == 0.0 {
        return ZERO_PACE.to_string();
    }

    let pace_seconds = duration_seconds as f64 / distance;
    let minutes = (pace_seconds / 60.0).floor() as u64;
    let seconds = (pace_seconds % 60.0).floor() as u64;

    format!("{:02}:{:02}{}", minutes, seconds, unit.pace_suffix())
}

pub fn miles_to_km(miles: f64) -> f64 {
    miles * KM_PER_MILE
}

pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

/// Convert a distance between units
pub fn convert_distance(distance: f64, from: DistanceUnit, to: DistanceUnit) -> f64 {
    match (from, to) {
        (DistanceUnit::Miles, DistanceUnit::Kilometers) => miles_to_km(distance),
        (DistanceUnit::Kilometers, DistanceUnit::Miles) => km_to_miles(distance),
        _ => distance,
    }
}

/// Rough calorie estimate: 100 kcal per mile at 150 lbs, scaled linearly by
/// body weight. Not a physiological model.
pub fn calculate_calories(distance: f64, weight_lbs: Option<f64>, unit: DistanceUnit) -> u32 {
    let miles = convert_distance(distance, unit, DistanceUnit::Miles);
    let weight_factor = weight_lbs.unwrap_or(BASELINE_WEIGHT_LBS) / BASELINE_WEIGHT_LBS;
    (miles * CALORIES_PER_MILE * weight_factor).round().max(0.0) as u32
}

/// Sum of run distances
pub fn calculate_total_distance<'a, I>(runs: I) -> f64
where
    I: IntoIterator<Item = &'a Run>,
{
    runs.into_iter().map(|run| run.distance).sum()
}

/// Aggregate pace over total distance and total duration.
///
/// Long runs weigh more than short ones; this is not the mean of per-run
/// paces.
pub fn calculate_average_pace(runs: &[Run], unit: DistanceUnit) -> String {
    if runs.is_empty() {
        return ZERO_PACE.to_string();
    }

    let total_distance = calculate_total_distance(runs);
    let total_seconds: u32 = runs.iter().map(Run::duration_seconds).sum();

    calculate_pace(total_distance, total_seconds, unit)
}

/// Unique opaque id: base-36 millisecond timestamp plus a random suffix
pub fn generate_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", to_base36(millis), &random[..12])
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Fixed decimal formatting, e.g. `format_number(26.2188, 1) == "26.2"`
pub fn format_number(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// `"Mar 01, 2024"`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %d, %Y").to_string()
}

/// `"Mar 01, 2024 06:30"`
pub fn format_date_time(date: &DateTime<Utc>) -> String {
    date.format("%b %d, %Y %H:%M").to_string()
}

static EMAIL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// Loose email shape check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

/// Hex colour used to tag run types
pub fn run_type_color(run_type: RunType) -> &'static str {
    match run_type {
        RunType::Training => "#2196F3",
        RunType::Race => "#F44336",
        RunType::LongRun => "#4CAF50",
        RunType::Tempo => "#FF9800",
        RunType::Interval => "#9C27B0",
        RunType::Recovery => "#607D8B",
    }
}

/// Hex colour for a 1-5 difficulty, grey when out of range
pub fn difficulty_color(difficulty: u8) -> &'static str {
    match difficulty {
        1 => "#4CAF50",
        2 => "#8BC34A",
        3 => "#FFC107",
        4 => "#FF9800",
        5 => "#F44336",
        _ => "#757575",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeartRate, Rating, Weather};
    use chrono::TimeZone;

    fn run_with(distance: f64, duration: &str) -> Run {
        Run {
            id: generate_id(),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap(),
            distance,
            duration: duration.to_string(),
            pace: String::new(),
            location: "Track".to_string(),
            route: None,
            weather: Weather::default(),
            heart_rate: HeartRate::default(),
            elevation: 0.0,
            calories: 0,
            notes: String::new(),
            difficulty: Rating::default(),
            enjoyment: None,
            run_type: RunType::Training,
            tags: None,
            splits: Vec::new(),
            equipment_id: None,
        }
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("01:02:03"), 3723);
        assert_eq!(parse_duration("02:03"), 123);
        assert_eq!(parse_duration("garbage"), 0);
        assert_eq!(parse_duration("1:2:3:4"), 0);
        assert_eq!(parse_duration("aa:bb"), 0);
        assert_eq!(parse_duration(""), 0);
        // Blank components count as zero
        assert_eq!(parse_duration("05:"), 300);
        assert_eq!(parse_duration(":30"), 30);
        assert_eq!(parse_duration("1::05"), 3605);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3723), "01:02:03");
        assert_eq!(format_duration(45 * 60), "00:45:00");
        assert_eq!(parse_duration(&format_duration(15_432)), 15_432);
    }

    #[test]
    fn test_calculate_pace() {
        assert_eq!(calculate_pace(0.0, 1234, DistanceUnit::Miles), "00:00");
        assert_eq!(calculate_pace(10.0, 6000, DistanceUnit::Miles), "10:00/mi");
        assert_eq!(calculate_pace(5.0, 2700, DistanceUnit::Miles), "09:00/mi");
        assert_eq!(calculate_pace(10.0, 3005, DistanceUnit::Kilometers), "05:00/km");
        assert_eq!(calculate_pace(3.0, 1000, DistanceUnit::Miles), "05:33/mi");
    }

    #[test]
    fn test_convert_distance() {
        assert_eq!(convert_distance(5.0, DistanceUnit::Miles, DistanceUnit::Miles), 5.0);
        assert!((convert_distance(1.0, DistanceUnit::Miles, DistanceUnit::Kilometers) - 1.60934).abs() < 1e-9);
        assert!((convert_distance(1.60934, DistanceUnit::Kilometers, DistanceUnit::Miles) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_calories() {
        assert_eq!(calculate_calories(3.0, None, DistanceUnit::Miles), 300);
        assert_eq!(calculate_calories(3.0, Some(180.0), DistanceUnit::Miles), 360);
        // 10 km is ~6.214 miles
        assert_eq!(calculate_calories(10.0, None, DistanceUnit::Kilometers), 621);
        assert_eq!(calculate_calories(0.0, Some(200.0), DistanceUnit::Miles), 0);
    }

    #[test]
    fn test_totals_and_average_pace() {
        let runs = vec![run_with(5.0, "00:45:00"), run_with(3.0, "00:24:00")];
        assert_eq!(calculate_total_distance(&runs), 8.0);
        // 69 minutes over 8 miles is 8:37.5 per mile
        assert_eq!(calculate_average_pace(&runs, DistanceUnit::Miles), "08:37/mi");
        assert_eq!(calculate_average_pace(&[], DistanceUnit::Miles), "00:00");
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: std::collections::HashSet<String> = (0..500).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 500);
        assert!(ids.iter().all(|id| id.chars().all(|c| c.is_ascii_alphanumeric())));
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(format_number(26.2188, 1), "26.2");
        assert_eq!(format_number(8.0, 2), "8.00");

        let date = Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap();
        assert_eq!(format_date(&date), "Mar 01, 2024");
        assert_eq!(format_date_time(&date), "Mar 01, 2024 06:30");

        assert_eq!(run_type_color(RunType::Race), "#F44336");
        assert_eq!(difficulty_color(1), "#4CAF50");
        assert_eq!(difficulty_color(9), "#757575");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("runner@example.com"));
        assert!(!is_valid_email("runner@example"));
        assert!(!is_valid_email("runner example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(is_valid_email("a@b.com."));
        assert!(is_valid_email("first.last@mail.example.org"));
    }
}
