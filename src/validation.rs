//! Input validation for the entry forms
//!
//! Drafts hold raw user input as typed. Turning a draft into a record either
//! yields a fully-formed `Run`, `Goal` or `UserProfile`, or the first
//! `ValidationError` the form would show. Nothing is dispatched until a draft
//! converts cleanly.

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::ValidationError;
use crate::metrics::{
    calculate_calories, calculate_pace, generate_id, is_valid_email, parse_duration,
};
use crate::models::{
    parse_date_text, to_stored_precision, DistanceUnit, Goal, HeartRate, Rating, Run, RunType,
    TargetType, Theme, TemperatureUnit, UserProfile, Weather,
};

static DURATION_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// Check `MM:SS` / `HH:MM:SS` shape: one or two leading digits, then
/// exactly two digits per remaining component.
pub fn is_duration_text(text: &str) -> bool {
    DURATION_PATTERN
        .get_or_init(|| Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(text))
}

/// Parse a date field typed as `YYYY-MM-DD` or a full timestamp
pub fn parse_date_field(text: &str) -> Result<DateTime<Utc>, ValidationError> {
    parse_date_text(text).ok_or_else(|| ValidationError::InvalidDate {
        value: text.to_string(),
    })
}

/// Parse a required number
fn parse_number(field: &str, text: &str) -> Result<f64, ValidationError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            field: field.to_string(),
            value: text.to_string(),
        })
}

/// Parse an optional number; blank input falls back to `default`
fn parse_number_or(field: &str, text: &str, default: f64) -> Result<f64, ValidationError> {
    if text.trim().is_empty() {
        Ok(default)
    } else {
        parse_number(field, text)
    }
}

fn rating(field: &str, value: u8) -> Result<Rating, ValidationError> {
    Rating::new(value).map_err(|_| ValidationError::RatingOutOfRange {
        field: field.to_string(),
        value,
    })
}

fn optional_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Raw input for a new or edited run
#[derive(Debug, Clone, PartialEq)]
pub struct RunDraft {
    /// Defaults to the time of submission
    pub date: Option<DateTime<Utc>>,
    pub distance: String,
    pub duration: String,
    pub location: String,
    pub run_type: RunType,
    pub temperature: String,
    pub humidity: String,
    pub conditions: String,
    pub heart_rate_avg: String,
    pub heart_rate_max: String,
    pub elevation: String,
    pub notes: String,
    pub difficulty: u8,
    pub enjoyment: u8,
    pub tags: Vec<String>,
}

impl Default for RunDraft {
    fn default() -> Self {
        RunDraft {
            date: None,
            distance: String::new(),
            duration: String::new(),
            location: String::new(),
            run_type: RunType::Training,
            temperature: String::new(),
            humidity: String::new(),
            conditions: "Clear".to_string(),
            heart_rate_avg: String::new(),
            heart_rate_max: String::new(),
            elevation: String::new(),
            notes: String::new(),
            difficulty: 3,
            enjoyment: 3,
            tags: Vec::new(),
        }
    }
}

impl RunDraft {
    /// Pre-fill a draft from an existing run for editing
    pub fn from_run(run: &Run) -> Self {
        RunDraft {
            date: Some(run.date),
            distance: run.distance.to_string(),
            duration: run.duration.clone(),
            location: run.location.clone(),
            run_type: run.run_type,
            temperature: run.weather.temperature.to_string(),
            humidity: run.weather.humidity.to_string(),
            conditions: run.weather.conditions.clone(),
            heart_rate_avg: run.heart_rate.avg.to_string(),
            heart_rate_max: run.heart_rate.max.to_string(),
            elevation: run.elevation.to_string(),
            notes: run.notes.clone(),
            difficulty: run.difficulty.value(),
            enjoyment: run.enjoyment.map(|r| r.value()).unwrap_or(3),
            tags: run.tags.clone().unwrap_or_default(),
        }
    }

    /// Required fields, positive distance and duration shape.
    ///
    /// Returns the parsed distance.
    pub fn validate(&self) -> Result<f64, ValidationError> {
        let missing: Vec<&str> = [
            ("distance", &self.distance),
            ("duration", &self.duration),
            ("location", &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields {
                fields: missing.join(", "),
            });
        }

        let distance = parse_number("distance", &self.distance)?;
        if distance <= 0.0 {
            return Err(ValidationError::NonPositiveDistance);
        }

        if !is_duration_text(self.duration.trim()) {
            return Err(ValidationError::InvalidDuration {
                value: self.duration.clone(),
            });
        }

        Ok(distance)
    }

    /// Build a new run with a fresh id.
    ///
    /// Pace uses the profile's distance unit and calories its body weight;
    /// without a profile both fall back to miles and the baseline weight.
    pub fn into_run(
        self,
        profile: Option<&UserProfile>,
        now: DateTime<Utc>,
    ) -> Result<Run, ValidationError> {
        self.build(generate_id(), profile, now)
    }

    /// Build the replacement for `existing`, keeping its id and the fields
    /// the form does not edit.
    pub fn into_updated_run(
        self,
        existing: &Run,
        profile: Option<&UserProfile>,
    ) -> Result<Run, ValidationError> {
        let mut run = self.build(existing.id.clone(), profile, existing.date)?;
        run.route = existing.route.clone();
        run.weather.wind_speed = existing.weather.wind_speed;
        run.heart_rate.zones = existing.heart_rate.zones.clone();
        run.splits = existing.splits.clone();
        run.equipment_id = existing.equipment_id.clone();
        Ok(run)
    }

    fn build(
        self,
        id: String,
        profile: Option<&UserProfile>,
        default_date: DateTime<Utc>,
    ) -> Result<Run, ValidationError> {
        let distance = self.validate()?;
        let unit = profile
            .map(|p| p.preferences.distance_unit)
            .unwrap_or(DistanceUnit::Miles);
        let weight = profile.and_then(|p| p.weight);

        let duration = self.duration.trim().to_string();
        let pace = calculate_pace(distance, parse_duration(&duration), unit);
        let calories = calculate_calories(distance, weight, unit);

        let defaults = Weather::default();
        let weather = Weather {
            temperature: parse_number_or("temperature", &self.temperature, defaults.temperature)?,
            humidity: parse_number_or("humidity", &self.humidity, defaults.humidity)?,
            wind_speed: None,
            conditions: optional_text(&self.conditions).unwrap_or(defaults.conditions),
        };
        let heart_rate = HeartRate {
            avg: parse_number_or("average heart rate", &self.heart_rate_avg, 0.0)?,
            max: parse_number_or("max heart rate", &self.heart_rate_max, 0.0)?,
            zones: None,
        };

        let tags: Vec<String> = self
            .tags
            .iter()
            .filter_map(|t| optional_text(t))
            .collect();

        let run = Run {
            id,
            date: to_stored_precision(self.date.unwrap_or(default_date)),
            distance,
            duration,
            pace,
            location: self.location.trim().to_string(),
            route: None,
            weather,
            heart_rate,
            elevation: parse_number_or("elevation", &self.elevation, 0.0)?,
            calories,
            notes: self.notes,
            difficulty: rating("Difficulty", self.difficulty)?,
            enjoyment: Some(rating("Enjoyment", self.enjoyment)?),
            run_type: self.run_type,
            tags: (!tags.is_empty()).then_some(tags),
            splits: Vec::new(),
            equipment_id: None,
        };
        debug!(run = %run.id, distance, pace = %run.pace, "Run draft accepted");
        Ok(run)
    }
}

/// Raw input for a new goal
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoalDraft {
    pub title: String,
    pub description: String,
    pub target_type: TargetType,
    pub target_distance: String,
    pub target_time: String,
    pub target_pace: String,
    pub deadline: Option<DateTime<Utc>>,
}

impl GoalDraft {
    /// Build a goal starting at `now`, with zero progress
    pub fn into_goal(self, now: DateTime<Utc>) -> Result<Goal, ValidationError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.deadline.is_none() {
            missing.push("deadline");
        }
        let Some(deadline) = self.deadline.filter(|_| missing.is_empty()) else {
            return Err(ValidationError::MissingFields {
                fields: missing.join(", "),
            });
        };
        // A deadline on the start day itself is allowed
        if deadline.date_naive() < now.date_naive() {
            return Err(ValidationError::DeadlineBeforeStart);
        }

        let target_distance = match optional_text(&self.target_distance) {
            Some(text) => {
                let distance = parse_number("target distance", &text)?;
                if distance <= 0.0 {
                    return Err(ValidationError::NonPositiveDistance);
                }
                Some(distance)
            }
            None => None,
        };

        let target_time = optional_text(&self.target_time);
        if let Some(time) = &target_time {
            if !is_duration_text(time) {
                return Err(ValidationError::InvalidDuration { value: time.clone() });
            }
        }

        Ok(Goal {
            id: generate_id(),
            title: self.title.trim().to_string(),
            description: optional_text(&self.description),
            target_type: self.target_type,
            target_distance,
            target_time,
            target_pace: optional_text(&self.target_pace),
            start_date: to_stored_precision(now),
            deadline: to_stored_precision(deadline),
            recurring_type: None,
            progress: 0.0,
            current_value: None,
            is_completed: false,
            completion_date: None,
            associated_run_ids: None,
        })
    }
}

/// Copy of `goal` with a manually recorded progress percentage
pub fn with_progress(goal: &Goal, progress: f64) -> Result<Goal, ValidationError> {
    if !(0.0..=100.0).contains(&progress) {
        return Err(ValidationError::ProgressOutOfRange { value: progress });
    }
    Ok(Goal {
        progress,
        ..goal.clone()
    })
}

/// Copy of `goal` marked completed at `at`
pub fn completed(goal: &Goal, at: DateTime<Utc>) -> Goal {
    Goal {
        progress: 100.0,
        is_completed: true,
        completion_date: Some(to_stored_precision(at)),
        ..goal.clone()
    }
}

/// Profile edits; `None` leaves a field unchanged
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    /// An empty string clears the stored email
    pub email: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub distance_unit: Option<DistanceUnit>,
    pub temperature_unit: Option<TemperatureUnit>,
    pub theme: Option<Theme>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }

    /// Apply the edits on top of `profile`. Aggregates, personal bests and
    /// every field not named here are kept.
    pub fn apply(self, profile: &UserProfile) -> Result<UserProfile, ValidationError> {
        let mut updated = profile.clone();

        if let Some(name) = self.display_name {
            updated.display_name = optional_text(&name).ok_or_else(|| {
                ValidationError::MissingFields {
                    fields: "display name".to_string(),
                }
            })?;
        }

        if let Some(email) = self.email {
            updated.email = match optional_text(&email) {
                Some(email) if is_valid_email(&email) => Some(email),
                Some(email) => return Err(ValidationError::InvalidEmail { value: email }),
                None => None,
            };
        }

        if let Some(height) = self.height {
            updated.height = positive_measure("height", &height)?;
        }
        if let Some(weight) = self.weight {
            updated.weight = positive_measure("weight", &weight)?;
        }

        let preferences = &mut updated.preferences;
        if let Some(unit) = self.distance_unit {
            preferences.distance_unit = unit;
        }
        if let Some(unit) = self.temperature_unit {
            preferences.temperature_unit = unit;
        }
        if let Some(theme) = self.theme {
            preferences.theme = theme;
        }

        Ok(updated)
    }
}

/// Blank clears the measure; anything else must be a positive number
fn positive_measure(field: &str, text: &str) -> Result<Option<f64>, ValidationError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value = parse_number(field, text)?;
    if value <= 0.0 {
        return Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            value: text.to_string(),
        });
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn draft(distance: &str, duration: &str, location: &str) -> RunDraft {
        RunDraft {
            distance: distance.to_string(),
            duration: duration.to_string(),
            location: location.to_string(),
            ..RunDraft::default()
        }
    }

    #[test]
    fn test_duration_shape() {
        assert!(is_duration_text("45:00"));
        assert!(is_duration_text("1:05:09"));
        assert!(is_duration_text("01:05:09"));
        assert!(!is_duration_text("100:00"));
        assert!(!is_duration_text("45:0"));
        assert!(!is_duration_text("45"));
        assert!(!is_duration_text("1:2:3:4"));
        assert!(!is_duration_text("aa:bb"));
        assert!(!is_duration_text("05:"));
        assert!(!is_duration_text("1:05:"));
    }

    #[test]
    fn test_run_draft_required_fields() {
        let err = draft("", "45:00", "").into_run(None, now()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                fields: "distance, location".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: distance, location."
        );
    }

    #[test]
    fn test_run_draft_rejects_bad_values() {
        assert_eq!(
            draft("0", "45:00", "Park").validate(),
            Err(ValidationError::NonPositiveDistance)
        );
        assert_eq!(
            draft("-2", "45:00", "Park").validate().unwrap_err().to_string(),
            "Distance must be greater than 0."
        );
        assert!(matches!(
            draft("five", "45:00", "Park").validate(),
            Err(ValidationError::InvalidNumber { .. })
        ));
        assert_eq!(
            draft("5", "45 minutes", "Park").validate().unwrap_err().to_string(),
            "Duration must be in MM:SS or HH:MM:SS format."
        );

        let mut bad_rating = draft("5", "45:00", "Park");
        bad_rating.difficulty = 7;
        assert!(matches!(
            bad_rating.into_run(None, now()),
            Err(ValidationError::RatingOutOfRange { value: 7, .. })
        ));
    }

    #[test]
    fn test_run_draft_builds_run_with_defaults() {
        let run = draft("5", "00:45:00", " Riverside ").into_run(None, now()).unwrap();

        assert_eq!(run.distance, 5.0);
        assert_eq!(run.pace, "09:00/mi");
        assert_eq!(run.calories, 500);
        assert_eq!(run.location, "Riverside");
        assert_eq!(run.date, now());
        assert_eq!(run.weather, Weather::default());
        assert_eq!(run.heart_rate, HeartRate::default());
        assert_eq!(run.elevation, 0.0);
        assert_eq!(run.difficulty.value(), 3);
        assert_eq!(run.enjoyment.map(|r| r.value()), Some(3));
        assert_eq!(run.run_type, RunType::Training);
        assert!(run.tags.is_none());
        assert!(!run.id.is_empty());
    }

    #[test]
    fn test_run_draft_uses_profile_unit_and_weight() {
        let mut profile = UserProfile::default();
        profile.preferences.distance_unit = DistanceUnit::Kilometers;
        profile.weight = Some(180.0);

        let run = draft("10", "50:00", "Track").into_run(Some(&profile), now()).unwrap();
        assert_eq!(run.pace, "05:00/km");
        // 10 km is ~6.214 miles, scaled by 180/150
        assert_eq!(run.calories, 746);
    }

    #[test]
    fn test_updated_run_keeps_identity() {
        let original = draft("5", "45:00", "Park").into_run(None, now()).unwrap();

        let mut edit = RunDraft::from_run(&original);
        edit.distance = "6".to_string();
        edit.notes = "GPS was off".to_string();

        let updated = edit.into_updated_run(&original, None).unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.date, original.date);
        assert_eq!(updated.distance, 6.0);
        assert_eq!(updated.pace, "07:30/mi");
        assert_eq!(updated.notes, "GPS was off");
    }

    #[test]
    fn test_goal_draft() {
        let deadline = Utc.with_ymd_and_hms(2024, 10, 13, 0, 0, 0).unwrap();
        let goal = GoalDraft {
            title: "Chicago".to_string(),
            target_distance: "26.2".to_string(),
            deadline: Some(deadline),
            ..GoalDraft::default()
        }
        .into_goal(now())
        .unwrap();

        assert_eq!(goal.title, "Chicago");
        assert_eq!(goal.target_type, TargetType::Distance);
        assert_eq!(goal.target_distance, Some(26.2));
        assert_eq!(goal.start_date, now());
        assert_eq!(goal.progress, 0.0);
        assert!(!goal.is_completed);
        assert!(goal.description.is_none());
    }

    #[test]
    fn test_goal_deadline_on_start_day() {
        // Plain dates parse as midnight, which is before the noon start
        let today = GoalDraft {
            title: "Parkrun PB".to_string(),
            deadline: Some(parse_date_field("2024-06-01").unwrap()),
            ..GoalDraft::default()
        }
        .into_goal(now())
        .unwrap();

        assert_eq!(today.deadline.date_naive(), now().date_naive());
        assert!(today.deadline < today.start_date);
    }

    #[test]
    fn test_timestamps_truncated_to_millis() {
        let precise = now() + chrono::Duration::nanoseconds(680_175_510);

        let run = draft("5", "45:00", "Park").into_run(None, precise).unwrap();
        assert_eq!(run.date.timestamp_subsec_nanos(), 680_000_000);

        let goal = GoalDraft {
            title: "Fall half".to_string(),
            deadline: Some(precise + chrono::Duration::days(30)),
            ..GoalDraft::default()
        }
        .into_goal(precise)
        .unwrap();
        assert_eq!(goal.start_date.timestamp_subsec_nanos(), 680_000_000);
        assert_eq!(goal.deadline.timestamp_subsec_nanos(), 680_000_000);

        let done = completed(&goal, precise);
        assert_eq!(done.completion_date.unwrap().timestamp_subsec_nanos(), 680_000_000);
    }

    #[test]
    fn test_goal_draft_rejections() {
        let missing = GoalDraft::default().into_goal(now()).unwrap_err();
        assert_eq!(
            missing,
            ValidationError::MissingFields {
                fields: "title, deadline".to_string()
            }
        );

        let past = GoalDraft {
            title: "Too late".to_string(),
            deadline: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..GoalDraft::default()
        };
        assert_eq!(past.into_goal(now()), Err(ValidationError::DeadlineBeforeStart));

        let yesterday = GoalDraft {
            title: "Yesterday".to_string(),
            deadline: Some(Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap()),
            ..GoalDraft::default()
        };
        assert_eq!(yesterday.into_goal(now()), Err(ValidationError::DeadlineBeforeStart));

        let bad_time = GoalDraft {
            title: "Sub 3".to_string(),
            target_type: TargetType::Time,
            target_time: "3 hours".to_string(),
            deadline: Some(Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap()),
            ..GoalDraft::default()
        };
        assert!(matches!(
            bad_time.into_goal(now()),
            Err(ValidationError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_goal_progress_and_completion() {
        let goal = GoalDraft {
            title: "Streak".to_string(),
            target_type: TargetType::Custom,
            deadline: Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()),
            ..GoalDraft::default()
        }
        .into_goal(now())
        .unwrap();

        assert_eq!(with_progress(&goal, 40.0).unwrap().progress, 40.0);
        assert_eq!(
            with_progress(&goal, 140.0),
            Err(ValidationError::ProgressOutOfRange { value: 140.0 })
        );

        let done = completed(&goal, now());
        assert!(done.is_completed);
        assert_eq!(done.completion_date, Some(now()));
        assert_eq!(done.id, goal.id);
    }

    #[test]
    fn test_profile_update() {
        let mut profile = UserProfile::default();
        profile.total_lifetime_miles = 120.0;

        let updated = ProfileUpdate {
            display_name: Some("Alex".to_string()),
            email: Some("alex@example.com".to_string()),
            weight: Some("165".to_string()),
            distance_unit: Some(DistanceUnit::Kilometers),
            ..ProfileUpdate::default()
        }
        .apply(&profile)
        .unwrap();

        assert_eq!(updated.display_name, "Alex");
        assert_eq!(updated.email.as_deref(), Some("alex@example.com"));
        assert_eq!(updated.weight, Some(165.0));
        assert_eq!(updated.preferences.distance_unit, DistanceUnit::Kilometers);
        assert_eq!(updated.total_lifetime_miles, 120.0);
        assert_eq!(updated.id, profile.id);

        let cleared = ProfileUpdate {
            email: Some(String::new()),
            ..ProfileUpdate::default()
        }
        .apply(&updated)
        .unwrap();
        assert!(cleared.email.is_none());
    }

    #[test]
    fn test_profile_update_rejections() {
        let profile = UserProfile::default();
        assert!(matches!(
            ProfileUpdate {
                email: Some("not-an-email".to_string()),
                ..ProfileUpdate::default()
            }
            .apply(&profile),
            Err(ValidationError::InvalidEmail { .. })
        ));
        assert!(matches!(
            ProfileUpdate {
                display_name: Some("  ".to_string()),
                ..ProfileUpdate::default()
            }
            .apply(&profile),
            Err(ValidationError::MissingFields { .. })
        ));
        assert!(matches!(
            ProfileUpdate {
                height: Some("-70".to_string()),
                ..ProfileUpdate::default()
            }
            .apply(&profile),
            Err(ValidationError::InvalidNumber { .. })
        ));
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_parse_date_field() {
        assert_eq!(
            parse_date_field("2024-06-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_date_field("yesterday"),
            Err(ValidationError::InvalidDate { .. })
        ));
    }
}
