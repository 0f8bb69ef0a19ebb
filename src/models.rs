use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Distance unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
}

impl DistanceUnit {
    /// Suffix appended to pace strings
    pub fn pace_suffix(&self) -> &'static str {
        match self {
            DistanceUnit::Miles => "/mi",
            DistanceUnit::Kilometers => "/km",
        }
    }

    /// Short label for distances
    pub fn abbreviation(&self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceUnit::Miles => write!(f, "miles"),
            DistanceUnit::Kilometers => write!(f, "kilometers"),
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "miles" | "mile" | "mi" => Ok(DistanceUnit::Miles),
            "kilometers" | "kilometres" | "km" => Ok(DistanceUnit::Kilometers),
            _ => Err(format!("Invalid distance unit: {}", s)),
        }
    }
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            _ => Err(format!("Invalid temperature unit: {}", s)),
        }
    }
}

/// Display theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(format!("Invalid theme: {}", s)),
        }
    }
}

/// Run categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunType {
    #[default]
    Training,
    Race,
    LongRun,
    Tempo,
    Interval,
    Recovery,
}

impl RunType {
    pub const ALL: [RunType; 6] = [
        RunType::Training,
        RunType::Race,
        RunType::LongRun,
        RunType::Tempo,
        RunType::Interval,
        RunType::Recovery,
    ];
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunType::Training => "training",
            RunType::Race => "race",
            RunType::LongRun => "long-run",
            RunType::Tempo => "tempo",
            RunType::Interval => "interval",
            RunType::Recovery => "recovery",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RunType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunType::ALL
            .iter()
            .copied()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid run type: {}", s))
    }
}

/// A 1-5 rating (perceived effort or enjoyment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(ValidationError::RatingOutOfRange {
                field: "Rating".to_string(),
                value,
            })
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Rating(3)
    }
}

impl TryFrom<u8> for Rating {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Named route with optional GPX track
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpx_data: Option<String>,
}

/// Weather conditions during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    /// Degrees in the user's temperature unit
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    pub conditions: String,
}

impl Default for Weather {
    fn default() -> Self {
        Weather {
            temperature: 70.0,
            humidity: 50.0,
            wind_speed: None,
            conditions: "Clear".to_string(),
        }
    }
}

/// Minutes spent in one heart rate zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTime {
    pub zone: u8,
    pub minutes: f64,
}

/// Heart rate snapshot for a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRate {
    pub avg: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<ZoneTime>>,
}

/// Per-unit split (one mile or one kilometer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    /// 1-based mile/kilometer index
    #[serde(rename = "mile")]
    pub index: u32,
    pub time: String,
    pub pace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

/// A single logged run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,
    #[serde(with = "date_format")]
    pub date: DateTime<Utc>,
    /// Distance in the user's preferred unit
    pub distance: f64,
    /// `HH:MM:SS` or `MM:SS`
    pub duration: String,
    pub pace: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    pub weather: Weather,
    pub heart_rate: HeartRate,
    /// Total elevation gain
    pub elevation: f64,
    pub calories: u32,
    pub notes: String,
    pub difficulty: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enjoyment: Option<Rating>,
    #[serde(rename = "type")]
    pub run_type: RunType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub splits: Vec<Split>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,
}

impl Run {
    /// Duration in seconds, 0 when the text is malformed
    pub fn duration_seconds(&self) -> u32 {
        crate::metrics::parse_duration(&self.duration)
    }
}

/// What a goal measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    #[default]
    Distance,
    Time,
    Pace,
    Race,
    Custom,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetType::Distance => "distance",
            TargetType::Time => "time",
            TargetType::Pace => "pace",
            TargetType::Race => "race",
            TargetType::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "distance" => Ok(TargetType::Distance),
            "time" => Ok(TargetType::Time),
            "pace" => Ok(TargetType::Pace),
            "race" => Ok(TargetType::Race),
            "custom" => Ok(TargetType::Custom),
            _ => Err(format!("Invalid goal target type: {}", s)),
        }
    }
}

/// Goal recurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringType {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A training goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub target_type: TargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_pace: Option<String>,

    #[serde(with = "date_format")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "date_format")]
    pub deadline: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_type: Option<RecurringType>,

    /// Percentage complete, 0-100. Only authoritative for non-distance goals.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    pub is_completed: bool,
    #[serde(
        default,
        with = "date_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_run_ids: Option<Vec<String>>,
}

/// Training plan difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanDifficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// Kind of session scheduled in a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannedWorkoutType {
    Rest,
    Easy,
    Tempo,
    Interval,
    Long,
    Recovery,
    Race,
}

/// One scheduled session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedWorkout {
    /// 0-6, Sunday first
    pub day: u8,
    pub workout_type: PlannedWorkoutType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub description: String,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_run_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanWeek {
    pub week_number: u32,
    pub weekly_distance: f64,
    pub workouts: Vec<PlannedWorkout>,
}

/// Multi-week training plan. Carried in state; nothing mutates it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPlan {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(
        default,
        with = "date_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub goal_race_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_race_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<String>,
    pub difficulty: PlanDifficulty,
    #[serde(with = "date_format")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "date_format")]
    pub end_date: DateTime<Utc>,
    pub weeks: Vec<PlanWeek>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentType {
    Shoes,
    Watch,
    Apparel,
    Other,
}

/// Gear used on runs. Carried in state; nothing mutates it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(with = "date_format")]
    pub date_added: DateTime<Utc>,
    pub is_retired: bool,
    #[serde(
        default,
        with = "date_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub retirement_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub total_mileage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_recommended_mileage: Option<f64>,
    pub associated_run_ids: Vec<String>,
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub distance_unit: DistanceUnit,
    pub temperature_unit: TemperatureUnit,
    pub theme: Theme,
    /// Opaque layout blob owned by the dashboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_layout: Option<serde_json::Value>,
}

/// Best time at a standard race distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBest {
    pub time: String,
    #[serde(with = "date_format")]
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBests {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub five_k: Option<PersonalBest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ten_k: Option<PersonalBest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_marathon: Option<PersonalBest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marathon: Option<PersonalBest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongestRun {
    pub distance: f64,
    #[serde(with = "date_format")]
    pub date: DateTime<Utc>,
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YearToDateStats {
    pub distance: f64,
    pub runs: u32,
    /// Never recomputed by the store
    pub hours: f64,
}

/// The single user profile of an installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        with = "date_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_birth: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Body weight in pounds, used for calorie estimates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    pub preferences: Preferences,
    #[serde(default)]
    pub personal_bests: PersonalBests,

    /// Derived: sum of all run distances
    pub total_lifetime_miles: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longest_run: Option<LongestRun>,
    pub year_to_date_stats: YearToDateStats,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            id: "1".to_string(),
            display_name: "Marathon Runner".to_string(),
            email: None,
            date_of_birth: None,
            gender: None,
            height: None,
            weight: None,
            preferences: Preferences::default(),
            personal_bests: PersonalBests::default(),
            total_lifetime_miles: 0.0,
            longest_run: None,
            year_to_date_stats: YearToDateStats::default(),
        }
    }
}

/// Drop sub-millisecond precision so a timestamp survives the
/// `date_format` round trip unchanged.
pub fn to_stored_precision(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(3)
}

/// Parse stored or typed date text into a UTC timestamp.
///
/// Accepts RFC 3339 (`2024-03-01T06:30:00.000Z`), a naive timestamp
/// (`2024-03-01T06:30:00`) or a plain date (`2024-03-01`, midnight UTC).
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter writing dates as RFC 3339 with milliseconds and reading
/// any form `parse_date_text` accepts.
pub mod date_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::parse_date_text(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {}", text)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let text: Option<String> = Option::deserialize(deserializer)?;
            match text {
                Some(text) => super::super::parse_date_text(&text)
                    .map(Some)
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid date: {}", text))
                    }),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn sample_run() -> Run {
        Run {
            id: "run_123".to_string(),
            date: Utc.with_ymd_and_hms(2024, 9, 23, 6, 30, 0).unwrap(),
            distance: 6.2,
            duration: "00:52:10".to_string(),
            pace: "08:24/mi".to_string(),
            location: "Riverside loop".to_string(),
            route: None,
            weather: Weather::default(),
            heart_rate: HeartRate {
                avg: 148.0,
                max: 171.0,
                zones: Some(vec![ZoneTime { zone: 2, minutes: 30.0 }]),
            },
            elevation: 120.0,
            calories: 620,
            notes: "Felt strong".to_string(),
            difficulty: Rating::new(3).unwrap(),
            enjoyment: Some(Rating::new(4).unwrap()),
            run_type: RunType::LongRun,
            tags: Some(vec!["morning".to_string()]),
            splits: vec![Split {
                index: 1,
                time: "08:30".to_string(),
                pace: "08:30/mi".to_string(),
                elevation: None,
            }],
            equipment_id: None,
        }
    }

    #[test]
    fn test_run_type_serialization() {
        let json = serde_json::to_string(&RunType::LongRun).unwrap();
        assert_eq!(json, "\"long-run\"");

        let deserialized: RunType = serde_json::from_str("\"recovery\"").unwrap();
        assert_eq!(deserialized, RunType::Recovery);
        assert_eq!("Long-Run".parse::<RunType>().unwrap(), RunType::LongRun);
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(5).unwrap().value(), 5);

        let parsed: Result<Rating, _> = serde_json::from_str("9");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_run_json_layout() {
        let json = serde_json::to_string(&sample_run()).unwrap();
        assert!(json.contains("\"type\":\"long-run\""));
        assert!(json.contains("\"heartRate\""));
        assert!(json.contains("\"mile\":1"));
        assert!(json.contains("\"date\":\"2024-09-23T06:30:00.000Z\""));
        assert!(!json.contains("equipmentId"));
    }

    #[test]
    fn test_run_serialization_round_trip() {
        let run = sample_run();
        let json = serde_json::to_string(&run).unwrap();
        let deserialized: Run = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, run);
    }

    #[test]
    fn test_parse_date_text_forms() {
        let full = parse_date_text("2024-03-01T06:30:00.000Z").unwrap();
        assert_eq!(full, Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap());

        let offset = parse_date_text("2024-03-01T08:30:00+02:00").unwrap();
        assert_eq!(offset, full);

        let plain = parse_date_text("2024-03-01").unwrap();
        assert_eq!(plain.day(), 1);
        assert_eq!(plain, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        assert!(parse_date_text("March first").is_none());
    }

    #[test]
    fn test_stored_precision_survives_serialization() {
        let precise = Utc.with_ymd_and_hms(2024, 9, 23, 6, 30, 14).unwrap()
            + chrono::Duration::nanoseconds(680_175_510);
        let mut run = sample_run();
        run.date = to_stored_precision(precise);

        let json = serde_json::to_string(&run).unwrap();
        assert!(json.contains("\"2024-09-23T06:30:14.680Z\""));
        let back: Run = serde_json::from_str(&json).unwrap();
        assert_eq!(back.date, run.date);
        assert_eq!(back.date.timestamp_subsec_nanos(), 680_000_000);
    }

    #[test]
    fn test_goal_optional_dates() {
        let json = r#"{
            "id": "g1",
            "title": "Spring base",
            "targetType": "distance",
            "targetDistance": 100,
            "startDate": "2024-03-01",
            "deadline": "2024-05-31T00:00:00.000Z",
            "progress": 0,
            "isCompleted": false
        }"#;
        let goal: Goal = serde_json::from_str(json).unwrap();
        assert_eq!(goal.target_distance, Some(100.0));
        assert!(goal.completion_date.is_none());
        assert!(goal.deadline > goal.start_date);
    }

    #[test]
    fn test_user_profile_default() {
        let profile = UserProfile::default();
        assert_eq!(profile.id, "1");
        assert_eq!(profile.display_name, "Marathon Runner");
        assert_eq!(profile.preferences.distance_unit, DistanceUnit::Miles);
        assert_eq!(profile.preferences.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(profile.preferences.theme, Theme::Light);
        assert_eq!(profile.total_lifetime_miles, 0.0);
        assert_eq!(profile.year_to_date_stats, YearToDateStats::default());
    }

    #[test]
    fn test_profile_json_layout() {
        let mut profile = UserProfile::default();
        profile.personal_bests.five_k = Some(PersonalBest {
            time: "00:22:41".to_string(),
            date: Utc.with_ymd_and_hms(2024, 4, 14, 9, 0, 0).unwrap(),
            run_id: None,
        });

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"displayName\":\"Marathon Runner\""));
        assert!(json.contains("\"fiveK\""));
        assert!(json.contains("\"yearToDateStats\""));
        assert!(json.contains("\"distanceUnit\":\"miles\""));

        let deserialized: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, profile);
    }

    #[test]
    fn test_equipment_and_plan_deserialize() {
        let equipment: Equipment = serde_json::from_str(
            r#"{"id":"e1","name":"Trainers","type":"shoes","dateAdded":"2024-01-02",
                "isRetired":false,"totalMileage":112.5,"associatedRunIds":["r1"]}"#,
        )
        .unwrap();
        assert_eq!(equipment.equipment_type, EquipmentType::Shoes);

        let plan: TrainingPlan = serde_json::from_str(
            r#"{"id":"p1","name":"Half","description":"12 weeks","difficulty":"beginner",
                "startDate":"2024-01-01","endDate":"2024-03-24",
                "weeks":[{"weekNumber":1,"weeklyDistance":15,"workouts":[
                    {"day":0,"workoutType":"rest","description":"Off","isCompleted":false}]}]}"#,
        )
        .unwrap();
        assert_eq!(plan.weeks[0].workouts[0].workout_type, PlannedWorkoutType::Rest);
    }
}
