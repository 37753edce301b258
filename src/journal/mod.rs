use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

mod categories;

pub use categories::{Category, SymptomCategory, CATEGORIES};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(entry_date, Date, "[year]-[month]-[day]");

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 10;

/// Subjective intensity on the 1..=10 scale. Out-of-range values cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIDPOINT: Severity = Severity(5);

    pub fn new(value: u8) -> Option<Self> {
        (MIN_SEVERITY..=MAX_SEVERITY)
            .contains(&value)
            .then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn band(self) -> SeverityBand {
        match self.0 {
            0..=3 => SeverityBand::Mild,
            4..=6 => SeverityBand::Moderate,
            7..=8 => SeverityBand::Severe,
            _ => SeverityBand::VerySevere,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::MIDPOINT
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Severity::new(value).ok_or_else(|| {
            format!("severity {value} outside {MIN_SEVERITY}..={MAX_SEVERITY}")
        })
    }
}

impl From<Severity> for u8 {
    fn from(value: Severity) -> Self {
        value.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, MAX_SEVERITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityBand {
    Mild,
    Moderate,
    Severe,
    VerySevere,
}

impl SeverityBand {
    pub fn label(self) -> &'static str {
        match self {
            SeverityBand::Mild => "Mild",
            SeverityBand::Moderate => "Moderate",
            SeverityBand::Severe => "Severe",
            SeverityBand::VerySevere => "Very Severe",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeOfDay {
    #[default]
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// A logged symptom observation. Never mutated once persisted.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(with = "entry_date")]
    pub date: Date,
    pub symptom: String,
    pub category: Category,
    pub severity: Severity,
    pub notes: Option<String>,
    pub time_of_day: TimeOfDay,
    pub duration: Option<NonZeroU32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Entry body without identity, as posted to the remote backend.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    #[serde(with = "entry_date")]
    pub date: Date,
    pub symptom: String,
    pub category: Category,
    pub severity: Severity,
    pub notes: Option<String>,
    pub time_of_day: TimeOfDay,
    pub duration: Option<NonZeroU32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl NewEntry {
    pub fn with_id(self, id: String) -> Entry {
        Entry {
            id,
            date: self.date,
            symptom: self.symptom,
            category: self.category,
            severity: self.severity,
            notes: self.notes,
            time_of_day: self.time_of_day,
            duration: self.duration,
            created_at: self.created_at,
        }
    }
}

impl Entry {
    pub fn to_new_entry(&self) -> NewEntry {
        NewEntry {
            date: self.date,
            symptom: self.symptom.clone(),
            category: self.category,
            severity: self.severity,
            notes: self.notes.clone(),
            time_of_day: self.time_of_day,
            duration: self.duration,
            created_at: self.created_at,
        }
    }
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn parse_date(input: &str) -> Result<Date, time::error::Parse> {
    Date::parse(input.trim(), DATE_FORMAT)
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn sample() -> Entry {
        Entry {
            id: "abc".into(),
            date: date!(2024 - 03 - 09),
            symptom: "Headache".into(),
            category: Category::Pain,
            severity: Severity::new(7).expect("valid severity"),
            notes: None,
            time_of_day: TimeOfDay::Evening,
            duration: NonZeroU32::new(45),
            created_at: datetime!(2024-03-09 18:30 UTC),
        }
    }

    #[test]
    fn severity_rejects_out_of_range_values() {
        assert!(Severity::new(0).is_none());
        assert!(Severity::new(11).is_none());
        assert_eq!(Severity::new(1).map(Severity::get), Some(1));
        assert_eq!(Severity::new(10).map(Severity::get), Some(10));
        assert_eq!(Severity::default().get(), 5);
    }

    #[test]
    fn severity_bands_follow_thresholds() {
        let label = |v| Severity::new(v).expect("valid").band().label();
        assert_eq!(label(3), "Mild");
        assert_eq!(label(4), "Moderate");
        assert_eq!(label(6), "Moderate");
        assert_eq!(label(8), "Severe");
        assert_eq!(label(9), "Very Severe");
    }

    #[test]
    fn entry_serializes_with_camel_case_and_omits_absent_fields() {
        let mut entry = sample();
        entry.duration = None;
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["date"], "2024-03-09");
        assert_eq!(json["timeOfDay"], "evening");
        assert_eq!(json["category"], "pain");
        assert_eq!(json["severity"], 7);
        assert!(json.get("notes").is_none());
        assert!(json.get("duration").is_none());
        assert!(json["createdAt"].as_str().is_some());
    }

    #[test]
    fn entry_accepts_document_store_identity_alias() {
        let raw = r#"{
            "_id": "65f0c0ffee",
            "date": "2024-03-09",
            "symptom": "Cough",
            "category": "respiratory",
            "severity": 4,
            "timeOfDay": "night",
            "createdAt": "2024-03-09T21:00:00Z",
            "__v": 0
        }"#;
        let entry: Entry = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(entry.id, "65f0c0ffee");
        assert_eq!(entry.category, Category::Respiratory);
        assert_eq!(entry.time_of_day, TimeOfDay::Night);
        assert_eq!(entry.notes, None);
    }

    #[test]
    fn entry_rejects_invalid_severity_and_category() {
        let bad_severity = r#"{"id":"x","date":"2024-03-09","symptom":"a","category":"pain",
            "severity":11,"timeOfDay":"night","createdAt":"2024-03-09T21:00:00Z"}"#;
        assert!(serde_json::from_str::<Entry>(bad_severity).is_err());

        let bad_category = r#"{"id":"x","date":"2024-03-09","symptom":"a","category":"bones",
            "severity":3,"timeOfDay":"night","createdAt":"2024-03-09T21:00:00Z"}"#;
        assert!(serde_json::from_str::<Entry>(bad_category).is_err());
    }

    #[test]
    fn new_entry_gains_identity() {
        let entry = sample();
        let rebuilt = entry.to_new_entry().with_id(entry.id.clone());
        assert_eq!(rebuilt, entry);
    }

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert_eq!(parse_date(" 2024-02-29 ").ok(), Some(date!(2024 - 02 - 29)));
        assert!(parse_date("02/29/2024").is_err());
        assert_eq!(format_date(date!(2024 - 01 - 05)), "2024-01-05");
    }
}
