// Entity types mirroring the backend serializers. The backend owns and
// mutates all of these; the client holds disposable copies that are
// replaced wholesale after every mutation.
pub mod rules;
pub mod validate;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

pub type Id = i64;

/// Weekday names as the backend spells them in `allowed_weekdays` params.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum SemesterGroup {
    #[serde(rename = "SEM2")]
    Sem2,
    #[serde(rename = "SEM4")]
    Sem4,
    #[serde(rename = "OPEN")]
    Open,
}

impl SemesterGroup {
    pub fn label(&self) -> &'static str {
        match self {
            SemesterGroup::Sem2 => "2nd semester",
            SemesterGroup::Sem4 => "4th semester",
            SemesterGroup::Open => "Open subjects",
        }
    }
}

impl fmt::Display for SemesterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum PeriodType {
    P1,
    P2,
    F1,
    F2,
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodType::P1 => write!(f, "Midterm 1"),
            PeriodType::P2 => write!(f, "Midterm 2"),
            PeriodType::F1 => write!(f, "Final 1"),
            PeriodType::F2 => write!(f, "Final 2"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub semester_group: SemesterGroup,
    #[serde(default)]
    pub is_heavy: bool,
    #[serde(default)]
    pub allowed_weekdays: Vec<String>,
    #[serde(default)]
    pub fixed_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSubject {
    pub name: String,
    pub semester_group: SemesterGroup,
    pub is_heavy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Partial update payload for PATCH; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_heavy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester_group: Option<SemesterGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_weekdays: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedDay {
    #[serde(default)]
    pub id: Id,
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

/// A scheduled exam, denormalized with subject name and group for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Id,
    pub calendar: Id,
    pub subject: Id,
    #[serde(default)]
    pub subject_name: String,
    pub semester_group: SemesterGroup,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamCalendar {
    pub id: Id,
    pub name: String,
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub blocked_days: Vec<BlockedDay>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCalendar {
    pub name: String,
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum RuleType {
    #[serde(rename = "SAME_DAY")]
    SameDay,
    #[serde(rename = "PREFER_SAME_DAY")]
    PreferSameDay,
    #[serde(rename = "HEAVY_NOT_SAME_DAY")]
    HeavyNotSameDay,
    #[serde(rename = "SUBJECT_ONLY_WEEKDAYS")]
    SubjectOnlyWeekdays,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::SameDay => write!(f, "Mandatory same day"),
            RuleType::PreferSameDay => write!(f, "Prefer same day"),
            RuleType::HeavyNotSameDay => write!(f, "Heavy subjects proximity warning"),
            RuleType::SubjectOnlyWeekdays => write!(f, "Single weekday only"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum Severity {
    #[serde(rename = "HARD")]
    Hard,
    #[serde(rename = "SOFT")]
    Soft,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Hard => write!(f, "hard"),
            Severity::Soft => write!(f, "soft"),
        }
    }
}

/// Type-dependent rule parameters. Only the weekday restriction uses it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleParams {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_weekdays: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: Id,
    #[serde(default)]
    pub calendar: Option<Id>,
    #[serde(default)]
    pub global_rule: bool,
    pub rule_type: RuleType,
    pub severity: Severity,
    #[serde(default)]
    pub subject_a: Option<Id>,
    #[serde(default)]
    pub subject_b: Option<Id>,
    #[serde(default)]
    pub params: RuleParams,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRule {
    pub rule_type: RuleType,
    pub severity: Severity,
    pub calendar: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_a: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_b: Option<Id>,
    pub params: RuleParams,
    pub enabled: bool,
    pub global_rule: bool,
}

/// Immutable snapshot of a calendar's event layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub id: Id,
    pub calendar: Id,
    pub version_number: u32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
}

/// Soft-rule violation attached to a successful assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignWarning {
    #[serde(default)]
    pub severity: Option<String>,
    pub message: String,
}

/// Response of the assign/move endpoint: the upserted event, plus a
/// non-blocking warning when a soft rule was violated.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignResponse {
    #[serde(flatten)]
    pub event: EventRecord,
    #[serde(default)]
    pub warning: Option<AssignWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_parses_with_embedded_collections() {
        let raw = r#"{
            "id": 3,
            "name": "Finals 2026",
            "period_type": "F1",
            "start_date": "2026-02-01",
            "end_date": "2026-02-28",
            "blocked_days": [{"id": 1, "calendar": 3, "date": "2026-02-14", "reason": "HOLIDAY"}],
            "events": [{"id": 9, "calendar": 3, "subject": 7, "subject_name": "Physics II",
                        "semester_group": "SEM4", "date": "2026-02-16"}]
        }"#;
        let cal: ExamCalendar = serde_json::from_str(raw).unwrap();
        assert_eq!(cal.blocked_days.len(), 1);
        assert_eq!(cal.events[0].subject, 7);
        assert_eq!(cal.events[0].semester_group, SemesterGroup::Sem4);
    }

    #[test]
    fn calendar_list_entry_parses_without_collections() {
        let raw = r#"{"id": 1, "name": "P1", "period_type": "P1",
                      "start_date": "2026-03-02", "end_date": "2026-03-13"}"#;
        let cal: ExamCalendar = serde_json::from_str(raw).unwrap();
        assert!(cal.blocked_days.is_empty());
        assert!(cal.events.is_empty());
    }

    #[test]
    fn assign_response_flattens_event_and_warning() {
        let raw = r#"{"id": 4, "calendar": 1, "subject": 5, "subject_name": "Algebra",
                      "semester_group": "SEM2", "date": "2026-02-10",
                      "warning": {"is_valid": true, "severity": "soft", "message": "Preference unmet"}}"#;
        let resp: AssignResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.event.id, 4);
        assert_eq!(resp.warning.unwrap().message, "Preference unmet");
    }

    #[test]
    fn assign_response_warning_may_be_null() {
        let raw = r#"{"id": 4, "calendar": 1, "subject": 5, "subject_name": "Algebra",
                      "semester_group": "SEM2", "date": "2026-02-10", "warning": null}"#;
        let resp: AssignResponse = serde_json::from_str(raw).unwrap();
        assert!(resp.warning.is_none());
    }
}
