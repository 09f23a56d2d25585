// Actions flowing to the network actor and events flowing back.
use crate::client::ExportFormat;
use crate::coordinator::AssignGesture;
use crate::model::rules::RuleDraft;
use crate::model::{ExamCalendar, Id, NewCalendar, NewSubject, Rule, Subject, User, Version};

use chrono::NaiveDate;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Action {
    OpenCalendar(Id),
    BackHome,
    CreateCalendar(NewCalendar),
    DeleteCalendar(Id),
    CreateSubject(NewSubject),
    ToggleHeavy(Id, bool),
    DeleteSubject(Id),
    Assign(AssignGesture),
    RemoveEvent(Id),
    ToggleBlockedDay(NaiveDate),
    SaveVersion(String),
    RestoreVersion(Id),
    DeleteVersion(Id),
    CreateRule(RuleDraft),
    DeleteRule(Id),
    Export(ExportFormat, Option<Id>),
    Refresh,
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    SessionReady(User),
    HomeLoaded(Vec<ExamCalendar>, Vec<Subject>),
    BoardLoaded(Box<(ExamCalendar, Vec<Subject>, Vec<Rule>, Vec<Version>)>),
    /// Non-blocking soft-rule warning attached to a saved assignment.
    Warning(String),
    Status(String),
    Error(String),
    ExportSaved(PathBuf),
}
