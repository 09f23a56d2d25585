// The planner board: one calendar plus the collections rendered around it.
// Rebuilt wholesale from fresh server data after every mutation.
use crate::drag::DragRegistry;
use crate::grid::MonthGrid;
use crate::model::validate::DropPolicy;
use crate::model::{EventRecord, ExamCalendar, Id, Rule, SemesterGroup, Subject, Version};

use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug)]
pub struct PlannerBoard {
    pub calendar: ExamCalendar,
    pub subjects: Vec<Subject>,
    pub rules: Vec<Rule>,
    pub versions: Vec<Version>,
    pub drag: DragRegistry,
    assigned: HashSet<Id>,
}

impl PlannerBoard {
    pub fn new(
        calendar: ExamCalendar,
        subjects: Vec<Subject>,
        rules: Vec<Rule>,
        versions: Vec<Version>,
    ) -> Self {
        let mut board = Self {
            calendar,
            subjects,
            rules: Vec::new(),
            versions: Vec::new(),
            drag: DragRegistry::new(),
            assigned: HashSet::new(),
        };
        board.install(rules, versions);
        board
    }

    /// Swaps in a freshly fetched snapshot, keeping derived state in sync.
    pub fn replace(
        &mut self,
        calendar: ExamCalendar,
        subjects: Vec<Subject>,
        rules: Vec<Rule>,
        versions: Vec<Version>,
    ) {
        self.calendar = calendar;
        self.subjects = subjects;
        self.install(rules, versions);
    }

    fn install(&mut self, rules: Vec<Rule>, versions: Vec<Version>) {
        let id = self.calendar.id;
        // Global rules apply everywhere; calendar rules only to their own.
        self.rules = rules
            .into_iter()
            .filter(|r| r.global_rule || r.calendar == Some(id))
            .collect();
        self.versions = versions.into_iter().filter(|v| v.calendar == id).collect();
        self.assigned = self.calendar.events.iter().map(|e| e.subject).collect();
        self.drag.rebuild(&self.subjects, &self.calendar.events);
    }

    pub fn policy(&self) -> DropPolicy {
        DropPolicy::for_calendar(&self.calendar)
    }

    pub fn grid(&self) -> MonthGrid {
        MonthGrid::build(&self.policy())
    }

    pub fn events_on(&self, date: NaiveDate) -> impl Iterator<Item = &EventRecord> {
        self.calendar.events.iter().filter(move |e| e.date == date)
    }

    pub fn event(&self, id: Id) -> Option<&EventRecord> {
        self.calendar.events.iter().find(|e| e.id == id)
    }

    pub fn subject_name(&self, id: Id) -> String {
        self.subjects
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Subject {}", id))
    }

    pub fn is_assigned(&self, subject: Id) -> bool {
        self.assigned.contains(&subject)
    }

    pub fn is_heavy(&self, subject: Id) -> bool {
        self.subjects
            .iter()
            .find(|s| s.id == subject)
            .is_some_and(|s| s.is_heavy)
    }

    /// Sidebar chips for one semester group, unassigned subjects only.
    pub fn unassigned_in_group(&self, group: SemesterGroup) -> Vec<&Subject> {
        self.subjects
            .iter()
            .filter(|s| s.semester_group == group && !self.is_assigned(s.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PeriodType, RuleParams, RuleType, Severity};

    fn calendar(id: Id) -> ExamCalendar {
        ExamCalendar {
            id,
            name: "P1".to_string(),
            period_type: PeriodType::P1,
            start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
            blocked_days: vec![],
            events: vec![EventRecord {
                id: 100,
                calendar: id,
                subject: 1,
                subject_name: "Algebra".to_string(),
                semester_group: SemesterGroup::Sem2,
                date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            }],
        }
    }

    fn subject(id: Id, group: SemesterGroup) -> Subject {
        Subject {
            id,
            name: format!("Subject {}", id),
            code: String::new(),
            semester_group: group,
            is_heavy: false,
            allowed_weekdays: vec![],
            fixed_dates: vec![],
        }
    }

    fn rule(id: Id, calendar: Option<Id>, global: bool) -> Rule {
        Rule {
            id,
            calendar,
            global_rule: global,
            rule_type: RuleType::PreferSameDay,
            severity: Severity::Soft,
            subject_a: None,
            subject_b: None,
            params: RuleParams::default(),
            enabled: true,
        }
    }

    #[test]
    fn keeps_own_and_global_rules_only() {
        let board = PlannerBoard::new(
            calendar(1),
            vec![],
            vec![rule(1, Some(1), false), rule(2, Some(2), false), rule(3, None, true)],
            vec![],
        );
        let ids: Vec<Id> = board.rules.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn assigned_subject_is_not_draggable() {
        let board = PlannerBoard::new(
            calendar(1),
            vec![subject(1, SemesterGroup::Sem2), subject(2, SemesterGroup::Sem2)],
            vec![],
            vec![],
        );
        assert!(board.is_assigned(1));
        assert!(!board.drag.is_registered(1));
        assert!(board.drag.is_registered(2));
        let chips = board.unassigned_in_group(SemesterGroup::Sem2);
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].id, 2);
    }

    #[test]
    fn replace_resyncs_derived_state() {
        let mut board = PlannerBoard::new(
            calendar(1),
            vec![subject(1, SemesterGroup::Sem2)],
            vec![],
            vec![],
        );
        assert!(board.is_assigned(1));

        let mut fresh = calendar(1);
        fresh.events.clear();
        board.replace(fresh, vec![subject(1, SemesterGroup::Sem2)], vec![], vec![]);
        assert!(!board.is_assigned(1));
        assert!(board.drag.is_registered(1));
    }

    #[test]
    fn versions_filtered_to_calendar() {
        let versions = vec![
            Version {
                id: 1,
                calendar: 1,
                version_number: 1,
                label: String::new(),
                created_at: None,
            },
            Version {
                id: 2,
                calendar: 9,
                version_number: 1,
                label: String::new(),
                created_at: None,
            },
        ];
        let board = PlannerBoard::new(calendar(1), vec![], vec![], versions);
        assert_eq!(board.versions.len(), 1);
        assert_eq!(board.versions[0].id, 1);
    }
}
