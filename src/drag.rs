// Registry of pickable subject chips. Only subjects without a placed event
// register a payload; everything the grid accepts must have been registered
// here first.
use crate::model::{EventRecord, Id, SemesterGroup, Subject};
use std::collections::HashMap;

/// What travels with a picked-up subject chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub subject_id: Id,
    pub semester_group: SemesterGroup,
    pub title: String,
}

#[derive(Debug, Default)]
pub struct DragRegistry {
    payloads: HashMap<Id, DragPayload>,
}

impl DragRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the registry from scratch. Subjects that already have an
    /// event on the board are left out; their chips are inert.
    pub fn rebuild(&mut self, subjects: &[Subject], events: &[EventRecord]) {
        self.payloads.clear();
        for subject in subjects {
            if events.iter().any(|e| e.subject == subject.id) {
                continue;
            }
            self.payloads.insert(
                subject.id,
                DragPayload {
                    subject_id: subject.id,
                    semester_group: subject.semester_group,
                    title: subject.name.clone(),
                },
            );
        }
    }

    pub fn payload(&self, subject: Id) -> Option<&DragPayload> {
        self.payloads.get(&subject)
    }

    pub fn is_registered(&self, subject: Id) -> bool {
        self.payloads.contains_key(&subject)
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn subject(id: Id, name: &str) -> Subject {
        Subject {
            id,
            name: name.to_string(),
            code: String::new(),
            semester_group: SemesterGroup::Sem2,
            is_heavy: false,
            allowed_weekdays: vec![],
            fixed_dates: vec![],
        }
    }

    #[test]
    fn assigned_subjects_are_not_registered() {
        let subjects = vec![subject(1, "Algebra"), subject(2, "Physics")];
        let events = vec![EventRecord {
            id: 10,
            calendar: 1,
            subject: 2,
            subject_name: "Physics".to_string(),
            semester_group: SemesterGroup::Sem2,
            date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        }];

        let mut registry = DragRegistry::new();
        registry.rebuild(&subjects, &events);

        assert!(registry.is_registered(1));
        assert!(!registry.is_registered(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rebuild_drops_stale_entries() {
        let mut registry = DragRegistry::new();
        registry.rebuild(&[subject(1, "Algebra")], &[]);
        assert!(registry.is_registered(1));

        registry.rebuild(&[subject(2, "Physics")], &[]);
        assert!(!registry.is_registered(1));
        assert!(registry.is_registered(2));
    }

    #[test]
    fn payload_carries_group_and_title() {
        let mut registry = DragRegistry::new();
        registry.rebuild(&[subject(7, "Chemistry")], &[]);
        let p = registry.payload(7).unwrap();
        assert_eq!(p.subject_id, 7);
        assert_eq!(p.title, "Chemistry");
        assert_eq!(p.semester_group, SemesterGroup::Sem2);
    }
}
