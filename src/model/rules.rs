// Rule drafting and presentation. The required fields of a rule-creation
// payload depend on the selected rule type; `RuleDraft::build` enforces
// that before any request is issued.
use crate::model::{
    Id, NewRule, Rule, RuleParams, RuleType, Severity, Subject, weekday_name,
};
use chrono::Weekday;

#[derive(Debug, Clone)]
pub struct RuleDraft {
    pub rule_type: RuleType,
    pub severity: Severity,
    pub subject_a: Option<Id>,
    pub subject_b: Option<Id>,
    pub weekday: Weekday,
}

impl Default for RuleDraft {
    fn default() -> Self {
        Self {
            rule_type: RuleType::PreferSameDay,
            severity: Severity::Soft,
            subject_a: None,
            subject_b: None,
            weekday: Weekday::Fri,
        }
    }
}

impl RuleDraft {
    /// Assembles the creation payload for the current calendar. Every
    /// created rule is calendar-scoped and enabled.
    ///
    /// For the weekday restriction, `subject_a` is mandatory, the params
    /// carry exactly the one selected weekday and `subject_b` is dropped.
    pub fn build(&self, calendar: Id) -> Result<NewRule, String> {
        if self.rule_type == RuleType::SubjectOnlyWeekdays && self.subject_a.is_none() {
            return Err("Select a subject for the single-weekday restriction.".to_string());
        }

        let (subject_b, params) = if self.rule_type == RuleType::SubjectOnlyWeekdays {
            (
                None,
                RuleParams {
                    allowed_weekdays: vec![weekday_name(self.weekday).to_string()],
                },
            )
        } else {
            (self.subject_b, RuleParams::default())
        };

        Ok(NewRule {
            rule_type: self.rule_type,
            severity: self.severity,
            calendar,
            subject_a: self.subject_a,
            subject_b,
            params,
            enabled: true,
            global_rule: false,
        })
    }
}

fn subject_label(id: Option<Id>, subjects: &[Subject], fallback: &str) -> String {
    match id {
        Some(id) => subjects
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Subject {}", id)),
        None => fallback.to_string(),
    }
}

/// Human-readable one-liner for the rules panel.
pub fn describe(rule: &Rule, subjects: &[Subject]) -> String {
    let a = subject_label(rule.subject_a, subjects, "Subject A");
    let b = subject_label(rule.subject_b, subjects, "Subject B");
    let suffix = if rule.global_rule { " [global rule]" } else { "" };

    match rule.rule_type {
        RuleType::SameDay => {
            format!("{} must sit the same day as {} ({}){}", a, b, rule.severity, suffix)
        }
        RuleType::PreferSameDay => {
            format!("{} ideally sits the same day as {} ({}){}", a, b, rule.severity, suffix)
        }
        RuleType::HeavyNotSameDay => format!(
            "Heavy subjects on the same or adjacent days raise a warning{}",
            suffix
        ),
        RuleType::SubjectOnlyWeekdays => {
            let days = &rule.params.allowed_weekdays;
            let label = if days.is_empty() {
                "a specific weekday".to_string()
            } else {
                days.join(", ")
            };
            format!("{} may only sit on {} ({}){}", a, label, rule.severity, suffix)
        }
    }
}

/// Confirmation prompt for rule deletion. The wording distinguishes a
/// globally-scoped rule from a calendar-scoped one.
pub fn delete_prompt(rule: &Rule) -> String {
    if rule.global_rule {
        "Delete this global rule?".to_string()
    } else {
        "Delete this calendar rule?".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_rule_requires_subject_a() {
        let draft = RuleDraft {
            rule_type: RuleType::SubjectOnlyWeekdays,
            ..Default::default()
        };
        let err = draft.build(1).unwrap_err();
        assert!(err.contains("Select a subject"));
    }

    #[test]
    fn weekday_rule_carries_one_weekday_and_no_subject_b() {
        let draft = RuleDraft {
            rule_type: RuleType::SubjectOnlyWeekdays,
            subject_a: Some(5),
            subject_b: Some(6),
            weekday: Weekday::Tue,
            ..Default::default()
        };
        let rule = draft.build(2).unwrap();
        assert_eq!(rule.params.allowed_weekdays, vec!["Tuesday".to_string()]);
        assert_eq!(rule.subject_b, None);
        assert_eq!(rule.calendar, 2);
        assert!(rule.enabled);
        assert!(!rule.global_rule);
    }

    #[test]
    fn pair_rules_keep_both_subjects_and_empty_params() {
        let draft = RuleDraft {
            rule_type: RuleType::SameDay,
            severity: Severity::Hard,
            subject_a: Some(1),
            subject_b: Some(2),
            ..Default::default()
        };
        let rule = draft.build(9).unwrap();
        assert_eq!(rule.subject_a, Some(1));
        assert_eq!(rule.subject_b, Some(2));
        assert!(rule.params.allowed_weekdays.is_empty());
    }

    #[test]
    fn heavy_rule_needs_no_subjects() {
        let draft = RuleDraft {
            rule_type: RuleType::HeavyNotSameDay,
            ..Default::default()
        };
        assert!(draft.build(1).is_ok());
    }

    #[test]
    fn delete_prompt_names_the_rule_scope() {
        let mut rule = Rule {
            id: 7,
            calendar: Some(3),
            global_rule: false,
            rule_type: RuleType::SameDay,
            severity: Severity::Hard,
            subject_a: Some(1),
            subject_b: Some(2),
            params: RuleParams::default(),
            enabled: true,
        };
        let calendar_prompt = delete_prompt(&rule);
        assert!(calendar_prompt.contains("calendar"));

        rule.global_rule = true;
        rule.calendar = None;
        let global_prompt = delete_prompt(&rule);
        assert!(global_prompt.contains("global"));
        assert_ne!(calendar_prompt, global_prompt);
    }
}
