// Keyboard input and network event handling for the TUI.
use crate::board::PlannerBoard;
use crate::client::ExportFormat;
use crate::coordinator::AssignGesture;
use crate::model::rules;
use crate::model::{Id, NewCalendar, NewSubject, PeriodType, RuleType, SemesterGroup, Severity};
use crate::tui::action::{Action, AppEvent};
use crate::tui::state::{AppState, Focus, Form, InputMode, ListLane, PendingConfirm, Screen};

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};

pub fn handle_app_event(state: &mut AppState, event: AppEvent) {
    match event {
        AppEvent::SessionReady(user) => {
            state.message = format!("Signed in as {}.", user.username);
            state.user = Some(user);
        }
        AppEvent::HomeLoaded(calendars, subjects) => {
            if state.screen == Screen::Planner {
                state.leave_board();
            }
            state.calendars = calendars;
            state.subjects = subjects;
            state.loading = false;
        }
        AppEvent::BoardLoaded(data) => {
            let (calendar, subjects, rules, versions) = *data;
            let board = match state.board.take() {
                Some(mut board) => {
                    board.replace(calendar, subjects, rules, versions);
                    board
                }
                None => PlannerBoard::new(calendar, subjects, rules, versions),
            };
            state.enter_board(board);
        }
        AppEvent::Warning(msg) => state.message = format!("Warning: {}", msg),
        AppEvent::Status(msg) => state.message = msg,
        AppEvent::Error(msg) => {
            state.message = format!("Error: {}", msg);
            state.loading = false;
        }
        AppEvent::ExportSaved(path) => {
            state.message = format!("Exported to {}", path.display());
        }
    }
}

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match state.mode {
        InputMode::Confirming => handle_confirm_key(key, state),
        InputMode::CreatingCalendar => handle_form_key(key, state, submit_calendar_form),
        InputMode::CreatingSubject => handle_form_key(key, state, submit_subject_form),
        InputMode::SavingVersion => handle_form_key(key, state, submit_version_form),
        InputMode::CreatingRule => handle_rule_key(key, state),
        InputMode::FilteringSubjects => handle_filter_key(key, state),
        InputMode::DraggingSubject | InputMode::MovingEvent => handle_gesture_key(key, state),
        InputMode::Normal => handle_normal_key(key, state),
    }
}

fn confirm(state: &mut AppState, prompt: String, action: Action) {
    state.pending_confirm = Some(PendingConfirm { prompt, action });
    state.mode = InputMode::Confirming;
}

fn handle_confirm_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            state.mode = InputMode::Normal;
            state.pending_confirm.take().map(|p| p.action)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = InputMode::Normal;
            state.pending_confirm = None;
            None
        }
        _ => None,
    }
}

// --- FORMS ---

fn handle_form_key(
    key: KeyEvent,
    state: &mut AppState,
    submit: fn(&mut AppState) -> Option<Action>,
) -> Option<Action> {
    match key.code {
        KeyCode::Esc => {
            state.form = None;
            state.mode = InputMode::Normal;
            None
        }
        KeyCode::Tab | KeyCode::Down => {
            if let Some(form) = &mut state.form {
                form.next();
            }
            None
        }
        KeyCode::Backspace => {
            if let Some(form) = &mut state.form {
                form.current_mut().pop();
            }
            None
        }
        KeyCode::Char(c) => {
            if let Some(form) = &mut state.form {
                form.current_mut().push(c);
            }
            None
        }
        KeyCode::Enter => submit(state),
        _ => None,
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a valid date (YYYY-MM-DD).", value.trim()))
}

fn parse_period(value: &str) -> Result<PeriodType, String> {
    match value.trim().to_ascii_uppercase().as_str() {
        "P1" => Ok(PeriodType::P1),
        "P2" => Ok(PeriodType::P2),
        "F1" => Ok(PeriodType::F1),
        "F2" => Ok(PeriodType::F2),
        other => Err(format!("'{}' is not one of P1, P2, F1, F2.", other)),
    }
}

fn parse_group(value: &str) -> Result<SemesterGroup, String> {
    match value.trim().to_ascii_uppercase().as_str() {
        "SEM2" | "2" => Ok(SemesterGroup::Sem2),
        "SEM4" | "4" => Ok(SemesterGroup::Sem4),
        "OPEN" | "O" => Ok(SemesterGroup::Open),
        other => Err(format!("'{}' is not one of SEM2, SEM4, OPEN.", other)),
    }
}

fn submit_calendar_form(state: &mut AppState) -> Option<Action> {
    let form = state.form.as_ref()?;
    let name = form.value("Name").trim().to_string();
    if name.is_empty() {
        state.message = "A calendar needs a name.".to_string();
        return None;
    }
    let parsed = (|| {
        let start = parse_date(form.value("Start date"))?;
        let end = parse_date(form.value("End date"))?;
        if end < start {
            return Err("The end date is before the start date.".to_string());
        }
        let period = parse_period(form.value("Period"))?;
        Ok((start, end, period))
    })();
    match parsed {
        Ok((start_date, end_date, period_type)) => {
            state.form = None;
            state.mode = InputMode::Normal;
            Some(Action::CreateCalendar(NewCalendar {
                name,
                period_type,
                start_date,
                end_date,
            }))
        }
        Err(e) => {
            state.message = e;
            None
        }
    }
}

fn submit_subject_form(state: &mut AppState) -> Option<Action> {
    let form = state.form.as_ref()?;
    let name = form.value("Name").trim().to_string();
    if name.is_empty() {
        state.message = "A subject needs a name.".to_string();
        return None;
    }
    match parse_group(form.value("Group")) {
        Ok(semester_group) => {
            let is_heavy = form.value("Heavy (y/n)").trim().eq_ignore_ascii_case("y");
            state.form = None;
            state.mode = InputMode::Normal;
            Some(Action::CreateSubject(NewSubject {
                name,
                semester_group,
                is_heavy,
                code: None,
            }))
        }
        Err(e) => {
            state.message = e;
            None
        }
    }
}

fn submit_version_form(state: &mut AppState) -> Option<Action> {
    let form = state.form.as_ref()?;
    let mut label = form.value("Label").trim().to_string();
    if label.is_empty() {
        // Default label numbering continues from the existing snapshots.
        let n = state.board.as_ref().map(|b| b.versions.len()).unwrap_or(0);
        label = format!("Draft {}", n + 1);
    }
    state.form = None;
    state.mode = InputMode::Normal;
    Some(Action::SaveVersion(label))
}

fn handle_filter_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Esc => {
            state.subject_filter.clear();
            state.mode = InputMode::Normal;
        }
        KeyCode::Enter => state.mode = InputMode::Normal,
        KeyCode::Backspace => {
            state.subject_filter.pop();
        }
        KeyCode::Char(c) => state.subject_filter.push(c),
        _ => {}
    }
    state.subject_state.select(Some(0));
    None
}

// --- RULE BUILDER ---

fn cycle_subject(current: Option<Id>, subjects: &[Id], forward: bool) -> Option<Id> {
    // Sequence: None, then each subject in order.
    let pos = match current {
        None => 0,
        Some(id) => subjects.iter().position(|s| *s == id).map(|i| i + 1).unwrap_or(0),
    };
    let len = subjects.len() + 1;
    let next = if forward {
        (pos + 1) % len
    } else {
        (pos + len - 1) % len
    };
    if next == 0 {
        None
    } else {
        Some(subjects[next - 1])
    }
}

fn handle_rule_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    const FIELDS: usize = 5;
    let subject_ids: Vec<Id> = state
        .board
        .as_ref()
        .map(|b| b.subjects.iter().map(|s| s.id).collect())
        .unwrap_or_default();

    match key.code {
        KeyCode::Esc => {
            state.mode = InputMode::Normal;
            None
        }
        KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => {
            state.rule_field = (state.rule_field + 1) % FIELDS;
            None
        }
        KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => {
            state.rule_field = (state.rule_field + FIELDS - 1) % FIELDS;
            None
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l')
        | KeyCode::Char(' ') => {
            let forward = !matches!(key.code, KeyCode::Left | KeyCode::Char('h'));
            let draft = &mut state.rule_draft;
            match state.rule_field {
                0 => {
                    draft.rule_type = match (draft.rule_type, forward) {
                        (RuleType::SameDay, true) => RuleType::PreferSameDay,
                        (RuleType::PreferSameDay, true) => RuleType::HeavyNotSameDay,
                        (RuleType::HeavyNotSameDay, true) => RuleType::SubjectOnlyWeekdays,
                        (RuleType::SubjectOnlyWeekdays, true) => RuleType::SameDay,
                        (RuleType::SameDay, false) => RuleType::SubjectOnlyWeekdays,
                        (RuleType::PreferSameDay, false) => RuleType::SameDay,
                        (RuleType::HeavyNotSameDay, false) => RuleType::PreferSameDay,
                        (RuleType::SubjectOnlyWeekdays, false) => RuleType::HeavyNotSameDay,
                    };
                }
                1 => {
                    draft.severity = match draft.severity {
                        Severity::Hard => Severity::Soft,
                        Severity::Soft => Severity::Hard,
                    };
                }
                2 => draft.subject_a = cycle_subject(draft.subject_a, &subject_ids, forward),
                3 => draft.subject_b = cycle_subject(draft.subject_b, &subject_ids, forward),
                4 => {
                    draft.weekday = if forward {
                        draft.weekday.succ()
                    } else {
                        draft.weekday.pred()
                    };
                }
                _ => {}
            }
            None
        }
        KeyCode::Enter => {
            state.mode = InputMode::Normal;
            Some(Action::CreateRule(state.rule_draft.clone()))
        }
        _ => None,
    }
}

// --- GRID GESTURES ---

fn handle_gesture_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Esc => {
            state.dragging = None;
            state.moving_event = None;
            state.mode = InputMode::Normal;
            state.message = "Cancelled.".to_string();
            None
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.move_cursor_days(-1);
            None
        }
        KeyCode::Right | KeyCode::Char('l') => {
            state.move_cursor_days(1);
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.move_cursor_days(-7);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.move_cursor_days(7);
            None
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let date = state.cursor?;
            let gesture = if state.mode == InputMode::DraggingSubject {
                let payload = state.dragging.take()?;
                AssignGesture {
                    subject: payload.subject_id,
                    date,
                    event_id: None,
                }
            } else {
                let event_id = state.moving_event.take()?;
                let board = state.board.as_ref()?;
                let event = board.event(event_id)?;
                AssignGesture {
                    subject: event.subject,
                    date,
                    event_id: Some(event_id),
                }
            };
            state.mode = InputMode::Normal;
            state.focus = Focus::Grid;
            Some(Action::Assign(gesture))
        }
        _ => None,
    }
}

// --- NORMAL MODE ---

fn handle_normal_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    // Global bindings
    match key.code {
        KeyCode::Char('q') => return Some(Action::Quit),
        KeyCode::Char('?') => {
            state.show_full_help = !state.show_full_help;
            return None;
        }
        KeyCode::Char('r') => return Some(Action::Refresh),
        _ => {}
    }

    match state.screen {
        Screen::Home => handle_home_key(key, state),
        Screen::Planner => handle_planner_key(key, state),
    }
}

fn handle_home_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    let on_calendars = state.focus != Focus::Subjects;
    match key.code {
        KeyCode::Tab => {
            state.focus = if on_calendars { Focus::Subjects } else { Focus::Grid };
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let lane = if on_calendars { ListLane::HomeCalendars } else { ListLane::HomeSubjects };
            state.next_in(lane);
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let lane = if on_calendars { ListLane::HomeCalendars } else { ListLane::HomeSubjects };
            state.previous_in(lane);
            None
        }
        KeyCode::Enter if on_calendars => {
            let idx = state.home_cal_state.selected()?;
            let id = state.calendars.get(idx)?.id;
            state.loading = true;
            Some(Action::OpenCalendar(id))
        }
        KeyCode::Char('a') => {
            state.form = Some(if on_calendars {
                Form::new(&["Name", "Start date", "End date", "Period"])
            } else {
                Form::new(&["Name", "Group", "Heavy (y/n)"])
            });
            state.mode = if on_calendars {
                InputMode::CreatingCalendar
            } else {
                InputMode::CreatingSubject
            };
            None
        }
        KeyCode::Char('d') => {
            if on_calendars {
                let idx = state.home_cal_state.selected()?;
                let cal = state.calendars.get(idx)?;
                let (id, name) = (cal.id, cal.name.clone());
                confirm(
                    state,
                    format!("Delete calendar '{}' and all of its exams?", name),
                    Action::DeleteCalendar(id),
                );
            } else {
                let idx = state.home_subject_state.selected()?;
                let subject = state.subjects.get(idx)?;
                let (id, name) = (subject.id, subject.name.clone());
                confirm(
                    state,
                    format!("Delete subject '{}'?", name),
                    Action::DeleteSubject(id),
                );
            }
            None
        }
        KeyCode::Char('H') if !on_calendars => {
            let idx = state.home_subject_state.selected()?;
            let subject = state.subjects.get(idx)?;
            Some(Action::ToggleHeavy(subject.id, !subject.is_heavy))
        }
        _ => None,
    }
}

fn handle_planner_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('b') => {
            return Some(Action::BackHome);
        }
        KeyCode::Tab => {
            state.focus = match state.focus {
                Focus::Subjects => Focus::Grid,
                Focus::Grid => Focus::Rules,
                Focus::Rules => Focus::Versions,
                Focus::Versions => Focus::Subjects,
            };
            return None;
        }
        KeyCode::Char('v') => {
            state.form = Some(Form::new(&["Label"]));
            state.mode = InputMode::SavingVersion;
            return None;
        }
        KeyCode::Char('e') => return Some(export_action(state, ExportFormat::Pdf)),
        KeyCode::Char('E') => return Some(export_action(state, ExportFormat::Excel)),
        _ => {}
    }

    match state.focus {
        Focus::Subjects => handle_subject_pane_key(key, state),
        Focus::Grid => handle_grid_key(key, state),
        Focus::Rules => handle_rules_pane_key(key, state),
        Focus::Versions => handle_versions_pane_key(key, state),
    }
}

/// Exports the live layout, or the selected snapshot when the versions
/// pane has focus.
fn export_action(state: &AppState, format: ExportFormat) -> Action {
    let version = if state.focus == Focus::Versions {
        state
            .version_state
            .selected()
            .and_then(|i| state.board.as_ref()?.versions.get(i))
            .map(|v| v.id)
    } else {
        None
    };
    Action::Export(format, version)
}

fn handle_subject_pane_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            state.next_in(ListLane::Subjects);
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.previous_in(ListLane::Subjects);
            None
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            // Pick up the chip; only registered (unassigned) subjects lift.
            let subject_id = state.selected_sidebar_subject()?.id;
            let board = state.board.as_ref()?;
            let payload = board.drag.payload(subject_id)?.clone();
            state.dragging = Some(payload);
            state.mode = InputMode::DraggingSubject;
            state.focus = Focus::Grid;
            state.message = "Pick a day, Enter to place, Esc to cancel.".to_string();
            None
        }
        KeyCode::Char('/') => {
            state.subject_filter.clear();
            state.mode = InputMode::FilteringSubjects;
            None
        }
        KeyCode::Char('H') => {
            let subject = state.selected_sidebar_subject()?;
            Some(Action::ToggleHeavy(subject.id, !subject.is_heavy))
        }
        KeyCode::Char('d') => {
            let subject = state.selected_sidebar_subject()?;
            let (id, name) = (subject.id, subject.name.clone());
            confirm(
                state,
                format!("Delete subject '{}'?", name),
                Action::DeleteSubject(id),
            );
            None
        }
        _ => None,
    }
}

fn handle_grid_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => {
            state.move_cursor_days(-1);
            None
        }
        KeyCode::Right | KeyCode::Char('l') => {
            state.move_cursor_days(1);
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.move_cursor_days(-7);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.move_cursor_days(7);
            None
        }
        KeyCode::Char('m') | KeyCode::Enter => {
            let date = state.cursor?;
            let board = state.board.as_ref()?;
            let event = board.events_on(date).next()?;
            state.moving_event = Some(event.id);
            state.mode = InputMode::MovingEvent;
            state.message = "Pick a new day, Enter to move, Esc to cancel.".to_string();
            None
        }
        KeyCode::Char('x') | KeyCode::Char('d') => {
            let date = state.cursor?;
            let board = state.board.as_ref()?;
            let event = board.events_on(date).next()?;
            let (id, name) = (event.id, event.subject_name.clone());
            confirm(
                state,
                format!("Remove the '{}' exam from the calendar?", name),
                Action::RemoveEvent(id),
            );
            None
        }
        KeyCode::Char('B') => {
            let date = state.cursor?;
            let blocked = state.board.as_ref()?.policy().is_blocked(date);
            let prompt = if blocked {
                format!("Unblock {}?", date)
            } else {
                format!("Block {} as a holiday?", date)
            };
            confirm(state, prompt, Action::ToggleBlockedDay(date));
            None
        }
        _ => None,
    }
}

fn handle_rules_pane_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            state.next_in(ListLane::Rules);
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.previous_in(ListLane::Rules);
            None
        }
        KeyCode::Char('a') => {
            state.rule_draft = Default::default();
            state.rule_field = 0;
            state.mode = InputMode::CreatingRule;
            None
        }
        KeyCode::Char('d') => {
            let idx = state.rule_state.selected()?;
            let rule = state.board.as_ref()?.rules.get(idx)?;
            let (id, prompt) = (rule.id, rules::delete_prompt(rule));
            confirm(state, prompt, Action::DeleteRule(id));
            None
        }
        _ => None,
    }
}

fn handle_versions_pane_key(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => {
            state.next_in(ListLane::Versions);
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.previous_in(ListLane::Versions);
            None
        }
        KeyCode::Enter => {
            let idx = state.version_state.selected()?;
            let version = state.board.as_ref()?.versions.get(idx)?;
            let id = version.id;
            confirm(
                state,
                "Overwrite the current layout with this version?".to_string(),
                Action::RestoreVersion(id),
            );
            None
        }
        KeyCode::Char('d') => {
            let idx = state.version_state.selected()?;
            let version = state.board.as_ref()?.versions.get(idx)?;
            let id = version.id;
            confirm(
                state,
                "Delete this saved version?".to_string(),
                Action::DeleteVersion(id),
            );
            None
        }
        _ => None,
    }
}
