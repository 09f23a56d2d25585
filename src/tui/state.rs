// Application state for the TUI.
use crate::board::PlannerBoard;
use crate::context::AppContext;
use crate::drag::DragPayload;
use crate::grid::MonthGrid;
use crate::model::rules::RuleDraft;
use crate::model::{ExamCalendar, Id, SemesterGroup, Subject, User};
use crate::tui::action::Action;

use chrono::{Days, NaiveDate};
use ratatui::widgets::ListState;
use std::sync::Arc;
use strum::IntoEnumIterator;

#[derive(PartialEq, Clone, Copy)]
pub enum Screen {
    Home,
    Planner,
}

#[derive(PartialEq, Clone, Copy)]
pub enum Focus {
    Subjects,
    Grid,
    Rules,
    Versions,
}

#[derive(PartialEq, Clone, Copy)]
pub enum InputMode {
    Normal,
    CreatingCalendar,
    CreatingSubject,
    SavingVersion,
    CreatingRule,
    /// Typing a substring filter for the sidebar chips.
    FilteringSubjects,
    /// A subject chip has been picked up; arrow keys steer the grid cursor.
    DraggingSubject,
    /// An existing event is being moved to another day.
    MovingEvent,
    Confirming,
}

/// A destructive action parked behind a yes/no prompt.
pub struct PendingConfirm {
    pub prompt: String,
    pub action: Action,
}

/// Line-oriented form: one value per field, Tab cycles, Enter submits.
pub struct Form {
    pub fields: Vec<(&'static str, String)>,
    pub index: usize,
}

impl Form {
    pub fn new(labels: &[&'static str]) -> Self {
        Self {
            fields: labels.iter().map(|l| (*l, String::new())).collect(),
            index: 0,
        }
    }

    pub fn current_mut(&mut self) -> &mut String {
        &mut self.fields[self.index].1
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % self.fields.len();
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }
}

pub struct AppState {
    pub ctx: Arc<dyn AppContext>,
    pub user: Option<User>,

    pub screen: Screen,
    pub focus: Focus,
    pub mode: InputMode,
    pub message: String,
    pub loading: bool,

    // Home screen data
    pub calendars: Vec<ExamCalendar>,
    pub subjects: Vec<Subject>,
    pub home_cal_state: ListState,
    pub home_subject_state: ListState,

    // Planner screen data
    pub board: Option<PlannerBoard>,
    pub cursor: Option<NaiveDate>,
    pub subject_state: ListState,
    pub rule_state: ListState,
    pub version_state: ListState,

    // Gesture payloads
    pub dragging: Option<DragPayload>,
    pub moving_event: Option<Id>,

    // Input buffers
    pub subject_filter: String,
    pub form: Option<Form>,
    pub rule_draft: RuleDraft,
    pub rule_field: usize,
    pub pending_confirm: Option<PendingConfirm>,

    pub show_full_help: bool,
}

impl AppState {
    pub fn new_with_ctx(ctx: Arc<dyn AppContext>) -> Self {
        let mut cal_state = ListState::default();
        cal_state.select(Some(0));
        let mut subj_state = ListState::default();
        subj_state.select(Some(0));

        Self {
            ctx,
            user: None,
            screen: Screen::Home,
            focus: Focus::Grid,
            mode: InputMode::Normal,
            message: "Loading...".to_string(),
            loading: true,
            calendars: vec![],
            subjects: vec![],
            home_cal_state: cal_state,
            home_subject_state: ListState::default(),
            board: None,
            cursor: None,
            subject_state: subj_state,
            rule_state: ListState::default(),
            version_state: ListState::default(),
            dragging: None,
            moving_event: None,
            subject_filter: String::new(),
            form: None,
            rule_draft: RuleDraft::default(),
            rule_field: 0,
            pending_confirm: None,
            show_full_help: false,
        }
    }

    /// Installs a freshly loaded board and resets cursors that point at
    /// stale data.
    pub fn enter_board(&mut self, board: PlannerBoard) {
        let start = board.calendar.start_date;
        if self
            .cursor
            .is_none_or(|c| c < start || c > board.calendar.end_date)
        {
            self.cursor = Some(start);
        }
        self.board = Some(board);
        self.screen = Screen::Planner;
        self.clamp_selections();
    }

    pub fn leave_board(&mut self) {
        self.board = None;
        self.cursor = None;
        self.dragging = None;
        self.moving_event = None;
        self.subject_filter.clear();
        self.screen = Screen::Home;
        self.focus = Focus::Grid;
        self.mode = InputMode::Normal;
    }

    fn clamp_selections(&mut self) {
        let Some(board) = &self.board else { return };
        let chips = self.sidebar_subjects_len();
        clamp(&mut self.subject_state, chips);
        clamp(&mut self.rule_state, board.rules.len());
        clamp(&mut self.version_state, board.versions.len());
    }

    /// Sidebar chips: every semester group's unassigned subjects, flattened
    /// in group order and narrowed by the active text filter.
    pub fn sidebar_subjects(&self) -> Vec<&Subject> {
        let Some(board) = &self.board else {
            return vec![];
        };
        let filter = self.subject_filter.to_lowercase();
        SemesterGroup::iter()
            .flat_map(|g| board.unassigned_in_group(g))
            .filter(|s| filter.is_empty() || s.name.to_lowercase().contains(&filter))
            .collect()
    }

    fn sidebar_subjects_len(&self) -> usize {
        self.sidebar_subjects().len()
    }

    pub fn selected_sidebar_subject(&self) -> Option<&Subject> {
        let idx = self.subject_state.selected()?;
        self.sidebar_subjects().get(idx).copied()
    }

    pub fn grid(&self) -> Option<MonthGrid> {
        self.board.as_ref().map(|b| b.grid())
    }

    pub fn move_cursor_days(&mut self, days: i64) {
        if let Some(cursor) = self.cursor {
            let moved = if days >= 0 {
                cursor.checked_add_days(Days::new(days as u64))
            } else {
                cursor.checked_sub_days(Days::new((-days) as u64))
            };
            if let Some(date) = moved {
                self.cursor = Some(self.clamp_to_grid(date));
            }
        }
    }

    /// The cursor may roam the whole rendered grid, not just the range.
    fn clamp_to_grid(&self, date: NaiveDate) -> NaiveDate {
        match self.grid() {
            Some(grid) => {
                let first = grid.weeks.first().and_then(|w| w.days.first());
                let last = grid.weeks.last().and_then(|w| w.days.last());
                match (first, last) {
                    (Some(f), Some(l)) => date.clamp(f.date, l.date),
                    _ => date,
                }
            }
            None => date,
        }
    }

    pub fn next_in(&mut self, list: ListLane) {
        self.step(list, 1);
    }

    pub fn previous_in(&mut self, list: ListLane) {
        self.step(list, -1);
    }

    fn step(&mut self, lane: ListLane, delta: i64) {
        let (state, len) = match lane {
            ListLane::HomeCalendars => (&mut self.home_cal_state, self.calendars.len()),
            ListLane::HomeSubjects => (&mut self.home_subject_state, self.subjects.len()),
            ListLane::Subjects => {
                let len = self.sidebar_subjects_len();
                (&mut self.subject_state, len)
            }
            ListLane::Rules => (
                &mut self.rule_state,
                self.board.as_ref().map(|b| b.rules.len()).unwrap_or(0),
            ),
            ListLane::Versions => (
                &mut self.version_state,
                self.board.as_ref().map(|b| b.versions.len()).unwrap_or(0),
            ),
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as i64;
        let next = (current + delta).rem_euclid(len as i64) as usize;
        state.select(Some(next));
    }
}

fn clamp(state: &mut ListState, len: usize) {
    match len {
        0 => state.select(None),
        _ => {
            let idx = state.selected().unwrap_or(0).min(len - 1);
            state.select(Some(idx));
        }
    }
}

#[derive(Clone, Copy)]
pub enum ListLane {
    HomeCalendars,
    HomeSubjects,
    Subjects,
    Rules,
    Versions,
}
