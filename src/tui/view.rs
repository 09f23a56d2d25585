// Rendering for the TUI.
use crate::model::validate::DayClass;
use crate::model::{SemesterGroup, Subject, weekday_name};
use crate::tui::state::{AppState, Focus, InputMode, Screen};

use chrono::Datelike;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
};

fn group_color(group: SemesterGroup) -> Color {
    match group {
        SemesterGroup::Sem2 => Color::Cyan,
        SemesterGroup::Sem4 => Color::Magenta,
        SemesterGroup::Open => Color::Green,
    }
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let footer_height = if state.show_full_help {
        Constraint::Length(6)
    } else {
        Constraint::Length(3)
    };
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), footer_height])
        .split(f.area());

    match state.screen {
        Screen::Home => draw_home(f, state, v_chunks[0]),
        Screen::Planner => draw_planner(f, state, v_chunks[0]),
    }

    draw_footer(f, state, v_chunks[1]);

    match state.mode {
        InputMode::CreatingCalendar => draw_form(f, state, "New calendar"),
        InputMode::CreatingSubject => draw_form(f, state, "New subject"),
        InputMode::SavingVersion => draw_form(f, state, "Save version"),
        InputMode::CreatingRule => draw_rule_builder(f, state),
        InputMode::Confirming => draw_confirm(f, state),
        _ => {}
    }
}

fn draw_home(f: &mut Frame, state: &mut AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let cal_items: Vec<ListItem> = state
        .calendars
        .iter()
        .map(|c| {
            ListItem::new(format!(
                "{}  ({}, {} to {})",
                c.name, c.period_type, c.start_date, c.end_date
            ))
        })
        .collect();
    let on_calendars = state.focus != Focus::Subjects;
    let cal_list = List::new(cal_items)
        .block(pane_block("Exam calendars", on_calendars))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    f.render_stateful_widget(cal_list, chunks[0], &mut state.home_cal_state);

    let subject_items: Vec<ListItem> = state
        .subjects
        .iter()
        .map(|s| subject_item(s))
        .collect();
    let subject_list = List::new(subject_items)
        .block(pane_block("Subjects", !on_calendars))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    f.render_stateful_widget(subject_list, chunks[1], &mut state.home_subject_state);
}

fn subject_item(subject: &Subject) -> ListItem<'static> {
    let heavy = if subject.is_heavy { " [heavy]" } else { "" };
    ListItem::new(Line::from(vec![
        Span::styled(
            format!("{} ", subject.semester_group),
            Style::default().fg(group_color(subject.semester_group)),
        ),
        Span::raw(format!("{}{}", subject.name, heavy)),
    ]))
}

fn draw_planner(f: &mut Frame, state: &mut AppState, area: Rect) {
    let h_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)])
        .split(area);

    draw_sidebar(f, state, h_chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(h_chunks[1]);

    draw_grid(f, state, main_chunks[0]);

    let panel_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[1]);

    draw_rules(f, state, panel_chunks[0]);
    draw_versions(f, state, panel_chunks[1]);
}

fn draw_sidebar(f: &mut Frame, state: &mut AppState, area: Rect) {
    // Flattened in group order, matching the selection lane in state.
    let flat: Vec<ListItem> = state
        .sidebar_subjects()
        .into_iter()
        .map(subject_item)
        .collect();

    let filtering = state.mode == InputMode::FilteringSubjects;
    let title = if filtering || !state.subject_filter.is_empty() {
        format!("Unassigned subjects /{}", state.subject_filter)
    } else {
        "Unassigned subjects".to_string()
    };
    let focused = state.focus == Focus::Subjects;
    let list = List::new(flat)
        .block(pane_block(&title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state.subject_state);
}

fn day_cell(state: &AppState, cell: &crate::grid::DayCell) -> Cell<'static> {
    let mut lines: Vec<Line> = Vec::new();

    let label = if cell.date.day() == 1 {
        cell.date.format("%b %d").to_string()
    } else {
        cell.date.format("%d").to_string()
    };
    let mut header = vec![Span::raw(label)];
    if let Some(badge) = cell.badge {
        header.push(Span::styled(
            format!(" {}", badge),
            Style::default().fg(Color::Red),
        ));
    }
    lines.push(Line::from(header));

    if let Some(board) = &state.board {
        for event in board.events_on(cell.date) {
            lines.push(Line::from(Span::styled(
                event.subject_name.clone(),
                Style::default().fg(group_color(event.semester_group)),
            )));
        }
    }

    let mut style = match cell.class {
        DayClass::Blocked => Style::default().fg(Color::DarkGray).bg(Color::Black),
        DayClass::OutOfRange => Style::default().fg(Color::DarkGray),
        DayClass::Open => Style::default(),
    };
    if state.cursor == Some(cell.date) && state.focus == Focus::Grid {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Cell::from(Text::from(lines)).style(style)
}

fn draw_grid(f: &mut Frame, state: &mut AppState, area: Rect) {
    let Some(grid) = state.grid() else {
        return;
    };

    let header = Row::new(
        [
            chrono::Weekday::Mon,
            chrono::Weekday::Tue,
            chrono::Weekday::Wed,
            chrono::Weekday::Thu,
            chrono::Weekday::Fri,
            chrono::Weekday::Sat,
            chrono::Weekday::Sun,
        ]
        .map(|d| Cell::from(weekday_name(d))),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = grid
        .weeks
        .iter()
        .map(|week| {
            let cells: Vec<Cell> = week.days.iter().map(|d| day_cell(state, d)).collect();
            // Weeks fully outside the range collapse to one line.
            let height = if week.compact { 1 } else { 3 };
            Row::new(cells).height(height)
        })
        .collect();

    let title = state
        .board
        .as_ref()
        .map(|b| format!("{} ({})", b.calendar.name, b.calendar.period_type))
        .unwrap_or_default();
    let focused = state.focus == Focus::Grid;
    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
        .header(header)
        .block(pane_block(&title, focused));
    f.render_widget(table, area);
}

fn draw_rules(f: &mut Frame, state: &mut AppState, area: Rect) {
    let items: Vec<ListItem> = state
        .board
        .as_ref()
        .map(|board| {
            board
                .rules
                .iter()
                .map(|r| ListItem::new(crate::model::rules::describe(r, &board.subjects)))
                .collect()
        })
        .unwrap_or_default();
    let focused = state.focus == Focus::Rules;
    let list = List::new(items)
        .block(pane_block("Rules (a:add d:delete)", focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state.rule_state);
}

fn draw_versions(f: &mut Frame, state: &mut AppState, area: Rect) {
    let items: Vec<ListItem> = state
        .board
        .as_ref()
        .map(|board| {
            board
                .versions
                .iter()
                .map(|v| {
                    let label = if v.label.is_empty() {
                        format!("Draft {}", v.version_number)
                    } else {
                        v.label.clone()
                    };
                    ListItem::new(label)
                })
                .collect()
        })
        .unwrap_or_default();
    let focused = state.focus == Focus::Versions;
    let list = List::new(items)
        .block(pane_block("Versions (v:save Enter:restore)", focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state.version_state);
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let mut lines = vec![Line::from(state.message.clone())];
    if let Some(payload) = &state.dragging {
        lines.push(Line::from(Span::styled(
            format!("Placing: {}", payload.title),
            Style::default().fg(group_color(payload.semester_group)),
        )));
    }
    if state.show_full_help {
        lines.push(Line::from(
            " Tab:Focus  Enter:Open/Pick/Place  m:Move exam  x:Remove  B:Block day  /:Filter",
        ));
        lines.push(Line::from(
            " a:Add  d:Delete  H:Heavy  v:Save version  e/E:Export PDF/Excel  r:Refresh  q:Quit",
        ));
    }
    let footer = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(footer, area);
}

fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + r.width.saturating_sub(width) / 2;
    let y = r.y + r.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn draw_form(f: &mut Frame, state: &AppState, title: &str) {
    let Some(form) = &state.form else { return };
    let mut lines = Vec::new();
    for (i, (label, value)) in form.fields.iter().enumerate() {
        let style = if i == form.index {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{}: {}", label, value),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Tab:Next field  Enter:Save  Esc:Cancel"));

    let area = centered_rect(50, lines.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);
    let popup = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .alignment(Alignment::Left);
    f.render_widget(popup, area);
}

fn draw_rule_builder(f: &mut Frame, state: &AppState) {
    let draft = &state.rule_draft;
    let subject_name = |id: Option<crate::model::Id>| match (id, &state.board) {
        (Some(id), Some(board)) => board.subject_name(id),
        _ => "(none)".to_string(),
    };

    let rows = [
        ("Type", draft.rule_type.to_string()),
        ("Severity", draft.severity.to_string()),
        ("Subject A", subject_name(draft.subject_a)),
        ("Subject B", subject_name(draft.subject_b)),
        ("Weekday", weekday_name(draft.weekday).to_string()),
    ];

    let mut lines = Vec::new();
    for (i, (label, value)) in rows.iter().enumerate() {
        let style = if i == state.rule_field {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{}: {}", label, value),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(
        "Left/Right:Change  Tab:Next  Enter:Create  Esc:Cancel",
    ));

    let area = centered_rect(50, lines.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);
    let popup = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("New rule"))
        .alignment(Alignment::Left);
    f.render_widget(popup, area);
}

fn draw_confirm(f: &mut Frame, state: &AppState) {
    let Some(pending) = &state.pending_confirm else {
        return;
    };
    let lines = vec![
        Line::from(pending.prompt.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "y:Confirm  n:Cancel",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    let area = centered_rect(60, 5, f.area());
    f.render_widget(Clear, area);
    let popup = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Confirm"))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(popup, area);
}
