use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};
use std::io::stdout;

use crate::config::ViewerZone;
use crate::db::Database;
use crate::display::{
    PLACEHOLDER, Tone, location_line, or_placeholder, priority_badge, priority_tone,
};
use crate::filter::{FilterCriteria, WORK_MODES};
use crate::forms::{NewApplicationForm, QuickEditForm};
use crate::models::{
    ApplicationRecord, ApplicationStatus, MAX_PRIORITY, MIN_PRIORITY, clamp_priority,
};
use crate::state::ApplicationList;

const CREATE_FIELDS: [&str; 10] = [
    "Company",
    "Role",
    "Status",
    "Priority (1 - 5)",
    "Applied date",
    "Next action date/time",
    "Next action (what)",
    "Location",
    "Work mode",
    "Notes",
];

const STATUS_FIELD: usize = 2;
const PRIORITY_FIELD: usize = 3;
const WORK_MODE_FIELD: usize = 8;

enum Mode {
    Browse,
    Search,
    QuickEdit(QuickEditForm),
    Create(CreatePanel),
}

struct CreatePanel {
    form: NewApplicationForm,
    focus: usize,
}

impl CreatePanel {
    fn new() -> Self {
        Self {
            form: NewApplicationForm::default(),
            focus: 0,
        }
    }

    fn text_field(&mut self) -> Option<&mut String> {
        let form = &mut self.form;
        match self.focus {
            0 => Some(&mut form.company_name),
            1 => Some(&mut form.role_title),
            4 => Some(&mut form.applied_at),
            5 => Some(&mut form.next_action_at),
            6 => Some(&mut form.next_action_label),
            7 => Some(&mut form.location),
            9 => Some(&mut form.notes),
            _ => None,
        }
    }

    fn value(&self, field: usize) -> String {
        let form = &self.form;
        match field {
            0 => form.company_name.clone(),
            1 => form.role_title.clone(),
            STATUS_FIELD => form.status.label().to_string(),
            PRIORITY_FIELD => priority_badge(form.priority),
            4 => form.applied_at.clone(),
            5 => form.next_action_at.clone(),
            6 => form.next_action_label.clone(),
            7 => form.location.clone(),
            WORK_MODE_FIELD => or_placeholder(Some(form.work_mode.as_str())).to_string(),
            _ => form.notes.clone(),
        }
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % CREATE_FIELDS.len();
    }

    fn focus_prev(&mut self) {
        self.focus = (self.focus + CREATE_FIELDS.len() - 1) % CREATE_FIELDS.len();
    }

    /// Left/Right on a choice field.
    fn cycle(&mut self, forward: bool) {
        let form = &mut self.form;
        match self.focus {
            STATUS_FIELD => {
                form.status = if forward {
                    form.status.next()
                } else {
                    ApplicationStatus::ALL
                        .iter()
                        .copied()
                        .find(|s| s.next() == form.status)
                        .unwrap_or_default()
                };
            }
            PRIORITY_FIELD => {
                let step = if forward { 1 } else { -1 };
                form.priority = clamp_priority(form.priority + step);
            }
            WORK_MODE_FIELD => {
                let current = (!form.work_mode.is_empty()).then_some(form.work_mode.as_str());
                form.work_mode = cycle_work_mode(current).unwrap_or_default();
            }
            _ => {}
        }
    }

    fn type_char(&mut self, c: char) {
        if let Some(field) = self.text_field() {
            field.push(c);
        } else if self.focus == PRIORITY_FIELD {
            if let Some(digit) = c.to_digit(10) {
                self.form.priority = clamp_priority(digit as i64);
            }
        }
    }

    fn backspace(&mut self) {
        if let Some(field) = self.text_field() {
            field.pop();
        }
    }
}

struct AppState {
    list: ApplicationList,
    mode: Mode,
    drawer_open: bool,
    scroll_offset: u16,
    message: Option<String>,
    zone: ViewerZone,
}

impl AppState {
    fn new(rows: Vec<ApplicationRecord>, filters: FilterCriteria, zone: ViewerZone) -> Self {
        let mut list = ApplicationList::new(rows);
        list.set_filters(filters);
        list.move_selection(0);
        Self {
            list,
            mode: Mode::Browse,
            drawer_open: false,
            scroll_offset: 0,
            message: None,
            zone,
        }
    }

    fn update_filters(&mut self, f: impl FnOnce(&mut FilterCriteria)) {
        let mut filters = self.list.filters().clone();
        f(&mut filters);
        self.list.set_filters(filters);
        self.drawer_open = false;
        self.scroll_offset = 0;
    }

    fn next(&mut self) {
        self.list.move_selection(1);
        self.scroll_offset = 0;
    }

    fn prev(&mut self) {
        self.list.move_selection(-1);
        self.scroll_offset = 0;
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn save_quick_edit(&mut self, db: &Database, form: &QuickEditForm) -> bool {
        if !form.can_save() {
            return false;
        }
        let patch = form.diff();
        match db.update_application(form.id(), &patch) {
            Ok(()) => {
                self.list.apply_update(form.id(), &patch);
                self.message = Some("Saved.".to_string());
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "quick edit failed");
                self.message = Some(format!("Save failed: {}", e));
                false
            }
        }
    }

    fn save_create(&mut self, db: &Database, panel: &CreatePanel) -> bool {
        let Some(new) = panel.form.build() else {
            return false;
        };
        match db.create_application(&new) {
            Ok(id) => {
                let record = new.into_record(id.clone());
                self.message = Some(format!(
                    "Added {} at {}.",
                    record.role_title, record.company_name
                ));
                self.list.insert_created(record);
                self.list.select(&id);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "create failed");
                self.message = Some(format!("Save failed: {}", e));
                false
            }
        }
    }

    fn touch_selected(&mut self, db: &Database) {
        let Some(record) = self.list.selected() else { return };
        let mut form = QuickEditForm::open(record);
        form.touch(Utc::now());
        self.save_quick_edit(db, &form);
    }
}

pub fn cycle_status(current: Option<ApplicationStatus>) -> Option<ApplicationStatus> {
    match current {
        None => Some(ApplicationStatus::ALL[0]),
        Some(status) if status == ApplicationStatus::ALL[ApplicationStatus::ALL.len() - 1] => None,
        Some(status) => Some(status.next()),
    }
}

pub fn cycle_priority(current: Option<i64>) -> Option<i64> {
    match current {
        None => Some(MIN_PRIORITY),
        Some(p) if p >= MAX_PRIORITY => None,
        Some(p) => Some(p + 1),
    }
}

pub fn cycle_work_mode(current: Option<&str>) -> Option<String> {
    let idx = current.and_then(|mode| WORK_MODES.iter().position(|m| m.eq_ignore_ascii_case(mode)));
    match idx {
        None if current.is_none() => Some(WORK_MODES[0].to_string()),
        Some(i) if i + 1 < WORK_MODES.len() => Some(WORK_MODES[i + 1].to_string()),
        _ => None,
    }
}

pub fn run_browse(db: &Database, filters: FilterCriteria, zone: ViewerZone) -> Result<()> {
    let rows = db.list_applications()?;
    let mut state = AppState::new(rows, filters, zone);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    db: &Database,
) -> Result<()> {
    let mut table_state = TableState::default();

    loop {
        table_state.select(state.list.selected_index());
        terminal.draw(|frame| draw(frame, state, &mut table_state))?;

        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if !handle_key(state, db, key.code) {
            break;
        }
    }
    Ok(())
}

/// Apply one key press. Returns false when the browser should exit.
fn handle_key(state: &mut AppState, db: &Database, code: KeyCode) -> bool {
    let mode = std::mem::replace(&mut state.mode, Mode::Browse);
    state.mode = match mode {
        Mode::Browse => {
            state.message = None;
            match code {
                KeyCode::Char('q') => return false,
                KeyCode::Esc => {
                    state.drawer_open = false;
                    state.list.clear_selection();
                    Mode::Browse
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    state.next();
                    Mode::Browse
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    state.prev();
                    Mode::Browse
                }
                KeyCode::Char('J') | KeyCode::PageDown => {
                    state.scroll_down();
                    Mode::Browse
                }
                KeyCode::Char('K') | KeyCode::PageUp => {
                    state.scroll_up();
                    Mode::Browse
                }
                KeyCode::Enter => {
                    state.drawer_open = state.list.selected().is_some() && !state.drawer_open;
                    Mode::Browse
                }
                KeyCode::Char('/') => Mode::Search,
                KeyCode::Char('s') => {
                    state.update_filters(|f| f.status = cycle_status(f.status));
                    Mode::Browse
                }
                KeyCode::Char('p') => {
                    state.update_filters(|f| f.priority = cycle_priority(f.priority));
                    Mode::Browse
                }
                KeyCode::Char('m') => {
                    state.update_filters(|f| f.work_mode = cycle_work_mode(f.work_mode.as_deref()));
                    Mode::Browse
                }
                KeyCode::Char('R') => {
                    state.list.reset_filters();
                    state.drawer_open = false;
                    Mode::Browse
                }
                KeyCode::Char('c') => {
                    state.list.clear_search();
                    Mode::Browse
                }
                KeyCode::Char('n') => Mode::Create(CreatePanel::new()),
                KeyCode::Char('e') => match state.list.selected() {
                    Some(record) => Mode::QuickEdit(QuickEditForm::open(record)),
                    None => Mode::Browse,
                },
                KeyCode::Char('t') => {
                    state.touch_selected(db);
                    Mode::Browse
                }
                _ => Mode::Browse,
            }
        }

        Mode::Search => match code {
            KeyCode::Enter => Mode::Browse,
            KeyCode::Esc => {
                state.list.clear_search();
                Mode::Browse
            }
            KeyCode::Backspace => {
                state.update_filters(|f| {
                    f.search.pop();
                });
                Mode::Search
            }
            KeyCode::Char(c) => {
                state.update_filters(|f| f.search.push(c));
                Mode::Search
            }
            _ => Mode::Search,
        },

        Mode::QuickEdit(mut form) => match code {
            KeyCode::Esc => Mode::Browse,
            KeyCode::Enter => {
                if state.save_quick_edit(db, &form) {
                    Mode::Browse
                } else {
                    Mode::QuickEdit(form)
                }
            }
            KeyCode::Char('s') => {
                form.draft.status = form.draft.status.next();
                Mode::QuickEdit(form)
            }
            KeyCode::Char(c @ '1'..='5') => {
                form.draft.priority = i64::from(c as u8 - b'0');
                Mode::QuickEdit(form)
            }
            KeyCode::Char('t') => {
                form.touch(Utc::now());
                Mode::QuickEdit(form)
            }
            _ => Mode::QuickEdit(form),
        },

        Mode::Create(mut panel) => match code {
            KeyCode::Esc => Mode::Browse,
            KeyCode::Enter => {
                if state.save_create(db, &panel) {
                    Mode::Browse
                } else {
                    Mode::Create(panel)
                }
            }
            KeyCode::Tab | KeyCode::Down => {
                panel.focus_next();
                Mode::Create(panel)
            }
            KeyCode::BackTab | KeyCode::Up => {
                panel.focus_prev();
                Mode::Create(panel)
            }
            KeyCode::Left => {
                panel.cycle(false);
                Mode::Create(panel)
            }
            KeyCode::Right => {
                panel.cycle(true);
                Mode::Create(panel)
            }
            KeyCode::Backspace => {
                panel.backspace();
                Mode::Create(panel)
            }
            KeyCode::Char(c) => {
                panel.type_char(c);
                Mode::Create(panel)
            }
            _ => Mode::Create(panel),
        },
    };
    true
}

fn tone_style(tone: Tone) -> Style {
    let color = match tone {
        Tone::Neutral => Color::Gray,
        Tone::Info => Color::Cyan,
        Tone::Accent => Color::Magenta,
        Tone::Success => Color::Green,
        Tone::Warning => Color::Yellow,
        Tone::Danger => Color::Red,
    };
    Style::default().fg(color)
}

fn draw(frame: &mut Frame, state: &AppState, table_state: &mut TableState) {
    let now = Utc::now();
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    frame.render_widget(filter_bar(state), outer[0]);

    let side_panel =
        state.drawer_open || matches!(state.mode, Mode::QuickEdit(_) | Mode::Create(_));
    let main = if side_panel {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(outer[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(outer[1])
    };

    draw_table(frame, state, table_state, main[0], now);

    if side_panel {
        let (title, text) = match &state.mode {
            Mode::QuickEdit(form) => (" Quick edit ", build_quick_edit(form)),
            Mode::Create(panel) => (" New application ", build_create(panel)),
            _ => (" Detail ", build_detail(state, now)),
        };
        let panel = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .scroll((state.scroll_offset, 0));
        frame.render_widget(panel, main[1]);
    }

    let help = match state.mode {
        Mode::Browse => match &state.message {
            Some(message) => message.clone(),
            None => browse_help(state.list.filters()).to_string(),
        },
        Mode::Search => " type to search  enter:done  esc:clear".to_string(),
        Mode::QuickEdit(_) => {
            " s:status  1-5:priority  t:touch  enter:save  esc:cancel".to_string()
        }
        Mode::Create(_) => {
            " tab/arrows:field  left/right:choose  enter:save  esc:cancel".to_string()
        }
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        outer[2],
    );
}

fn browse_help(filters: &FilterCriteria) -> &'static str {
    if filters.is_default() {
        " j/k:move  enter:detail  /:search  s/p/m:filter  n:new  e:edit  t:touch  q:quit"
    } else {
        " j/k:move  enter:detail  /:search  s/p/m:filter  R:reset  n:new  e:edit  t:touch  q:quit"
    }
}

fn filter_bar(state: &AppState) -> Paragraph<'static> {
    let filters = state.list.filters();
    let search_style = if matches!(state.mode, Mode::Search) {
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default()
    };
    let search = if filters.search.is_empty() && !matches!(state.mode, Mode::Search) {
        "Company or role...".to_string()
    } else {
        filters.search.clone()
    };
    let line = Line::from(vec![
        Span::raw(" Search: "),
        Span::styled(search, search_style),
        Span::raw("  Status: "),
        Span::raw(filters.status.map_or("All", ApplicationStatus::label).to_string()),
        Span::raw("  Priority: "),
        Span::raw(filters.priority.map_or("All".to_string(), |p| p.to_string())),
        Span::raw("  Work mode: "),
        Span::raw(filters.work_mode.clone().unwrap_or_else(|| "All".to_string())),
    ]);
    Paragraph::new(line)
}

fn draw_table(
    frame: &mut Frame,
    state: &AppState,
    table_state: &mut TableState,
    area: Rect,
    now: DateTime<Utc>,
) {
    let visible = state.list.visible();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Applications ({}/{}) ", visible.len(), state.list.all().len()));

    if state.list.is_empty() {
        let empty = Paragraph::new("No applications yet.\nPress n to add your first application.")
            .block(block);
        frame.render_widget(empty, area);
        return;
    }
    if visible.is_empty() {
        let empty = Paragraph::new(concat!(
            "No applications match your filters.\n",
            "Press R to reset filters or c to clear the search.",
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(
        [
            "Company",
            "Role",
            "Status",
            "Priority",
            "Next Action",
            "Last Touch",
            "Applied",
            "Location",
        ]
        .map(|h| Cell::from(h.to_uppercase())),
    )
    .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = visible
        .iter()
        .map(|record| {
            let next = state.zone.next_action(record.next_action_at.as_deref(), now);
            Row::new(vec![
                Cell::from(record.company_name.clone())
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(record.role_title.clone()),
                Cell::from(record.status.label()).style(tone_style(record.status.tone())),
                Cell::from(priority_badge(record.priority))
                    .style(tone_style(priority_tone(record.priority))),
                Cell::from(next.label).style(tone_style(next.tone)),
                Cell::from(state.zone.short_date(record.last_touch_at.as_deref())),
                Cell::from(state.zone.short_date(record.applied_at.as_deref())),
                Cell::from(location_line(record.location.as_deref(), record.work_mode.as_deref())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(15),
        Constraint::Percentage(20),
        Constraint::Percentage(10),
        Constraint::Percentage(12),
        Constraint::Percentage(14),
        Constraint::Percentage(8),
        Constraint::Percentage(8),
        Constraint::Percentage(13),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, table_state);
}

fn build_detail(state: &AppState, now: DateTime<Utc>) -> Text<'static> {
    let Some(record) = state.list.selected() else {
        return Text::raw("No application selected");
    };
    let zone = state.zone;
    let next = zone.next_action(record.next_action_at.as_deref(), now);

    let mut lines: Vec<Line> = Vec::new();

    // Header
    lines.push(Line::from(record.company_name.clone()));
    lines.push(Line::from(Span::styled(
        record.role_title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(format!("[{}]", record.status.label()), tone_style(record.status.tone())),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", priority_badge(record.priority)),
            tone_style(priority_tone(record.priority)),
        ),
    ]));
    lines.push(Line::from(""));

    lines.push(Line::from(vec![
        Span::raw("Next action: "),
        Span::styled(format!("[{}]", next.label), tone_style(next.tone)),
    ]));
    match record.next_action_label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => {
            lines.push(Line::from(Span::styled(
                format!("  {}", label),
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
        _ => lines.push(Line::from(Span::styled(
            "  No next action set",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))),
    }
    lines.push(Line::from(format!(
        "Last touch: {}",
        zone.short_date(record.last_touch_at.as_deref())
    )));
    lines.push(Line::from(format!("Applied: {}", zone.date(record.applied_at.as_deref()))));
    lines.push(Line::from(format!(
        "Location / Mode: {}",
        location_line(record.location.as_deref(), record.work_mode.as_deref())
    )));
    lines.push(Line::from(""));

    // Notes
    lines.push(Line::from(Span::styled("Notes", Style::default().add_modifier(Modifier::BOLD))));
    let notes = or_placeholder(record.notes.as_deref());
    if notes == PLACEHOLDER {
        lines.push(Line::from(Span::styled(
            "No notes yet. Add key details after screens/interviews.",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for line in notes.lines() {
            for wrapped in textwrap::fill(line, 60).lines() {
                lines.push(Line::from(wrapped.to_string()));
            }
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("id {}  -  e:quick edit  t:touch  esc:close", record.id),
        Style::default().fg(Color::DarkGray),
    )));

    Text::from(lines)
}

fn build_quick_edit(form: &QuickEditForm) -> Text<'static> {
    let draft = &form.draft;
    let mut lines: Vec<Line> = vec![
        Line::from(draft.company_name.clone()),
        Line::from(Span::styled(
            draft.role_title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Status:     "),
            Span::styled(draft.status.label(), tone_style(draft.status.tone())),
        ]),
        Line::from(vec![
            Span::raw("Priority:   "),
            Span::styled(priority_badge(draft.priority), tone_style(priority_tone(draft.priority))),
        ]),
        Line::from(format!(
            "Last touch: {}",
            draft.last_touch_at.as_deref().unwrap_or(PLACEHOLDER)
        )),
        Line::from(""),
    ];

    let patch = form.diff();
    if patch.is_empty() {
        lines.push(Line::from(Span::styled("No changes", Style::default().fg(Color::DarkGray))));
    } else {
        lines.push(Line::from(Span::styled(
            "Unsaved changes - enter to save",
            tone_style(Tone::Warning),
        )));
    }
    Text::from(lines)
}

fn build_create(panel: &CreatePanel) -> Text<'static> {
    let mut lines: Vec<Line> = Vec::new();
    for (idx, name) in CREATE_FIELDS.iter().enumerate() {
        let focused = idx == panel.focus;
        let marker = if focused { "> " } else { "  " };
        let label_style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(format!("{}{}", marker, name), label_style)));

        let value = panel.value(idx);
        let shown = if value.is_empty() { PLACEHOLDER.to_string() } else { value };
        lines.push(Line::from(format!("    {}", shown)));
    }
    lines.push(Line::from(""));
    if panel.form.can_save() {
        lines.push(Line::from(Span::styled("Ready - enter to save", tone_style(Tone::Success))));
    } else {
        lines.push(Line::from(Span::styled(
            "Company and role are required",
            Style::default().fg(Color::DarkGray),
        )));
    }
    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_filter_cycles_through_all_then_wildcard() {
        let mut current = None;
        let mut seen = Vec::new();
        for _ in 0..ApplicationStatus::ALL.len() {
            current = cycle_status(current);
            seen.push(current.unwrap());
        }
        assert_eq!(seen, ApplicationStatus::ALL.to_vec());
        assert_eq!(cycle_status(current), None);
    }

    #[test]
    fn priority_filter_cycles() {
        assert_eq!(cycle_priority(None), Some(1));
        assert_eq!(cycle_priority(Some(4)), Some(5));
        assert_eq!(cycle_priority(Some(5)), None);
    }

    #[test]
    fn work_mode_filter_cycles() {
        assert_eq!(cycle_work_mode(None).as_deref(), Some("remote"));
        assert_eq!(cycle_work_mode(Some("Remote")).as_deref(), Some("hybrid"));
        assert_eq!(cycle_work_mode(Some("onsite")), None);
        assert_eq!(cycle_work_mode(Some("contract")), None);
    }

    #[test]
    fn create_panel_typing_and_choices() {
        let mut panel = CreatePanel::new();
        for c in "Acme".chars() {
            panel.type_char(c);
        }
        panel.backspace();
        assert_eq!(panel.form.company_name, "Acm");
        assert!(!panel.form.can_save());

        panel.focus_next();
        for c in "Dev".chars() {
            panel.type_char(c);
        }
        assert!(panel.form.can_save());

        panel.focus_next();
        panel.cycle(true);
        assert_eq!(panel.form.status, ApplicationStatus::Screen);
        panel.cycle(false);
        panel.cycle(false);
        assert_eq!(panel.form.status, ApplicationStatus::Draft);

        panel.focus_next();
        panel.type_char('9');
        assert_eq!(panel.form.priority, 5);
        panel.cycle(false);
        assert_eq!(panel.form.priority, 4);

        panel.focus = WORK_MODE_FIELD;
        panel.cycle(true);
        assert_eq!(panel.form.work_mode, "remote");
        assert_eq!(panel.value(WORK_MODE_FIELD), "remote");
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut panel = CreatePanel::new();
        panel.focus_prev();
        assert_eq!(panel.focus, CREATE_FIELDS.len() - 1);
        panel.focus_next();
        assert_eq!(panel.focus, 0);
    }

    fn sample(db: &Database, company: &str) -> String {
        let new = NewApplicationForm {
            company_name: company.into(),
            role_title: "Engineer".into(),
            work_mode: "remote".into(),
            ..Default::default()
        }
        .build()
        .unwrap();
        db.create_application(&new).unwrap()
    }

    fn browse_state(db: &Database) -> AppState {
        let rows = db.list_applications().unwrap();
        AppState::new(rows, FilterCriteria::default(), ViewerZone::Local)
    }

    #[test]
    fn esc_closes_the_drawer_but_never_quits() {
        let db = Database::open_in_memory().unwrap();
        let id = sample(&db, "Acme");
        let mut state = browse_state(&db);
        assert!(state.list.select(&id));
        assert!(handle_key(&mut state, &db, KeyCode::Enter));
        assert!(state.drawer_open);

        assert!(handle_key(&mut state, &db, KeyCode::Esc));
        assert!(!state.drawer_open);
        assert_eq!(state.list.selected(), None);
        assert!(handle_key(&mut state, &db, KeyCode::Esc));
        assert!(!handle_key(&mut state, &db, KeyCode::Char('q')));
    }

    #[test]
    fn touch_key_saves_only_last_touch() {
        let db = Database::open_in_memory().unwrap();
        let id = sample(&db, "Acme");
        let mut state = browse_state(&db);
        assert!(state.list.select(&id));
        assert!(handle_key(&mut state, &db, KeyCode::Char('t')));

        let stored = db.get_application(&id).unwrap().unwrap();
        assert!(stored.last_touch_at.is_some());
        assert_eq!(stored.last_touch_at, state.list.all()[0].last_touch_at);
        assert_eq!(stored.work_mode.as_deref(), Some("remote"));
        assert_eq!(stored.company_name, "Acme");
    }

    #[test]
    fn reset_hint_only_with_active_filters() {
        let mut filters = FilterCriteria::default();
        assert!(!browse_help(&filters).contains("R:reset"));
        filters.priority = Some(2);
        assert!(browse_help(&filters).contains("R:reset"));
    }

    #[test]
    fn filter_changes_close_the_drawer() {
        let mut state = AppState::new(Vec::new(), FilterCriteria::default(), ViewerZone::Local);
        state.drawer_open = true;
        state.update_filters(|f| f.search.push('x'));
        assert!(!state.drawer_open);
        assert_eq!(state.list.filters().search, "x");
    }
}
