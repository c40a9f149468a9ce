use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveDate};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dayplan::clock::{Clock, Ticker};
use dayplan::config::PlannerConfig;
use dayplan::countdown::Countdown;
use dayplan::drag::RowSpan;
use dayplan::format::{format_clock, format_display_date};
use dayplan::model::{EventItem, ItemId, Planner, PlannerError};
use dayplan::notify::TerminalNotifier;
use dayplan::reminder::{self, Notifier, Permission};
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::collections::VecDeque;
use std::io::{stdout, Stdout};
use std::time::Duration;

pub fn run(config: PlannerConfig, clock: Box<dyn Clock>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let notifier = TerminalNotifier::new(stdout(), config.notifications);
    let mut app = App::new(config, clock, Box::new(notifier));
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    planner: Planner,
    config: PlannerConfig,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    ticker: Ticker,
    countdown: Countdown,
    date: String,
    category_idx: usize,
    mood_idx: usize,
    focus: Pane,
    task_idx: usize,
    event_idx: usize,
    note_idx: usize,
    mood_log_idx: usize,
    task_view: TaskView,
    gesture: Option<DragGesture>,
    alerts: VecDeque<String>,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    Form(Form),
    PickMood,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Pane {
    Tasks,
    Events,
    Notes,
    Moods,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Tasks => Pane::Events,
            Pane::Events => Pane::Notes,
            Pane::Notes => Pane::Moods,
            Pane::Moods => Pane::Tasks,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Tasks => Pane::Moods,
            Pane::Events => Pane::Tasks,
            Pane::Notes => Pane::Events,
            Pane::Moods => Pane::Notes,
        }
    }
}

/// One rendered row of the tasks pane.
#[derive(Clone, Debug, PartialEq, Eq)]
enum TaskLine {
    Day(String),
    Category { date: String, category: String },
    Task { date: String, category: String, id: ItemId },
}

/// What the tasks pane looked like on the last frame, for mouse hit tests.
#[derive(Default)]
struct TaskView {
    inner: Rect,
    offset: usize,
    lines: Vec<TaskLine>,
}

struct DragGesture {
    id: ItemId,
    moved: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum FormKind {
    Task,
    Event,
    Note,
    Date,
}

struct Form {
    kind: FormKind,
    fields: Vec<FieldValue>,
    active: usize,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_grapheme(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_grapheme(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_grapheme(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl Form {
    fn new(kind: FormKind) -> Self {
        let count = Form::labels(kind).len();
        Form {
            kind,
            fields: vec![FieldValue::new(""); count],
            active: 0,
        }
    }

    fn date(current: &str) -> Self {
        Form {
            kind: FormKind::Date,
            fields: vec![FieldValue::new(current)],
            active: 0,
        }
    }

    fn labels(kind: FormKind) -> &'static [&'static str] {
        match kind {
            FormKind::Task => &["Task"],
            FormKind::Event => &["Title", "Time"],
            FormKind::Note => &["Note"],
            FormKind::Date => &["Date"],
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Task => "New Task",
            FormKind::Event => "New Event",
            FormKind::Note => "New Note",
            FormKind::Date => "Pick Date",
        }
    }

    fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    fn prev_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        &mut self.fields[self.active]
    }

    fn value(&self, idx: usize) -> &str {
        self.fields
            .get(idx)
            .map(|f| f.value.as_str())
            .unwrap_or_default()
    }
}

impl App {
    fn new(config: PlannerConfig, clock: Box<dyn Clock>, mut notifier: Box<dyn Notifier>) -> Self {
        let permission = notifier.request_permission();
        info!(
            "event=notification_permission module=ui permission={}",
            permission.label()
        );
        let today = clock.now().date();
        let ticker = Ticker::new(config.tick_period());
        App {
            planner: Planner::new(config.reminder_lead()),
            config,
            clock,
            notifier,
            ticker,
            countdown: Countdown::Idle,
            date: iso_date(today),
            category_idx: 0,
            mood_idx: 0,
            focus: Pane::Tasks,
            task_idx: 0,
            event_idx: 0,
            note_idx: 0,
            mood_log_idx: 0,
            task_view: TaskView::default(),
            gesture: None,
            alerts: VecDeque::new(),
            status: "Ready (t task, e event, n note, m mood, q quit)".into(),
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let ticks = self.ticker.handle();
        loop {
            self.on_tick();
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        ticks.cancel();
        info!("event=app_exit module=ui");
        Ok(())
    }

    /// Fires due reminders and refreshes the countdown when the ticker says so.
    fn on_tick(&mut self) {
        let now = self.clock.now();
        let fired = self.planner.take_due_reminders(now);
        if !fired.is_empty() {
            let lead = self.planner.reminders().lead();
            let alerts = reminder::dispatch(&fired, lead, self.notifier.as_mut());
            self.alerts.extend(alerts);
        }
        if self.ticker.poll(now) {
            self.countdown = self.planner.countdown(now);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if !self.alerts.is_empty() {
            self.handle_alert_key(key);
            return false;
        }
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Form(_) => {
                self.handle_form_key(key);
                false
            }
            Mode::PickMood => {
                self.handle_mood_key(key);
                false
            }
        }
    }

    fn handle_alert_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            self.alerts.pop_front();
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Char('t') => {
                self.mode = Mode::Form(Form::new(FormKind::Task));
                self.status = "New task (↑↓ category, Enter save, Esc cancel)".into();
            }
            KeyCode::Char('e') => {
                self.mode = Mode::Form(Form::new(FormKind::Event));
                self.status = "New event (Tab switch field, Enter save, Esc cancel)".into();
            }
            KeyCode::Char('n') => {
                self.mode = Mode::Form(Form::new(FormKind::Note));
                self.status = "New note (Enter save, Esc cancel)".into();
            }
            KeyCode::Char('m') => {
                self.mode = Mode::PickMood;
                self.status = "How are you feeling? (↑↓ choose, Enter log, Esc cancel)".into();
            }
            KeyCode::Char('D') => {
                self.mode = Mode::Form(Form::date(&self.date));
                self.status = "Pick a date as YYYY-MM-DD".into();
            }
            KeyCode::Char('[') => self.shift_date(-1),
            KeyCode::Char(']') => self.shift_date(1),
            KeyCode::Char('T') => {
                self.date = iso_date(self.clock.now().date());
                self.status = format!("Date set to {}", format_display_date(&self.date));
            }
            KeyCode::Char('N') => self.toggle_notifications(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Char('K') => self.nudge_selected(-1),
            KeyCode::Char('J') => self.nudge_selected(1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('x') | KeyCode::Delete => self.remove_selected(),
            _ => {}
        }
        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mut form = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Form(form) => form,
            other => {
                self.mode = other;
                return;
            }
        };
        let mut close_form = false;
        match key.code {
            KeyCode::Esc => {
                close_form = true;
                self.status = "Canceled".into();
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Left => form.active_field_mut().move_left(),
            KeyCode::Right => form.active_field_mut().move_right(),
            KeyCode::Up if form.kind == FormKind::Task => self.cycle_category(-1),
            KeyCode::Down if form.kind == FormKind::Task => self.cycle_category(1),
            KeyCode::Enter => close_form = self.submit_form(&form),
            KeyCode::Backspace => form.active_field_mut().backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.active_field_mut().insert_char(c);
                }
            }
            _ => {}
        }
        if !close_form {
            self.mode = Mode::Form(form);
        }
    }

    fn handle_mood_key(&mut self, key: KeyEvent) {
        let count = self.config.moods.len();
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Canceled".into();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.mood_idx = (self.mood_idx + count.max(1) - 1) % count.max(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.mood_idx = (self.mood_idx + 1) % count.max(1);
            }
            KeyCode::Enter => {
                let mood = self
                    .config
                    .moods
                    .get(self.mood_idx)
                    .cloned()
                    .unwrap_or_default();
                let now = self.clock.now();
                match self.planner.log_mood(&mood, now) {
                    Ok(entry) => self.status = format!("Logged {}", entry.display_text()),
                    Err(err) => {
                        self.report(err);
                    }
                }
                self.mood_log_idx = self.planner.moods().len().saturating_sub(1);
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !self.alerts.is_empty() || !matches!(self.mode, Mode::Normal) {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(TaskLine::Task { id, .. }) = self.task_line_at(mouse.column, mouse.row)
                {
                    self.focus = Pane::Tasks;
                    self.select_task(&id);
                    if self.planner.begin_drag(&id).is_ok() {
                        self.gesture = Some(DragGesture { id, moved: false });
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => self.drag_to(mouse.column, mouse.row),
            MouseEventKind::Up(MouseButton::Left) => self.finish_drag(),
            _ => {}
        }
    }

    fn drag_to(&mut self, column: u16, row: u16) {
        let id = match &self.gesture {
            Some(gesture) => gesture.id.clone(),
            None => return,
        };
        let (date, category) = match self.task_line_at(column, row) {
            Some(TaskLine::Task { date, category, .. })
            | Some(TaskLine::Category { date, category }) => (date, category),
            _ => return,
        };
        let rows = self.list_rows(&date, &category);
        let dragged_top = rows
            .iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, span)| span.top);
        let spans: Vec<RowSpan> = rows.into_iter().map(|(_, span)| span).collect();
        let pointer = pointer_for_cell(row, dragged_top);
        let before = self.planner.find_task(&id);
        match self.planner.drag_over(&date, &category, &spans, pointer) {
            Ok(Some(_)) => {
                if self.planner.find_task(&id) != before {
                    if let Some(gesture) = self.gesture.as_mut() {
                        gesture.moved = true;
                    }
                }
                self.select_task(&id);
            }
            Ok(None) => {}
            Err(err) => {
                self.report(err);
            }
        }
    }

    fn finish_drag(&mut self) {
        let gesture = match self.gesture.take() {
            Some(gesture) => gesture,
            None => return,
        };
        self.planner.end_drag();
        if gesture.moved {
            self.status = "Reordered task".into();
        } else {
            self.toggle_task(&gesture.id);
        }
    }

    /// Screen geometry of the items of one category list, in render order.
    fn list_rows(&self, date: &str, category: &str) -> Vec<(ItemId, RowSpan)> {
        let view = &self.task_view;
        view.lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| match line {
                TaskLine::Task {
                    date: d,
                    category: c,
                    id,
                } if d == date && c == category => {
                    let top = view.inner.y as f64 + idx as f64 - view.offset as f64;
                    Some((id.clone(), RowSpan::new(top, 1.0)))
                }
                _ => None,
            })
            .collect()
    }

    fn task_line_at(&self, column: u16, row: u16) -> Option<TaskLine> {
        let inner = self.task_view.inner;
        if column < inner.x
            || column >= inner.x + inner.width
            || row < inner.y
            || row >= inner.y + inner.height
        {
            return None;
        }
        let idx = self.task_view.offset + (row - inner.y) as usize;
        self.task_view.lines.get(idx).cloned()
    }

    fn submit_form(&mut self, form: &Form) -> bool {
        match form.kind {
            FormKind::Task => {
                let category = self.current_category();
                match self.planner.add_task(&self.date, &category, form.value(0)) {
                    Ok(id) => {
                        self.select_task(&id);
                        self.status = format!(
                            "Added {} task for {}",
                            category,
                            format_display_date(&self.date)
                        );
                        true
                    }
                    Err(err) => self.report(err),
                }
            }
            FormKind::Event => {
                let now = self.clock.now();
                match self
                    .planner
                    .add_event(&self.date, form.value(0), form.value(1), now)
                {
                    Ok(id) => {
                        self.status = match self.planner.event(&id) {
                            Some(event) if event.reminder.is_some() => {
                                format!("Added {} (reminder armed)", event.display_text())
                            }
                            Some(event) => format!(
                                "Added {} (too late for a reminder today)",
                                event.display_text()
                            ),
                            None => "Added event".into(),
                        };
                        self.select_event(&id);
                        true
                    }
                    Err(err) => self.report(err),
                }
            }
            FormKind::Note => match self.planner.add_note(form.value(0)) {
                Ok(_) => {
                    self.note_idx = self.planner.notes().len().saturating_sub(1);
                    self.status = "Added note".into();
                    true
                }
                Err(err) => self.report(err),
            },
            FormKind::Date => {
                let value = form.value(0).trim();
                if value.is_empty() {
                    return false;
                }
                self.date = value.to_string();
                self.status = format!("Date set to {}", format_display_date(&self.date));
                true
            }
        }
    }

    /// Shows an error in the status line. Blank input is ignored silently.
    /// Always returns false so form submitters can keep the form open.
    fn report(&mut self, err: PlannerError) -> bool {
        if !matches!(err, PlannerError::BlankInput(_)) {
            self.status = format!("Error: {}", err);
        }
        false
    }

    fn shift_date(&mut self, days: i64) {
        let base = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .unwrap_or_else(|_| self.clock.now().date());
        if let Some(next) = base.checked_add_signed(ChronoDuration::days(days)) {
            self.date = iso_date(next);
            self.status = format!("Date set to {}", format_display_date(&self.date));
        }
    }

    fn toggle_notifications(&mut self) {
        let next = match self.notifier.permission() {
            Permission::Granted => Permission::Denied,
            Permission::Denied | Permission::Default => Permission::Granted,
        };
        self.notifier.set_permission(next);
        info!(
            "event=notification_permission module=ui permission={}",
            next.label()
        );
        self.status = format!("Desktop notifications {}", next.label());
    }

    fn cycle_category(&mut self, delta: isize) {
        let count = self.config.categories.len().max(1) as isize;
        self.category_idx = (self.category_idx as isize + delta).rem_euclid(count) as usize;
    }

    fn current_category(&self) -> String {
        self.config
            .categories
            .get(self.category_idx)
            .cloned()
            .unwrap_or_default()
    }

    fn task_ids(&self) -> Vec<ItemId> {
        task_lines(&self.planner)
            .into_iter()
            .filter_map(|line| match line {
                TaskLine::Task { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    fn event_entries(&self) -> Vec<&EventItem> {
        self.planner
            .event_days()
            .flat_map(|day| day.events.iter())
            .collect()
    }

    fn selected_task_id(&self) -> Option<ItemId> {
        self.task_ids().get(self.task_idx).cloned()
    }

    fn select_task(&mut self, id: &str) {
        if let Some(idx) = self.task_ids().iter().position(|t| t == id) {
            self.task_idx = idx;
        }
    }

    fn select_event(&mut self, id: &str) {
        if let Some(idx) = self.event_entries().iter().position(|e| e.id == id) {
            self.event_idx = idx;
        }
    }

    fn pane_len(&self, pane: Pane) -> usize {
        match pane {
            Pane::Tasks => self.planner.progress().total,
            Pane::Events => self.event_entries().len(),
            Pane::Notes => self.planner.notes().len(),
            Pane::Moods => self.planner.moods().len(),
        }
    }

    fn selection_mut(&mut self, pane: Pane) -> &mut usize {
        match pane {
            Pane::Tasks => &mut self.task_idx,
            Pane::Events => &mut self.event_idx,
            Pane::Notes => &mut self.note_idx,
            Pane::Moods => &mut self.mood_log_idx,
        }
    }

    fn select_prev(&mut self) {
        let idx = self.selection_mut(self.focus);
        *idx = idx.saturating_sub(1);
    }

    fn select_next(&mut self) {
        let len = self.pane_len(self.focus);
        let idx = self.selection_mut(self.focus);
        if *idx + 1 < len {
            *idx += 1;
        }
    }

    fn ensure_bounds(&mut self) {
        for pane in [Pane::Tasks, Pane::Events, Pane::Notes, Pane::Moods] {
            let len = self.pane_len(pane);
            let idx = self.selection_mut(pane);
            *idx = (*idx).min(len.saturating_sub(1));
        }
    }

    fn nudge_selected(&mut self, offset: isize) {
        if self.focus != Pane::Tasks {
            return;
        }
        if let Some(id) = self.selected_task_id() {
            match self.planner.nudge_task(&id, offset) {
                Ok(_) => self.select_task(&id),
                Err(err) => {
                    self.report(err);
                }
            }
        }
    }

    fn toggle_selected(&mut self) {
        if self.focus != Pane::Tasks {
            return;
        }
        if let Some(id) = self.selected_task_id() {
            self.toggle_task(&id);
        }
    }

    fn toggle_task(&mut self, id: &str) {
        match self.planner.toggle_task(id) {
            Ok(done) => {
                let progress = self.planner.progress();
                self.status = format!(
                    "Marked {} ({:.0}% done)",
                    if done { "done" } else { "not done" },
                    progress.percent()
                );
            }
            Err(err) => {
                self.report(err);
            }
        }
    }

    fn remove_selected(&mut self) {
        let outcome = match self.focus {
            Pane::Tasks => match self.selected_task_id() {
                Some(id) => self.planner.remove_task(&id).map(|t| format!("Removed {}", t.text)),
                None => return,
            },
            Pane::Events => {
                let id = match self.event_entries().get(self.event_idx) {
                    Some(event) => event.id.clone(),
                    None => return,
                };
                self.planner
                    .remove_event(&id)
                    .map(|e| format!("Removed {}", e.display_text()))
            }
            Pane::Notes => {
                let id = match self.planner.notes().get(self.note_idx) {
                    Some(note) => note.id.clone(),
                    None => return,
                };
                self.planner.remove_note(&id).map(|_| "Removed note".to_string())
            }
            Pane::Moods => {
                self.status = "The mood log is append-only".into();
                return;
            }
        };
        match outcome {
            Ok(message) => self.status = message,
            Err(err) => {
                self.report(err);
            }
        }
        self.ensure_bounds();
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        self.ensure_bounds();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_progress(f, layout[1]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ])
            .split(layout[2]);
        let logs = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(body[2]);
        self.draw_tasks(f, body[0]);
        self.draw_events(f, body[1]);
        self.draw_notes(f, logs[0]);
        self.draw_moods(f, logs[1]);
        self.draw_footer(f, layout[3]);

        match &self.mode {
            Mode::Form(form) => self.draw_form(f, form),
            Mode::PickMood => self.draw_mood_picker(f),
            Mode::Normal => {}
        }
        if let Some(alert) = self.alerts.front() {
            draw_alert(f, alert, self.alerts.len());
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "dayplan ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("📅 {}", format_display_date(&self.date)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("category {}", self.current_category()),
                Style::default().fg(color_for_index(self.category_idx)),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("🔔 {}", self.notifier.permission().label()),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  •  "),
            Span::styled(
                self.countdown.to_string(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_progress(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let progress = self.planner.progress();
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title("Progress"),
            )
            .gauge_style(Style::default().fg(Color::LightGreen).bg(Color::Rgb(22, 24, 30)))
            .ratio(progress.ratio().clamp(0.0, 1.0))
            .label(format!(
                "{:.0}% ({} / {})",
                progress.percent(),
                progress.done,
                progress.total
            ));
        f.render_widget(gauge, area);
    }

    fn draw_tasks(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = task_lines(&self.planner);
        let focused = self.focus == Pane::Tasks;
        let selected_line = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| matches!(line, TaskLine::Task { .. }))
            .nth(self.task_idx)
            .map(|(idx, _)| idx);
        let block = pane_block(&format!("Tasks ({})", self.planner.progress().total), focused);
        let inner = block.inner(area);
        let offset = adjust_offset(
            selected_line.unwrap_or(0),
            self.task_view.offset,
            inner.height as usize,
            1,
            lines.len(),
        );
        let items = if lines.is_empty() {
            vec![ListItem::new("No tasks yet (t to add)")]
        } else {
            lines
                .iter()
                .map(|line| self.task_line_item(line, inner.width as usize))
                .collect()
        };
        let mut state = ListState::default();
        *state.offset_mut() = offset;
        if focused {
            state.select(selected_line);
        }
        let list = List::new(items).block(block).highlight_style(highlight());
        f.render_stateful_widget(list, area, &mut state);
        self.task_view = TaskView {
            inner,
            offset: state.offset(),
            lines,
        };
    }

    fn task_line_item(&self, line: &TaskLine, width: usize) -> ListItem<'static> {
        match line {
            TaskLine::Day(heading) => ListItem::new(Line::from(Span::styled(
                heading.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))),
            TaskLine::Category { category, .. } => {
                let color = self
                    .config
                    .categories
                    .iter()
                    .position(|c| c == category)
                    .map(color_for_index)
                    .unwrap_or(Color::Gray);
                ListItem::new(Line::from(Span::styled(
                    format!("  {}", category),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )))
            }
            TaskLine::Task { id, .. } => {
                let task = match self.planner.task(id) {
                    Some(task) => task,
                    None => return ListItem::new(""),
                };
                let dragging = self.planner.dragging() == Some(id.as_str());
                let marker = if dragging {
                    "⇅"
                } else if task.done {
                    "[x]"
                } else {
                    "[ ]"
                };
                let text = truncate_text(&task.text, width.saturating_sub(10));
                let style = if dragging {
                    Style::default()
                        .fg(Color::LightYellow)
                        .add_modifier(Modifier::ITALIC)
                } else if task.done {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("{} ", marker), Style::default().fg(Color::Gray)),
                    Span::styled(text, style),
                ]))
            }
        }
    }

    fn draw_events(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Pane::Events;
        let mut items = Vec::new();
        let mut selected_line = None;
        let mut event_no = 0;
        for day in self.planner.event_days() {
            items.push(ListItem::new(Line::from(Span::styled(
                day.heading(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))));
            for event in &day.events {
                if event_no == self.event_idx {
                    selected_line = Some(items.len());
                }
                event_no += 1;
                let mut spans = vec![
                    Span::raw("  "),
                    Span::styled(
                        format_clock(event.time),
                        Style::default().fg(Color::LightCyan),
                    ),
                    Span::raw(" - "),
                    Span::styled(
                        truncate_text(&event.title, (area.width as usize).saturating_sub(14)),
                        Style::default().fg(Color::White),
                    ),
                ];
                if event.reminder.is_some() {
                    spans.push(Span::raw(" 🔔"));
                }
                items.push(ListItem::new(Line::from(spans)));
            }
        }
        if items.is_empty() {
            items.push(ListItem::new("No events yet (e to add)"));
        }
        let block = pane_block(&format!("Events ({})", event_no), focused);
        let viewport = block.inner(area).height as usize;
        let mut state = ListState::default();
        *state.offset_mut() = adjust_offset(selected_line.unwrap_or(0), 0, viewport, 1, items.len());
        if focused {
            state.select(selected_line);
        }
        let list = List::new(items).block(block).highlight_style(highlight());
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_notes(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Pane::Notes;
        let notes = self.planner.notes();
        let width = (area.width as usize).saturating_sub(6);
        let items: Vec<ListItem> = if notes.is_empty() {
            vec![ListItem::new("No notes (n to add)")]
        } else {
            notes
                .iter()
                .map(|note| ListItem::new(format!("⭐ {}", truncate_text(&note.text, width))))
                .collect()
        };
        let block = pane_block(&format!("Notes ({})", notes.len()), focused);
        self.render_simple_list(f, area, block, items, focused && !notes.is_empty(), self.note_idx);
    }

    fn draw_moods(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Pane::Moods;
        let moods = self.planner.moods();
        let items: Vec<ListItem> = if moods.is_empty() {
            vec![ListItem::new("No moods logged (m to log)")]
        } else {
            moods
                .iter()
                .map(|entry| ListItem::new(entry.display_text()))
                .collect()
        };
        let block = pane_block("Mood Log", focused);
        self.render_simple_list(
            f,
            area,
            block,
            items,
            focused && !moods.is_empty(),
            self.mood_log_idx,
        );
    }

    fn render_simple_list(
        &self,
        f: &mut ratatui::Frame<'_>,
        area: Rect,
        block: Block<'static>,
        items: Vec<ListItem<'static>>,
        show_selection: bool,
        selected: usize,
    ) {
        let viewport = block.inner(area).height as usize;
        let mut state = ListState::default();
        *state.offset_mut() = adjust_offset(selected, 0, viewport, 1, items.len());
        if show_selection {
            state.select(Some(selected));
        }
        let list = List::new(items).block(block).highlight_style(highlight());
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[1]);
        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let next = match self.planner.reminders().next_fire_at() {
            Some(at) => format!(
                "next reminder {} ({} armed)",
                format_clock(at.time()),
                self.planner.reminders().len()
            ),
            None => "no reminders armed".to_string(),
        };
        let reminders = Paragraph::new(next).alignment(Alignment::Right).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(reminders, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("Tab", Style::default().fg(Color::LightCyan)),
            Span::raw(" pane  "),
            Span::styled("[ ] T D", Style::default().fg(Color::LightCyan)),
            Span::raw(" date  "),
            Span::styled("t e n m", Style::default().fg(Color::LightMagenta)),
            Span::raw(" add  "),
        ];
        match self.focus {
            Pane::Tasks => spans.extend([
                Span::styled("Space", Style::default().fg(Color::LightGreen)),
                Span::raw(" done  "),
                Span::styled("J/K or mouse", Style::default().fg(Color::LightGreen)),
                Span::raw(" reorder  "),
                Span::styled("x", Style::default().fg(Color::LightRed)),
                Span::raw(" remove  "),
            ]),
            Pane::Events | Pane::Notes => spans.extend([
                Span::styled("x", Style::default().fg(Color::LightRed)),
                Span::raw(" remove  "),
            ]),
            Pane::Moods => {}
        }
        spans.extend([
            Span::styled("N", Style::default().fg(Color::LightYellow)),
            Span::raw(" notifications  "),
            Span::styled("q", Style::default().fg(Color::LightRed)),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, form: &Form) {
        let area = centered_rect(60, 40, f.size());
        let mut lines = Vec::new();
        for (idx, label) in Form::labels(form.kind).iter().enumerate() {
            if let Some(field) = form.fields.get(idx) {
                lines.push(field_line(label, field, idx == form.active));
            }
        }
        if form.kind == FormKind::Task {
            lines.push(Line::from(vec![
                Span::styled(
                    "Category: ",
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::BOLD | Modifier::DIM),
                ),
                Span::styled(
                    format!("‹ {} ›", self.current_category()),
                    Style::default().fg(color_for_index(self.category_idx)),
                ),
            ]));
        }
        if form.kind != FormKind::Date {
            lines.push(Line::from(Span::styled(
                format!("Date: {}", format_display_date(&self.date)),
                Style::default().fg(Color::DarkGray),
            )));
        }
        let block = Block::default()
            .title(Span::styled(
                form.title(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
        f.render_widget(Clear, area);
        f.render_widget(paragraph, area);
    }

    fn draw_mood_picker(&self, f: &mut ratatui::Frame<'_>) {
        let area = centered_rect(40, 40, f.size());
        let items: Vec<ListItem> = self
            .config
            .moods
            .iter()
            .map(|m| ListItem::new(m.clone()))
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.mood_idx));
        let list = List::new(items)
            .block(
                Block::default()
                    .title("Log Mood")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(highlight());
        f.render_widget(Clear, area);
        f.render_stateful_widget(list, area, &mut state);
    }
}

fn draw_alert(f: &mut ratatui::Frame<'_>, text: &str, queued: usize) {
    let area = centered_rect(50, 25, f.size());
    let mut lines = vec![
        Line::from(Span::styled(
            text.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to dismiss",
            Style::default().fg(Color::Gray),
        )),
    ];
    if queued > 1 {
        lines.push(Line::from(Span::styled(
            format!("{} more waiting", queued - 1),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let block = Block::default()
        .title("Reminder")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightRed))
        .style(Style::default().bg(Color::Rgb(40, 16, 16)));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn task_lines(planner: &Planner) -> Vec<TaskLine> {
    let mut lines = Vec::new();
    for day in planner.task_days() {
        lines.push(TaskLine::Day(day.heading()));
        for (category, items) in &day.categories {
            lines.push(TaskLine::Category {
                date: day.date.clone(),
                category: category.clone(),
            });
            lines.extend(items.iter().map(|task| TaskLine::Task {
                date: day.date.clone(),
                category: category.clone(),
                id: task.id.clone(),
            }));
        }
    }
    lines
}

/// Terminal rows are whole cells; place the pointer toward the side the item
/// travels from so hovering a row lands the item on it.
fn pointer_for_cell(row: u16, dragged_top: Option<f64>) -> f64 {
    let y = row as f64;
    match dragged_top {
        Some(top) if y < top => y + 0.25,
        _ => y + 0.75,
    }
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn pane_block(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(if focused { Color::Cyan } else { Color::Gray })
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::LightCyan)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn color_for_index(idx: usize) -> Color {
    let palette = [
        Color::Cyan,
        Color::LightGreen,
        Color::LightMagenta,
        Color::LightBlue,
        Color::LightYellow,
        Color::LightRed,
    ];
    palette[idx % palette.len()]
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn prev_grapheme(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_grapheme(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out.chars().take(max).collect()
}

fn field_line(label: &str, field: &FieldValue, active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(text, value_style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use dayplan::clock::ManualClock;
    use ratatui::backend::TestBackend;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        permission: Rc<RefCell<Option<Permission>>>,
        shown: Rc<RefCell<Vec<String>>>,
    }

    impl Notifier for RecordingNotifier {
        fn permission(&self) -> Permission {
            self.permission.borrow().unwrap_or(Permission::Default)
        }

        fn request_permission(&mut self) -> Permission {
            *self
                .permission
                .borrow_mut()
                .get_or_insert(Permission::Granted)
        }

        fn set_permission(&mut self, permission: Permission) {
            *self.permission.borrow_mut() = Some(permission);
        }

        fn notify(&mut self, title: &str, body: &str) -> Result<()> {
            self.shown.borrow_mut().push(format!("{} {}", title, body));
            Ok(())
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn app_at(now: NaiveDateTime) -> (App, ManualClock, RecordingNotifier) {
        let clock = ManualClock::new(now);
        let notifier = RecordingNotifier::default();
        let app = App::new(
            PlannerConfig::default(),
            Box::new(clock.clone()),
            Box::new(notifier.clone()),
        );
        (app, clock, notifier)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn mouse(app: &mut App, kind: MouseEventKind, row: u16) {
        let column = app.task_view.inner.x + 2;
        app.handle_mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        });
    }

    fn row_of(app: &App, text: &str) -> u16 {
        let idx = app
            .task_view
            .lines
            .iter()
            .position(|line| match line {
                TaskLine::Task { id, .. } => app.planner.task(id).map(|t| t.text.as_str()) == Some(text),
                _ => false,
            })
            .unwrap();
        app.task_view.inner.y + (idx - app.task_view.offset) as u16
    }

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 32)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn work_texts(app: &App) -> Vec<String> {
        app.planner
            .category_items("2024-05-01", "Work")
            .unwrap_or_default()
            .iter()
            .map(|t| t.text.clone())
            .collect()
    }

    #[test]
    fn task_form_files_under_the_chosen_category() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Down);
        type_text(&mut app, "Call mom");
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        let items = app.planner.category_items("2024-05-01", "Personal").unwrap();
        assert_eq!(items[0].text, "Call mom");
    }

    #[test]
    fn blank_submissions_keep_the_form_open() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Form(_)));
        assert!(app.planner.notes().is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.status, "Canceled");
    }

    #[test]
    fn invalid_event_time_is_reported() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "Standup");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "25:00");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Form(_)));
        assert!(app.status.contains("invalid time"));
    }

    #[test]
    fn due_reminder_raises_a_blocking_alert() {
        let (mut app, clock, notifier) = app_at(at(8, 50, 0));
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "Standup");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "09:00");
        press(&mut app, KeyCode::Enter);
        assert!(app.status.contains("reminder armed"));

        app.on_tick();
        assert_eq!(app.countdown.to_string(), "⏱️ Countdown: 10m 0s");

        clock.set(at(8, 59, 0));
        app.on_tick();
        assert_eq!(app.countdown.to_string(), "⏱️ Countdown: 1m 0s");
        assert_eq!(
            app.alerts.front().map(String::as_str),
            Some("⏰ Reminder: Standup starts in 1 minute!")
        );
        assert_eq!(notifier.shown.borrow().len(), 1);

        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.alerts.len(), 1);
        press(&mut app, KeyCode::Enter);
        assert!(app.alerts.is_empty());
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn revoked_permission_still_alerts_in_app() {
        let (mut app, clock, notifier) = app_at(at(8, 0, 0));
        app.planner
            .add_event("2024-05-01", "Standup", "09:00", at(8, 0, 0))
            .unwrap();
        press(&mut app, KeyCode::Char('N'));
        assert_eq!(app.notifier.permission(), Permission::Denied);

        clock.set(at(8, 59, 30));
        app.on_tick();
        assert_eq!(app.alerts.len(), 1);
        assert!(notifier.shown.borrow().is_empty());
    }

    #[test]
    fn removing_an_event_disarms_its_reminder() {
        let (mut app, clock, _) = app_at(at(8, 0, 0));
        app.planner
            .add_event("2024-05-01", "Standup", "09:00", at(8, 0, 0))
            .unwrap();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Pane::Events);
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.planner.event_days().count(), 0);

        clock.set(at(8, 59, 0));
        app.on_tick();
        assert!(app.alerts.is_empty());
    }

    #[test]
    fn mouse_drag_reorders_and_click_toggles() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        for text in ["A", "B", "C"] {
            app.planner.add_task("2024-05-01", "Work", text).unwrap();
        }
        render(&mut app);

        let a = row_of(&app, "A");
        let c = row_of(&app, "C");
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), a);
        assert!(app.planner.dragging().is_some());
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), c);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), c);
        assert_eq!(work_texts(&app), vec!["B", "C", "A"]);
        assert_eq!(app.planner.dragging(), None);
        assert_eq!(app.planner.progress().done, 0);

        render(&mut app);
        let b = row_of(&app, "B");
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), b);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), b);
        assert_eq!(app.planner.progress().done, 1);
    }

    #[test]
    fn jittery_click_on_one_row_still_toggles() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        for text in ["A", "B"] {
            app.planner.add_task("2024-05-01", "Work", text).unwrap();
        }
        render(&mut app);

        let a = row_of(&app, "A");
        let column = app.task_view.inner.x + 2;
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), a);
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Drag(MouseButton::Left),
            column: column + 1,
            row: a,
            modifiers: KeyModifiers::NONE,
        });
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), a);

        assert_eq!(work_texts(&app), vec!["A", "B"]);
        assert_eq!(app.planner.progress().done, 1);
        assert!(app.status.starts_with("Marked done"));
    }

    #[test]
    fn dragging_up_lands_on_the_hovered_row() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        for text in ["A", "B", "C"] {
            app.planner.add_task("2024-05-01", "Work", text).unwrap();
        }
        render(&mut app);
        let b = row_of(&app, "B");
        let c = row_of(&app, "C");
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), c);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), b);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), b);
        assert_eq!(work_texts(&app), vec!["A", "C", "B"]);
    }

    #[test]
    fn keyboard_nudge_moves_the_selected_task() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        for text in ["A", "B", "C"] {
            app.planner.add_task("2024-05-01", "Work", text).unwrap();
        }
        press(&mut app, KeyCode::Char('J'));
        assert_eq!(work_texts(&app), vec!["B", "A", "C"]);
        assert_eq!(app.task_idx, 1);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.planner.task(&app.task_ids()[1]).map(|t| t.done), Some(true));
    }

    #[test]
    fn date_keys_shift_and_reset() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.date, "2024-05-02");
        press(&mut app, KeyCode::Char('['));
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.date, "2024-04-30");
        press(&mut app, KeyCode::Char('T'));
        assert_eq!(app.date, "2024-05-01");
    }

    #[test]
    fn moods_are_logged_from_the_picker() {
        let (mut app, _, _) = app_at(at(14, 5, 0));
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.planner.moods()[0].display_text(), "14:05 — 😐 Neutral");
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn render_shows_header_and_panes() {
        let (mut app, _, _) = app_at(at(8, 0, 0));
        app.planner.add_note("Buy milk").unwrap();
        app.on_tick();
        let screen = render(&mut app);
        assert!(screen.contains("Countdown: --"));
        assert!(screen.contains("Tasks (0)"));
        assert!(screen.contains("Buy milk"));
        assert!(screen.contains("0% (0 / 0)"));
    }

    #[test]
    fn pointer_biases_toward_travel_direction() {
        assert_eq!(pointer_for_cell(3, Some(5.0)), 3.25);
        assert_eq!(pointer_for_cell(7, Some(5.0)), 7.75);
        assert_eq!(pointer_for_cell(7, None), 7.75);
    }

    #[test]
    fn adjust_offset_keeps_selection_visible() {
        assert_eq!(adjust_offset(0, 0, 5, 1, 10), 0);
        assert_eq!(adjust_offset(6, 0, 5, 1, 10), 3);
        assert_eq!(adjust_offset(9, 0, 5, 1, 10), 5);
        assert_eq!(adjust_offset(1, 4, 5, 1, 10), 0);
    }
}
