#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap};

use crate::config::{self, Config};
use crate::output;
use crate::storage::KeyValueStore;
use crate::storage::file::FileStore;
use crate::task::model::{Category, Priority, Task, TaskDetails};
use crate::task::store::{Persistence, TaskStore};
use crate::task::view::{Counters, Filter, ViewState};
use crate::tui::theme::Palette;
use crate::tui::{self, TerminalGuard};

const EMPTY_TEXT_ERROR: &str = "Task text cannot be empty.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Searching,
    Dialog,
    Confirm,
    Help,
}

#[derive(Debug, Clone)]
struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    fn new(initial: impl Into<String>) -> Self {
        let text = initial.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn as_str(&self) -> &str {
        &self.text
    }

    fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    fn insert_char(&mut self, c: char) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        chars.insert(cur, c);
        self.text = chars.into_iter().collect();
        self.cursor = cur + 1;
    }

    fn backspace(&mut self) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        if cur == 0 {
            return;
        }
        chars.remove(cur - 1);
        self.text = chars.into_iter().collect();
        self.cursor = cur - 1;
    }

    fn delete(&mut self) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        if cur >= chars.len() {
            return;
        }
        chars.remove(cur);
        self.text = chars.into_iter().collect();
    }

    fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_right(&mut self) {
        let len = self.text.chars().count();
        self.cursor = (self.cursor + 1).min(len);
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogField {
    Text,
    Priority,
    Category,
    Notes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DialogTarget {
    New,
    Existing { id: String },
}

/// Shared form for adding a task and editing an existing one.
/// The notes field only exists when editing.
#[derive(Debug, Clone)]
struct TaskDialog {
    target: DialogTarget,
    text: TextInput,
    priority: Priority,
    category: TextInput,
    notes: TextInput,
    field: DialogField,
    error: Option<String>,
}

impl TaskDialog {
    fn new_task(priority: Priority, category: &Category) -> Self {
        Self {
            target: DialogTarget::New,
            text: TextInput::new(""),
            priority,
            category: TextInput::new(category.as_str()),
            notes: TextInput::new(""),
            field: DialogField::Text,
            error: None,
        }
    }

    fn edit(task: &Task) -> Self {
        Self {
            target: DialogTarget::Existing {
                id: task.id.clone(),
            },
            text: TextInput::new(task.text.as_str()),
            priority: task.priority,
            category: TextInput::new(task.category.as_str()),
            notes: TextInput::new(task.notes.as_str()),
            field: DialogField::Text,
            error: None,
        }
    }

    fn title(&self) -> &'static str {
        match self.target {
            DialogTarget::New => "New task",
            DialogTarget::Existing { .. } => "Task details",
        }
    }

    fn fields(&self) -> &'static [DialogField] {
        match self.target {
            DialogTarget::New => &[DialogField::Text, DialogField::Priority, DialogField::Category],
            DialogTarget::Existing { .. } => &[
                DialogField::Text,
                DialogField::Priority,
                DialogField::Category,
                DialogField::Notes,
            ],
        }
    }

    fn next_field(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.field).unwrap_or(0);
        self.field = fields[(idx + 1) % fields.len()];
    }

    fn prev_field(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.field).unwrap_or(0);
        self.field = fields[(idx + fields.len() - 1) % fields.len()];
    }

    fn cycle_category(&mut self) {
        let next = Category::new(self.category.as_str()).next_preset();
        self.category.set(next.as_str());
    }

    fn details(&self) -> TaskDetails {
        TaskDetails {
            text: self.text.as_str().to_owned(),
            priority: self.priority,
            category: Category::new(self.category.as_str()),
            notes: self.notes.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
struct ConfirmDialog {
    title: String,
    message: String,
    yes_label: String,
    no_label: String,
    action: ConfirmAction,
}

#[derive(Debug, Clone)]
enum ConfirmAction {
    DeleteTask { id: String },
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    until: Instant,
}

impl Toast {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            until: Instant::now() + Duration::from_secs(3),
        }
    }
}

struct AppState<S: KeyValueStore> {
    cfg: Config,
    store: TaskStore<S>,
    view: ViewState,
    table_state: TableState,
    mode: Mode,
    search: TextInput,
    dialog: Option<TaskDialog>,
    confirm: Option<ConfirmDialog>,
    toast: Option<Toast>,
    last_error: Option<String>,
    should_quit: bool,
}

impl<S: KeyValueStore> AppState<S> {
    fn new(cfg: Config, store: TaskStore<S>) -> Self {
        let view = ViewState::new(cfg.defaults.filter);
        let mut app = Self {
            cfg,
            store,
            view,
            table_state: TableState::default(),
            mode: Mode::Normal,
            search: TextInput::new(""),
            dialog: None,
            confirm: None,
            toast: None,
            last_error: None,
            should_quit: false,
        };
        app.clamp_selection();
        if app.store.persistence() == Persistence::MemoryOnly {
            app.last_error = Some(memory_only_message());
        }
        app
    }

    fn palette(&self) -> Palette {
        Palette::for_mode(self.store.dark_mode())
    }

    fn visible(&self) -> Vec<&Task> {
        self.view.visible(self.store.snapshot_all())
    }

    fn selected_task(&self) -> Option<&Task> {
        let idx = self.table_state.selected()?;
        self.visible().get(idx).copied()
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_task().map(|t| t.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let idx = self.table_state.selected().unwrap_or(0).min(len - 1);
        self.table_state.select(Some(idx));
    }

    fn select_id(&mut self, id: &str) {
        let pos = self.visible().iter().position(|t| t.id == id);
        if let Some(pos) = pos {
            self.table_state.select(Some(pos));
        } else {
            self.clamp_selection();
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let cur = self.table_state.selected().unwrap_or(0);
        let next = cur.saturating_add_signed(delta).min(len - 1);
        self.table_state.select(Some(next));
    }

    fn set_filter(&mut self, filter: Filter) {
        let keep = self.selected_id();
        self.view.filter = filter;
        match keep {
            Some(id) => self.select_id(&id),
            None => self.clamp_selection(),
        }
    }

    fn sync_search(&mut self) {
        self.view.search = self.search.as_str().to_owned();
        self.clamp_selection();
    }

    /// Runs a store mutation and surfaces a switch to memory-only persistence.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut TaskStore<S>) -> T) -> T {
        let before = self.store.persistence();
        let out = f(&mut self.store);
        if before == Persistence::Durable && self.store.persistence() == Persistence::MemoryOnly {
            self.last_error = Some(memory_only_message());
        }
        out
    }

    fn open_add_dialog(&mut self) {
        self.dialog = Some(TaskDialog::new_task(
            self.cfg.defaults.priority,
            &self.cfg.defaults.category(),
        ));
        self.mode = Mode::Dialog;
    }

    fn open_edit_dialog(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        self.dialog = Some(TaskDialog::edit(task));
        self.mode = Mode::Dialog;
    }

    fn close_dialog(&mut self) {
        self.dialog = None;
        self.mode = Mode::Normal;
    }

    fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.as_ref() else {
            self.mode = Mode::Normal;
            return;
        };
        let target = dialog.target.clone();
        let details = dialog.details();

        let saved = match target {
            DialogTarget::New => self.mutate(|store| {
                store.add(&details.text, details.priority, details.category.clone())
            }),
            DialogTarget::Existing { ref id } => {
                if self.store.get(id).is_none() {
                    self.close_dialog();
                    self.last_error = Some(format!("task {id} no longer exists"));
                    return;
                }
                self.mutate(|store| store.update_details(id, details.clone()))
            }
        };

        let Some(task) = saved else {
            if let Some(dialog) = self.dialog.as_mut() {
                dialog.error = Some(EMPTY_TEXT_ERROR.to_owned());
                dialog.field = DialogField::Text;
            }
            return;
        };

        self.close_dialog();
        self.toast = Some(Toast::info(match target {
            DialogTarget::New => format!("Added: {}", task.text),
            DialogTarget::Existing { .. } => format!("Saved: {}", task.text),
        }));
        self.select_id(&task.id);
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if let Some(task) = self.mutate(|store| store.toggle_completed(&id)) {
            let state = if task.completed { "completed" } else { "active" };
            self.toast = Some(Toast::info(format!("Marked {state}: {}", task.text)));
        }
        self.clamp_selection();
    }

    fn request_delete(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let id = task.id.clone();
        if !self.cfg.ui.confirm_delete {
            self.delete_task(&id);
            return;
        }
        self.confirm = Some(ConfirmDialog {
            title: "Delete task".to_owned(),
            message: format!("Delete \"{}\"?", task.text),
            yes_label: "Delete".to_owned(),
            no_label: "Cancel".to_owned(),
            action: ConfirmAction::DeleteTask { id },
        });
        self.mode = Mode::Confirm;
    }

    fn delete_task(&mut self, id: &str) {
        let text = self.store.get(id).map(|t| t.text.clone());
        if self.mutate(|store| store.remove(id))
            && let Some(text) = text
        {
            self.toast = Some(Toast::info(format!("Deleted: {text}")));
        }
        self.clamp_selection();
    }

    fn clear_completed(&mut self) {
        let removed = self.mutate(TaskStore::clear_completed);
        self.toast = Some(Toast::info(match removed {
            0 => "No completed tasks.".to_owned(),
            1 => "Cleared 1 completed task.".to_owned(),
            n => format!("Cleared {n} completed tasks."),
        }));
        self.clamp_selection();
    }

    fn toggle_theme(&mut self) {
        let dark = self.mutate(TaskStore::toggle_dark_mode);
        self.toast = Some(Toast::info(if dark { "Dark mode" } else { "Light mode" }));
    }
}

fn memory_only_message() -> String {
    "storage unavailable: changes are kept in memory only".to_owned()
}

pub fn run(cfg: Config, store: TaskStore<FileStore>) -> anyhow::Result<()> {
    let terminal = tui::init_terminal()?;
    let mut guard = TerminalGuard::new(terminal);

    let mut app = AppState::new(cfg, store);
    tracing::debug!(tasks = app.store.len(), "tui started");

    loop {
        if let Some(toast) = &app.toast
            && Instant::now() >= toast.until
        {
            app.toast = None;
        }

        guard.terminal_mut()?.draw(|f| draw(f, &mut app))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(key, &mut app);
        }
    }

    Ok(())
}

fn handle_key<S: KeyValueStore>(key: KeyEvent, app: &mut AppState<S>) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.mode {
        Mode::Normal => handle_normal_key(key, app),
        Mode::Searching => handle_search_key(key, app),
        Mode::Dialog => handle_dialog_key(key, app),
        Mode::Confirm => handle_confirm_key(key, app),
        Mode::Help => app.mode = Mode::Normal,
    }
}

fn handle_normal_key<S: KeyValueStore>(key: KeyEvent, app: &mut AppState<S>) {
    app.last_error = None;
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => {
            if app.view.search.is_empty() {
                app.should_quit = true;
            } else {
                app.search.set("");
                app.sync_search();
            }
        }
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::PageDown => app.move_selection(10),
        KeyCode::PageUp => app.move_selection(-10),
        KeyCode::Home | KeyCode::Char('g') => app.move_selection(isize::MIN),
        KeyCode::End | KeyCode::Char('G') => app.move_selection(isize::MAX),
        KeyCode::Char('a' | 'n') => app.open_add_dialog(),
        KeyCode::Enter | KeyCode::Char('e') => app.open_edit_dialog(),
        KeyCode::Char(' ' | 'x') => app.toggle_selected(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('C') => app.clear_completed(),
        KeyCode::Char('/') => app.mode = Mode::Searching,
        KeyCode::Char('1') => app.set_filter(Filter::All),
        KeyCode::Char('2') => app.set_filter(Filter::Active),
        KeyCode::Char('3') => app.set_filter(Filter::Completed),
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
            app.set_filter(app.view.filter.next());
        }
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
            app.set_filter(app.view.filter.prev());
        }
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('?') => app.mode = Mode::Help,
        _ => {}
    }
}

fn handle_search_key<S: KeyValueStore>(key: KeyEvent, app: &mut AppState<S>) {
    match key.code {
        KeyCode::Enter => app.mode = Mode::Normal,
        KeyCode::Esc => {
            app.search.set("");
            app.sync_search();
            app.mode = Mode::Normal;
        }
        _ => {
            handle_text_input_key(key, &mut app.search);
            app.sync_search();
        }
    }
}

fn handle_dialog_key<S: KeyValueStore>(key: KeyEvent, app: &mut AppState<S>) {
    if is_newline_key(key)
        && let Some(dialog) = app.dialog.as_mut()
        && dialog.field == DialogField::Notes
    {
        dialog.notes.insert_char('\n');
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.close_dialog();
            return;
        }
        KeyCode::Enter => {
            app.submit_dialog();
            return;
        }
        _ => {}
    }

    let Some(dialog) = app.dialog.as_mut() else {
        app.mode = Mode::Normal;
        return;
    };

    match key.code {
        KeyCode::Tab | KeyCode::Down => dialog.next_field(),
        KeyCode::BackTab | KeyCode::Up => dialog.prev_field(),
        _ => match dialog.field {
            DialogField::Text => {
                handle_text_input_key(key, &mut dialog.text);
                dialog.error = None;
            }
            DialogField::Priority => match key.code {
                KeyCode::Char(' ') | KeyCode::Right => dialog.priority = dialog.priority.next(),
                KeyCode::Left => {
                    dialog.priority = dialog.priority.next().next();
                }
                KeyCode::Char(c) => {
                    if let Some(p) = Priority::ALL
                        .into_iter()
                        .find(|p| p.as_str().starts_with(c.to_ascii_lowercase()))
                    {
                        dialog.priority = p;
                    }
                }
                _ => {}
            },
            DialogField::Category => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(' ')
                {
                    dialog.cycle_category();
                } else {
                    handle_text_input_key(key, &mut dialog.category);
                }
            }
            DialogField::Notes => handle_text_input_key(key, &mut dialog.notes),
        },
    }
}

/// Ctrl-J or Alt-Enter; plain Enter submits the dialog.
fn is_newline_key(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => key.modifiers.contains(KeyModifiers::ALT),
        KeyCode::Char('j') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn handle_confirm_key<S: KeyValueStore>(key: KeyEvent, app: &mut AppState<S>) {
    let accept = matches!(key.code, KeyCode::Char('y' | 'Y') | KeyCode::Enter);
    let reject = matches!(key.code, KeyCode::Char('n' | 'N') | KeyCode::Esc);
    if !accept && !reject {
        return;
    }
    let confirm = app.confirm.take();
    app.mode = Mode::Normal;
    if !accept {
        return;
    }
    if let Some(ConfirmDialog {
        action: ConfirmAction::DeleteTask { id },
        ..
    }) = confirm
    {
        app.delete_task(&id);
    }
}

fn handle_text_input_key(key: KeyEvent, input: &mut TextInput) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Char(c) => {
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT)
            {
                input.insert_char(c);
            }
        }
        _ => {}
    }
}

fn draw<S: KeyValueStore>(f: &mut Frame<'_>, app: &mut AppState<S>) {
    let area = f.area();
    let palette = app.palette();
    f.render_widget(Block::default().style(palette.base()), area);

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(f, root[0], app, &palette);
    draw_filters(f, root[1], app, &palette);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(root[2]);
    draw_task_table(f, body[0], app, &palette);
    draw_task_detail(f, body[1], app, &palette);

    draw_footer(f, root[3], app, &palette);

    if let Some(dialog) = &app.dialog {
        draw_task_dialog(f, dialog, &palette);
    }
    if let Some(confirm) = &app.confirm {
        draw_confirm(f, confirm, &palette);
    }
    if app.mode == Mode::Help {
        draw_help(f, &palette);
    }
}

fn draw_header<S: KeyValueStore>(f: &mut Frame<'_>, area: Rect, app: &AppState<S>, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let counters = Counters::from_tasks(app.store.snapshot_all());
    let mut spans = vec![
        Span::styled(
            "taskpad ",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(output::format_counters(&counters)),
    ];
    if app.store.persistence() == Persistence::MemoryOnly {
        spans.push(Span::styled("  [memory only]", Style::default().fg(p.error)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

    let dir = app
        .store
        .kv()
        .location()
        .unwrap_or_else(|| "-".to_owned());
    let dir = if app.cfg.ui.tilde_home {
        config::tilde_path(&dir)
    } else {
        dir
    };
    let theme = if app.store.dark_mode() { "dark" } else { "light" };
    f.render_widget(
        Paragraph::new(Line::from(format!("{theme} • {dir}")))
            .style(p.muted())
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_filters<S: KeyValueStore>(f: &mut Frame<'_>, area: Rect, app: &AppState<S>, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let counters = Counters::from_tasks(app.store.snapshot_all());
    let titles: Vec<Line> = Filter::ALL
        .iter()
        .enumerate()
        .map(|(i, filter)| {
            let count = match filter {
                Filter::All => counters.total,
                Filter::Active => counters.active,
                Filter::Completed => counters.completed,
            };
            Line::from(format!(
                "{} ({count}) [{}]",
                output::capitalize(filter.as_str()),
                i + 1
            ))
        })
        .collect();
    let selected = Filter::ALL
        .iter()
        .position(|x| *x == app.view.filter)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(p.muted())
        .highlight_style(p.highlight())
        .divider(" | ");
    f.render_widget(tabs, chunks[0]);

    let searching = app.mode == Mode::Searching;
    if searching || !app.search.as_str().is_empty() {
        let style = if searching {
            Style::default().fg(p.accent)
        } else {
            p.muted()
        };
        let prefix = "Search: ";
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(prefix, style.add_modifier(Modifier::BOLD)),
                Span::styled(app.search.as_str(), style),
            ])),
            chunks[1],
        );
        if searching {
            let offset = u16::try_from(prefix.len() + app.search.cursor).unwrap_or(u16::MAX);
            f.set_cursor_position((chunks[1].x.saturating_add(offset), chunks[1].y));
        }
    }
}

fn draw_task_table<S: KeyValueStore>(
    f: &mut Frame<'_>,
    area: Rect,
    app: &mut AppState<S>,
    p: &Palette,
) {
    let block = Block::default().borders(Borders::ALL).title("Tasks");
    let icons = app.cfg.ui.icons;
    let visible = app.view.visible(app.store.snapshot_all());

    if visible.is_empty() {
        let message = if app.store.is_empty() {
            "No tasks yet. Press 'a' to add one."
        } else {
            "No tasks match the current filter."
        };
        f.render_widget(
            Paragraph::new(message)
                .style(p.muted())
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let headers = Row::new(vec!["", "PRIO", "CATEGORY", "TASK"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = visible
        .iter()
        .map(|t| {
            let done = if icons {
                output::completion_icon(t).to_owned()
            } else if t.completed {
                "[x]".to_owned()
            } else {
                "[ ]".to_owned()
            };
            let prio = if icons {
                format!("{} {}", output::priority_icon(t.priority), t.priority)
            } else {
                t.priority.to_string()
            };
            let mut text = t.text.clone();
            if t.has_notes() {
                text.push_str(if icons { " ✎" } else { " (notes)" });
            }
            let text_style = if t.completed {
                p.completed()
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(done),
                Cell::from(prio).style(p.priority(t.priority)),
                Cell::from(t.category.to_string()),
                Cell::from(text).style(text_style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        vec![
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(headers)
    .block(block)
    .row_highlight_style(p.highlight())
    .highlight_symbol("▸ ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_task_detail<S: KeyValueStore>(
    f: &mut Frame<'_>,
    area: Rect,
    app: &AppState<S>,
    p: &Palette,
) {
    let block = Block::default().borders(Borders::ALL).title("Details");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(t) = app.selected_task() else {
        f.render_widget(
            Paragraph::new("Nothing selected.")
                .style(p.muted())
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    };

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(t.text.as_str(), bold)),
        Line::from(""),
        Line::from(format!(
            "Status:   {}",
            if t.completed { "completed" } else { "active" }
        )),
        Line::from(vec![
            Span::raw("Priority: "),
            Span::styled(output::capitalize(t.priority.as_str()), p.priority(t.priority)),
        ]),
        Line::from(format!(
            "Category: {}",
            output::capitalize(t.category.as_str())
        )),
        Line::from(format!("Created:  {}", t.created_at)),
        Line::from(Span::styled(format!("ID:       {}", t.id), p.muted())),
        Line::from(""),
        Line::from(Span::styled("Notes", bold)),
    ];
    if t.has_notes() {
        lines.extend(t.notes.lines().map(|l| Line::from(l.to_owned())));
    } else {
        lines.push(Line::from(Span::styled("-", p.muted())));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_footer<S: KeyValueStore>(f: &mut Frame<'_>, area: Rect, app: &AppState<S>, p: &Palette) {
    let line = if let Some(err) = app.last_error.as_deref() {
        Line::from(vec![
            Span::styled("Error: ", Style::default().fg(p.error).add_modifier(Modifier::BOLD)),
            Span::styled(err, Style::default().fg(p.error)),
        ])
    } else if let Some(toast) = &app.toast {
        Line::from(Span::styled(toast.message.as_str(), Style::default().fg(p.accent)))
    } else {
        let hint = match app.mode {
            Mode::Normal => {
                "a add • enter edit • space toggle • d delete • C clear done • / search • 1-3 filter • t theme • ? help • q quit"
            }
            Mode::Searching => "type to search • enter keep • esc clear",
            Mode::Dialog => "tab next field • ctrl-j newline in notes • enter save • esc cancel",
            Mode::Confirm => "y confirm • n cancel",
            Mode::Help => "any key closes help",
        };
        Line::from(Span::styled(hint, p.muted()))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_task_dialog(f: &mut Frame<'_>, dialog: &TaskDialog, p: &Palette) {
    let area = centered_rect(70, 50, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(dialog.title())
        .style(p.base());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let label = Style::default().add_modifier(Modifier::BOLD);
    let active = Style::default().fg(p.accent).add_modifier(Modifier::BOLD);
    let style_for = |field: DialogField| {
        if dialog.field == field {
            active
        } else {
            Style::default()
        }
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Text:     ", label),
            Span::styled(dialog.text.as_str(), style_for(DialogField::Text)),
        ]),
        Line::from(vec![
            Span::styled("Priority: ", label),
            Span::styled(dialog.priority.as_str(), style_for(DialogField::Priority)),
            Span::styled("  (space to cycle)", p.muted()),
        ]),
        Line::from(vec![
            Span::styled("Category: ", label),
            Span::styled(dialog.category.as_str(), style_for(DialogField::Category)),
            Span::styled(
                format!("  (ctrl-space: {})", Category::PRESETS.join("/")),
                p.muted(),
            ),
        ]),
    ];
    if matches!(dialog.target, DialogTarget::Existing { .. }) {
        // One glyph per line break keeps the cursor column in step with the text.
        let notes = dialog.notes.as_str().replace('\n', "⏎");
        lines.push(Line::from(vec![
            Span::styled("Notes:    ", label),
            Span::styled(notes, style_for(DialogField::Notes)),
        ]));
    }

    if let Some(err) = dialog.error.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(p.error).add_modifier(Modifier::BOLD),
            ),
            Span::styled(err, Style::default().fg(p.error)),
        ]));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    let cursor_line = match dialog.field {
        DialogField::Text => Some((0u16, dialog.text.cursor)),
        DialogField::Category => Some((2, dialog.category.cursor)),
        DialogField::Notes => Some((3, dialog.notes.cursor)),
        DialogField::Priority => None,
    };
    if let Some((row, cursor)) = cursor_line {
        let offset = u16::try_from("Text:     ".len() + cursor).unwrap_or(u16::MAX);
        f.set_cursor_position((
            inner.x.saturating_add(offset),
            inner.y.saturating_add(row),
        ));
    }
}

fn draw_confirm(f: &mut Frame<'_>, confirm: &ConfirmDialog, p: &Palette) {
    let area = centered_rect(60, 25, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(confirm.title.as_str())
        .style(p.base());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from(confirm.message.clone()),
        Line::from(""),
        Line::from(format!(
            "[y] {}    [n] {}",
            confirm.yes_label, confirm.no_label
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn draw_help(f: &mut Frame<'_>, p: &Palette) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .style(p.base());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let keys = [
        ("a / n", "add a task"),
        ("enter / e", "edit details and notes"),
        ("ctrl-j", "line break in notes"),
        ("space / x", "toggle completed"),
        ("d / del", "delete task"),
        ("C", "clear completed tasks"),
        ("/", "search text and notes"),
        ("1 2 3", "all / active / completed"),
        ("tab / ← →", "cycle filter"),
        ("j k / ↑ ↓", "move selection"),
        ("t", "toggle dark mode"),
        ("q / esc", "quit"),
    ];
    let lines: Vec<Line> = keys
        .iter()
        .map(|(k, v)| {
            Line::from(vec![
                Span::styled(
                    format!("{k:<12}"),
                    Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*v),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
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
