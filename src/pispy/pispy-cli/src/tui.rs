//! Interactive TUI for pispy.
//!
//! A thin mapper from the controller's state to the screen: the lookup
//! pipeline produces [`DisplaySection`]s, this module paints them and turns
//! key presses into lookups.

use crate::assemble::LookupView;
use crate::display::{EMPTY_PLACEHOLDER, RowKind, group_thousands};
use crate::lookup::{LookupController, LookupState};
use crate::registry::{FetchError, Registry};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use pispy_data::TopPackages;
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::warn;

// ============================================================================
// Public entry point
// ============================================================================

/// Run the TUI, optionally starting with a lookup of `initial`.
pub fn run<R: Registry>(registry: R, runtime: Handle, initial: Option<String>) -> Result<()> {
    let mut app = App::new(LookupController::new(registry, runtime.clone()), runtime);
    if let Some(name) = initial {
        app.input.set(&name);
        app.submit();
    }
    app.run()
}

// ============================================================================
// App state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Lookup,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Results,
}

/// Something in the results that Enter acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// Open in the browser.
    Link(String),
    /// Look this package up.
    Package(String),
}

/// Activatable items of a view, in display order.
fn targets(view: &LookupView) -> Vec<Target> {
    let mut targets = Vec::new();
    for row in view.sections.iter().flat_map(|s| &s.rows) {
        if row.kind == RowKind::Link {
            targets.push(Target::Link(row.value.clone()));
        }
        targets.extend(row.references.iter().cloned().map(Target::Package));
    }
    targets
}

/// Single-line text input; `cursor` counts characters, not bytes.
#[derive(Debug, Default)]
struct InputField {
    value: String,
    cursor: usize,
}

impl InputField {
    fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn insert(&mut self, c: char) {
        let at = self.byte_index();
        self.value.insert(at, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    fn home(&mut self) {
        self.cursor = 0;
    }

    fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }
}

enum StatsState {
    NotLoaded,
    Loading(oneshot::Receiver<Result<TopPackages, FetchError>>),
    Loaded {
        stats: TopPackages,
        list_state: ListState,
    },
    Failed(String),
}

struct App<R> {
    controller: LookupController<R>,
    runtime: Handle,
    screen: Screen,
    focus: Focus,
    input: InputField,
    /// Index into `targets()` of the committed view.
    selected: usize,
    scroll: u16,
    /// Scroll the selection into view on the next render.
    follow_selection: bool,
    stats: StatsState,
    status: Option<String>,
    should_quit: bool,
    pending_url: Option<String>,
}

/// Advance or retreat a wrapping index within `0..count`.
fn wrapping_nav(index: &mut usize, count: usize, forward: bool) {
    if count > 0 {
        *index = if forward {
            (*index + 1) % count
        } else {
            (*index + count - 1) % count
        };
    }
}

/// Clamped (non-wrapping) movement on a `ListState` within `0..count`.
fn list_nav(state: &mut ListState, count: usize, forward: bool) {
    if let Some(selected) = state.selected() {
        if forward {
            if selected < count.saturating_sub(1) {
                state.select(Some(selected + 1));
            }
        } else if selected > 0 {
            state.select(Some(selected - 1));
        }
    }
}

fn wait_for_enter() {
    // ratatui::restore() leaves the alternate screen but does not re-show
    // the cursor.
    let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);
    println!("\nPress Enter to return to pispy...");
    let _ = std::io::stdin().read_line(&mut String::new());
}

// ============================================================================
// App implementation
// ============================================================================

impl<R: Registry> App<R> {
    fn new(controller: LookupController<R>, runtime: Handle) -> Self {
        Self {
            controller,
            runtime,
            screen: Screen::Lookup,
            focus: Focus::Input,
            input: InputField::default(),
            selected: 0,
            scroll: 0,
            follow_selection: false,
            stats: StatsState::NotLoaded,
            status: None,
            should_quit: false,
            pending_url: None,
        }
    }

    fn run(mut self) -> Result<()> {
        // Restore the terminal before the panic message is printed.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = ratatui::try_restore();
            let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_inner();

        ratatui::restore();
        let _ = crossterm::execute!(std::io::stdout(), crossterm::cursor::Show);
        let _ = std::panic::take_hook();

        result
    }

    fn run_inner(&mut self) -> Result<()> {
        let mut terminal = ratatui::init();

        loop {
            self.poll_background();

            terminal.draw(|frame| self.render(frame))?;

            if let Some(url) = self.pending_url.take() {
                ratatui::restore();
                if let Err(e) = open::that(&url) {
                    warn!(%url, error = %e, "failed to open browser");
                    println!("Failed to open browser: {}", e);
                    println!("URL: {}", url);
                    wait_for_enter();
                }
                terminal = ratatui::init();
                continue;
            }

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
            {
                // Windows compatibility: only handle Press events
                if key.kind == KeyEventKind::Press {
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        break;
                    }
                    self.handle_key(key.code);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Pick up finished lookups and stats loads.
    fn poll_background(&mut self) {
        if self.controller.poll_completions() {
            self.selected = 0;
            self.scroll = 0;
            self.follow_selection = false;
        }
        self.poll_stats();
    }

    fn poll_stats(&mut self) {
        let StatsState::Loading(rx) = &mut self.stats else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(stats)) => {
                let mut list_state = ListState::default();
                if !stats.packages.is_empty() {
                    list_state.select(Some(0));
                }
                self.stats = StatsState::Loaded { stats, list_state };
            }
            Ok(Err(e)) => self.stats = StatsState::Failed(e.to_string()),
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.stats = StatsState::Failed("stats request was cancelled".to_string());
            }
        }
    }

    fn start_stats(&mut self) {
        let (tx, rx) = oneshot::channel();
        let registry = Arc::clone(self.controller.registry());
        self.runtime.spawn(async move {
            let _ = tx.send(registry.top_packages().await);
        });
        self.stats = StatsState::Loading(rx);
    }

    /// Look up whatever is in the input box.
    fn submit(&mut self) {
        if self.controller.request(&self.input.value) {
            self.status = None;
        }
    }

    /// Follow a cross-reference: show the name in the input and look it up.
    fn lookup(&mut self, package: &str) {
        self.input.set(package);
        self.submit();
    }

    fn current_targets(&self) -> Vec<Target> {
        self.controller.committed().map(targets).unwrap_or_default()
    }

    fn activate_selected(&mut self) {
        match self.current_targets().get(self.selected).cloned() {
            Some(Target::Link(url)) => self.pending_url = Some(url),
            Some(Target::Package(name)) => self.lookup(&name),
            None => {}
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::F(2) => {
                self.toggle_stats();
                return;
            }
            _ => {}
        }

        match (self.screen, self.focus) {
            (Screen::Stats, _) => self.handle_stats_key(key),
            (Screen::Lookup, Focus::Input) => self.handle_input_key(key),
            (Screen::Lookup, Focus::Results) => self.handle_results_key(key),
        }
    }

    fn toggle_stats(&mut self) {
        self.screen = match self.screen {
            Screen::Lookup => {
                if matches!(self.stats, StatsState::NotLoaded | StatsState::Failed(_)) {
                    self.start_stats();
                }
                Screen::Stats
            }
            Screen::Stats => Screen::Lookup,
        };
    }

    fn handle_input_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => self.submit(),
            KeyCode::Tab | KeyCode::Down => self.focus = Focus::Results,
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.left(),
            KeyCode::Right => self.input.right(),
            KeyCode::Home => self.input.home(),
            KeyCode::End => self.input.end(),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Tab | KeyCode::Char('/') => self.focus = Focus::Input,
            KeyCode::Down | KeyCode::Char('j') => {
                let count = self.current_targets().len();
                wrapping_nav(&mut self.selected, count, true);
                self.follow_selection = true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let count = self.current_targets().len();
                wrapping_nav(&mut self.selected, count, false);
                self.follow_selection = true;
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Enter => self.activate_selected(),
            _ => {}
        }
    }

    fn handle_stats_key(&mut self, key: KeyCode) {
        enum Action {
            None,
            Lookup(String),
            Retry,
        }

        let action = match &mut self.stats {
            StatsState::Loaded { stats, list_state } => match key {
                KeyCode::Down | KeyCode::Char('j') => {
                    list_nav(list_state, stats.packages.len(), true);
                    Action::None
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    list_nav(list_state, stats.packages.len(), false);
                    Action::None
                }
                KeyCode::Enter => list_state
                    .selected()
                    .and_then(|i| stats.packages.get(i))
                    .map_or(Action::None, |p| Action::Lookup(p.name.clone())),
                _ => Action::None,
            },
            StatsState::Failed(_) if matches!(key, KeyCode::Enter | KeyCode::Char('r')) => {
                Action::Retry
            }
            _ => Action::None,
        };

        match action {
            Action::Lookup(name) => {
                self.screen = Screen::Lookup;
                self.lookup(&name);
            }
            Action::Retry => self.start_stats(),
            Action::None => {}
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    fn render(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Lookup => self.render_lookup(frame),
            Screen::Stats => render_stats(frame, &mut self.stats),
        }
    }

    fn render_lookup(&mut self, frame: &mut Frame) {
        let [input_area, main, footer] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        // Input
        let input_focused = self.focus == Focus::Input;
        frame.render_widget(
            Paragraph::new(self.input.value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Package ")
                    .border_style(focus_style(input_focused)),
            ),
            input_area,
        );
        if input_focused {
            let cursor_x = u16::try_from(self.input.cursor).unwrap_or(u16::MAX);
            frame.set_cursor_position(Position::new(
                input_area.x.saturating_add(1).saturating_add(cursor_x),
                input_area.y + 1,
            ));
        }

        // Results
        match self.controller.state() {
            LookupState::Idle => render_centered(
                frame,
                main,
                "Type the name of a PyPI package and press Enter",
                Style::default().fg(Color::DarkGray),
            ),
            LookupState::Loading { package, .. } => render_centered(
                frame,
                main,
                &format!("Looking up {package}..."),
                Style::default().fg(Color::Cyan),
            ),
            LookupState::Committed(view) => {
                let results_focused = self.focus == Focus::Results;
                let selected = results_focused.then_some(self.selected);
                let width = main.width.saturating_sub(2) as usize;
                let height = main.height.saturating_sub(2);
                let (lines, selected_line) = view_lines(view, width, selected);

                if self.follow_selection
                    && let Some(line) = selected_line
                {
                    let line = u16::try_from(line).unwrap_or(u16::MAX);
                    if line < self.scroll {
                        self.scroll = line;
                    } else if line >= self.scroll.saturating_add(height) {
                        self.scroll = line.saturating_add(1).saturating_sub(height);
                    }
                    self.follow_selection = false;
                }
                let max_scroll = u16::try_from(lines.len())
                    .unwrap_or(u16::MAX)
                    .saturating_sub(height);
                self.scroll = self.scroll.min(max_scroll);

                let title = format!(" {} ", view.package_name);
                frame.render_widget(
                    Paragraph::new(lines)
                        .block(
                            Block::default()
                                .borders(Borders::ALL)
                                .title(title)
                                .border_style(focus_style(results_focused)),
                        )
                        .scroll((self.scroll, 0)),
                    main,
                );
            }
        }

        // Footer
        let (text, style) = match &self.status {
            Some(status) => (status.clone(), Style::default().fg(Color::Red)),
            None => {
                let hint = match self.focus {
                    Focus::Input => "Enter Look up | Tab Results | F2 Top packages | Esc Quit",
                    Focus::Results => {
                        "↑↓/jk Navigate | Enter Open/Look up | PgUp/PgDn Scroll | Tab Input | F2 Top packages | Esc Quit"
                    }
                };
                (hint.to_string(), Style::default().fg(Color::DarkGray))
            }
        };
        frame.render_widget(Paragraph::new(text).style(style).centered(), footer);
    }
}

// ============================================================================
// Screen renderers
// ============================================================================

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_centered(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    let block = Block::default().borders(Borders::ALL).border_style(focus_style(false));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let vertical = Layout::vertical([Constraint::Length(1)]).flex(Flex::Center);
    let [center] = vertical.areas(inner);
    frame.render_widget(Paragraph::new(message).style(style).centered(), center);
}

fn render_stats(frame: &mut Frame, state: &mut StatsState) {
    let [header, main, footer] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new("Top Packages by Size")
            .style(Style::default().bold())
            .centered(),
        header,
    );

    match state {
        StatsState::NotLoaded | StatsState::Loading(_) => render_centered(
            frame,
            main,
            "Loading package stats...",
            Style::default().fg(Color::Cyan),
        ),
        StatsState::Failed(message) => render_centered(
            frame,
            main,
            &format!("Could not load stats: {message} (Enter or r to retry)"),
            Style::default().fg(Color::Red),
        ),
        StatsState::Loaded { stats, list_state } => {
            let width = stats
                .packages
                .iter()
                .map(|p| group_thousands(p.size).len())
                .max()
                .unwrap_or(0);
            let items: Vec<ListItem> = stats
                .packages
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{:>3}. ", i + 1), Style::default().fg(Color::DarkGray)),
                        Span::styled(
                            format!("{:>width$}", group_thousands(p.size)),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::raw("  "),
                        Span::styled(p.name.clone(), Style::default().fg(Color::Green).bold()),
                    ]))
                })
                .collect();

            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" Total: {} ", group_thousands(stats.total_size))),
                )
                .highlight_style(
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, main, list_state);
        }
    }

    frame.render_widget(
        Paragraph::new("↑↓/jk Navigate | Enter Look up | F2 Back | Esc Quit")
            .style(Style::default().fg(Color::DarkGray))
            .centered(),
        footer,
    );
}

/// Lay a view out as pre-wrapped lines. Also returns the line holding the
/// selected target, if any.
fn view_lines(
    view: &LookupView,
    width: usize,
    selected: Option<usize>,
) -> (Vec<Line<'static>>, Option<usize>) {
    let text_width = width.saturating_sub(2).max(8);
    let title_style = if view.found {
        Style::default().fg(Color::Black).bg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::White).bg(Color::Red).bold()
    };

    let mut lines = Vec::new();
    let mut target_index = 0;
    let mut selected_line = None;

    for section in &view.sections {
        lines.push(Line::styled(format!(" {} ", section.title), title_style));

        for row in &section.rows {
            lines.push(Line::styled(format!("{}:", row.label), Style::default().bold()));

            if row.kind == RowKind::Link {
                let is_selected = selected == Some(target_index);
                if is_selected {
                    selected_line = Some(lines.len());
                }
                for chunk in wrap(&row.value, text_width) {
                    lines.push(Line::styled(format!("  {chunk}"), target_style(is_selected, Color::Blue)));
                }
                target_index += 1;
            } else if !row.references.is_empty() {
                let mut spans = vec![Span::raw("  ")];
                let mut used = 0;
                for (i, name) in row.references.iter().enumerate() {
                    let separator = if i + 1 < row.references.len() { ", " } else { "" };
                    let needed = name.chars().count() + separator.len();
                    if used > 0 && used + needed > text_width {
                        lines.push(Line::from(std::mem::replace(&mut spans, vec![Span::raw("  ")])));
                        used = 0;
                    }
                    let is_selected = selected == Some(target_index);
                    if is_selected {
                        selected_line = Some(lines.len());
                    }
                    spans.push(Span::styled(name.clone(), target_style(is_selected, Color::Green)));
                    if !separator.is_empty() {
                        spans.push(Span::raw(separator));
                    }
                    used += needed;
                    target_index += 1;
                }
                lines.push(Line::from(spans));
            } else if row.kind == RowKind::LongText {
                lines.extend(markdown_lines(&row.value, text_width));
            } else if row.value == EMPTY_PLACEHOLDER {
                lines.push(Line::styled(
                    format!("  {EMPTY_PLACEHOLDER}"),
                    Style::default().fg(Color::DarkGray),
                ));
            } else {
                for line in row.value.lines() {
                    for chunk in wrap(line, text_width) {
                        lines.push(Line::raw(format!("  {chunk}")));
                    }
                }
            }
        }
        lines.push(Line::raw(""));
    }

    (lines, selected_line)
}

fn target_style(selected: bool, color: Color) -> Style {
    if selected {
        Style::default().fg(Color::Black).bg(Color::Cyan).bold()
    } else {
        Style::default().fg(color).add_modifier(Modifier::UNDERLINED)
    }
}

/// Light markdown styling: headings, fenced code, bullets and quotes.
fn markdown_lines(text: &str, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_code = !in_code;
            lines.push(Line::styled(format!("  {raw}"), Style::default().fg(Color::DarkGray)));
            continue;
        }

        let (body, style) = if in_code {
            (raw.to_string(), Style::default().fg(Color::Yellow))
        } else if trimmed.starts_with('#') {
            (
                trimmed.trim_start_matches('#').trim_start().to_string(),
                Style::default().fg(Color::Cyan).bold(),
            )
        } else if let Some(item) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
            let indent = raw.len() - trimmed.len();
            (format!("{}• {item}", " ".repeat(indent)), Style::default())
        } else if trimmed.starts_with('>') {
            (raw.to_string(), Style::default().add_modifier(Modifier::ITALIC))
        } else {
            (raw.to_string(), Style::default())
        };

        for chunk in wrap(&body, width) {
            lines.push(Line::styled(format!("  {chunk}"), style));
        }
    }

    lines
}

/// Greedy word wrap to `width` columns; words longer than a line are split.
/// An empty input gives one empty line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut len = 0;

    for word in text.split_inclusive(' ') {
        let visible = word.trim_end_matches(' ').chars().count();
        if len > 0 && len + visible > width {
            out.push(current.trim_end().to_string());
            current.clear();
            len = 0;
        }
        for ch in word.chars() {
            if len >= width {
                if ch == ' ' {
                    continue;
                }
                out.push(current.trim_end().to_string());
                current.clear();
                len = 0;
            }
            current.push(ch);
            len += 1;
        }
    }

    if !current.is_empty() || out.is_empty() {
        out.push(current.trim_end().to_string());
    }
    out
}
