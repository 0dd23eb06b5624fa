//! Full-screen terminal interface built on ratatui.
//!
//! # Layout
//! Title, a scrolling body that collects everything the app shows, an input
//! box for the active prompt, and a status line.
//!
//! # Input
//! Raw mode is on for the lifetime of `TuiInterface`. Ctrl-C at any prompt is
//! reported to the caller as an interrupt. A terminal resize only marks the
//! screen for redraw.

use crate::app::{Console, FilterInput, Tone, percentage_tone};
use crate::quiz::MarkedChar;
use crate::stats::StatsSummary;
use crate::{debug_log, info_log};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use std::io;
use std::time::Duration;

const EVENT_POLL_TIMEOUT_MS: u64 = 100;
const MAX_SCROLLBACK: usize = 500;
const PROGRESS_BAR_WIDTH: usize = 40;
const ASCII_CONTROL_CHAR_THRESHOLD: u32 = 32;

const HEADER_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
const HEADING_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
const MENU_STYLE: Style = Style::new().fg(Color::Cyan);
const WORD_STYLE: Style = Style::new().fg(Color::Green);
const INPUT_STYLE: Style = Style::new().fg(Color::White);
const ERROR_STYLE: Style = Style::new().fg(Color::Red);
const MISTAKE_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);
const EMPTY_CELL_STYLE: Style = Style::new().fg(Color::DarkGray);

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Info => Style::new().fg(Color::Cyan),
        Tone::Success => Style::new().fg(Color::Green),
        Tone::Warning => Style::new().fg(Color::Yellow),
        Tone::Error => ERROR_STYLE.add_modifier(Modifier::BOLD),
        Tone::Accent => Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Idle,
    Line,
    Filter,
}

/// Effect of one key press on a line being typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKey {
    Edited,
    Submit,
    Interrupt,
    Ignored,
}

/// Meaning of one key press in the filter view.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterKey {
    Input(FilterInput),
    Interrupt,
    Ignored,
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c' | 'C'))
}

fn has_command_modifier(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT)
}

fn apply_line_key(input: &mut String, key: &KeyEvent) -> LineKey {
    if is_interrupt(key) {
        return LineKey::Interrupt;
    }
    match key.code {
        KeyCode::Enter => LineKey::Submit,
        KeyCode::Backspace => {
            if input.pop().is_some() {
                LineKey::Edited
            } else {
                LineKey::Ignored
            }
        }
        KeyCode::Char(c) if !has_command_modifier(key) => {
            input.push(c);
            LineKey::Edited
        }
        _ => LineKey::Ignored,
    }
}

fn filter_key(key: &KeyEvent) -> FilterKey {
    if is_interrupt(key) {
        return FilterKey::Interrupt;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u' | 'U') if ctrl => FilterKey::Input(FilterInput::Clear),
        KeyCode::Delete => FilterKey::Input(FilterInput::Clear),
        KeyCode::Backspace => FilterKey::Input(FilterInput::Backspace),
        KeyCode::Enter | KeyCode::Esc => FilterKey::Input(FilterInput::Done),
        KeyCode::Char(c) if !has_command_modifier(key) => {
            FilterKey::Input(FilterInput::Chars(c.to_string()))
        }
        _ => FilterKey::Ignored,
    }
}

/// Garbage that terminals emit around focus changes.
fn is_noise(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) => {
            c == '\u{FFFD}' || ((c as u32) < ASCII_CONTROL_CHAR_THRESHOLD && c != '\t')
        }
        _ => false,
    }
}

/// Number of lines to skip so the tail of `len` lines fits in `height`.
fn tail_offset(len: usize, height: u16) -> u16 {
    u16::try_from(len.saturating_sub(usize::from(height))).unwrap_or(u16::MAX)
}

fn progress_line(done: usize, total: usize) -> Line<'static> {
    let fraction = if total == 0 {
        0.0
    } else {
        done as f64 / total as f64
    };
    let filled = ((fraction * PROGRESS_BAR_WIDTH as f64) as usize).min(PROGRESS_BAR_WIDTH);
    let mut spans = vec![Span::raw("[")];
    for i in 0..PROGRESS_BAR_WIDTH {
        if i < filled {
            let color = if i < PROGRESS_BAR_WIDTH / 3 {
                Color::Red
            } else if i < PROGRESS_BAR_WIDTH * 2 / 3 {
                Color::Yellow
            } else {
                Color::Green
            };
            spans.push(Span::styled("█", Style::new().fg(color)));
        } else {
            spans.push(Span::styled("─", EMPTY_CELL_STYLE));
        }
    }
    spans.push(Span::raw("] "));
    spans.push(Span::styled(
        format!("{:.1}%", fraction * 100.0),
        Style::new().fg(Color::Cyan),
    ));
    Line::from(spans)
}

fn marked_answer_line(marks: &[MarkedChar]) -> Line<'static> {
    let mut spans = vec![Span::raw("Your answer: ")];
    spans.extend(marks.iter().map(|mark| {
        let style = if mark.correct {
            WORD_STYLE
        } else {
            MISTAKE_STYLE
        };
        Span::styled(mark.ch.to_string(), style)
    }));
    Line::from(spans)
}

/// Borrowed view of everything a frame needs.
struct RenderContext<'a> {
    heading: &'a str,
    scrollback: &'a [Line<'static>],
    prompt: &'a str,
    current_input: &'a str,
    mode: InputMode,
    status: &'a str,
}

/// Ratatui implementation of `Console`.
pub struct TuiInterface {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    heading: String,
    scrollback: Vec<Line<'static>>,
    prompt: String,
    current_input: String,
    mode: InputMode,
    status: String,
    needs_redraw: bool,
    farewell: Option<String>,
    restored: bool,
}

impl TuiInterface {
    pub fn new() -> Result<Self, io::Error> {
        info_log!("TuiInterface::new() - Initializing TUI");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, cursor::Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        info_log!("Terminal setup complete: raw mode, alternate screen");

        Ok(Self {
            terminal,
            heading: String::new(),
            scrollback: Vec::new(),
            prompt: String::new(),
            current_input: String::new(),
            mode: InputMode::Idle,
            status: "Ready".to_string(),
            needs_redraw: true,
            farewell: None,
            restored: false,
        })
    }

    /// Leave raw mode and the alternate screen. Safe to call more than once.
    pub fn cleanup(&mut self) -> Result<(), io::Error> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }

    fn draw(&mut self) -> Result<(), io::Error> {
        let ctx = RenderContext {
            heading: &self.heading,
            scrollback: &self.scrollback,
            prompt: &self.prompt,
            current_input: &self.current_input,
            mode: self.mode,
            status: &self.status,
        };

        self.terminal.draw(|f| {
            Self::render_static(f, &ctx);
        })?;
        self.needs_redraw = false;
        Ok(())
    }

    fn draw_or_log(&mut self) {
        if let Err(e) = self.draw() {
            debug_log!("Draw error: {}", e);
        }
    }

    fn redraw_if_needed(&mut self) {
        if self.needs_redraw {
            self.draw_or_log();
        }
    }

    fn render_static(f: &mut Frame, ctx: &RenderContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(6),    // Body
                Constraint::Length(3), // Input
                Constraint::Length(3), // Status
            ])
            .split(f.area());

        Self::render_title(f, chunks[0], ctx.heading);
        Self::render_body(f, chunks[1], ctx.scrollback);
        Self::render_input(f, chunks[2], ctx);
        Self::render_status(f, chunks[3], ctx.status);
    }

    fn render_title(f: &mut Frame, area: Rect, heading: &str) {
        let text = if heading.is_empty() {
            "MEMENTO".to_string()
        } else {
            format!("MEMENTO · {heading}")
        };
        let title = Paragraph::new(text)
            .style(HEADER_STYLE)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, area);
    }

    fn render_body(f: &mut Frame, area: Rect, scrollback: &[Line<'static>]) {
        let block = Block::default().borders(Borders::ALL);
        let offset = tail_offset(scrollback.len(), block.inner(area).height);
        let body = Paragraph::new(Text::from(scrollback.to_vec()))
            .block(block)
            .scroll((offset, 0));
        f.render_widget(body, area);
    }

    fn render_input(f: &mut Frame, area: Rect, ctx: &RenderContext) {
        let (title, content) = match ctx.mode {
            InputMode::Line => (ctx.prompt.trim_end(), format!("{}_", ctx.current_input)),
            InputMode::Filter => ("Filter", String::new()),
            InputMode::Idle => ("", String::new()),
        };
        let input = Paragraph::new(content)
            .style(INPUT_STYLE)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        f.render_widget(input, area);
    }

    fn render_status(f: &mut Frame, area: Rect, status: &str) {
        let status_text = if status.is_empty() { "Ready" } else { status };
        let paragraph = Paragraph::new(status_text)
            .style(HEADER_STYLE)
            .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(paragraph, area);
    }

    fn push_line(&mut self, line: Line<'static>) {
        self.scrollback.push(line);
        if self.scrollback.len() > MAX_SCROLLBACK {
            let excess = self.scrollback.len() - MAX_SCROLLBACK;
            self.scrollback.drain(..excess);
        }
        self.needs_redraw = true;
    }

    fn push_styled(&mut self, text: String, style: Style) {
        self.push_line(Line::from(Span::styled(text, style)));
    }

    /// Next key press, or `None` after a timeout or a non-key event.
    fn next_key(&mut self) -> Result<Option<KeyEvent>, io::Error> {
        if !event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            return Ok(None);
        }
        match event::read()? {
            Event::Resize(_, _) => {
                debug_log!("next_key() - resize, marking for redraw");
                self.needs_redraw = true;
                Ok(None)
            }
            Event::Key(key) if key.kind == KeyEventKind::Press && !is_noise(&key) => {
                debug_log!("next_key() - code={:?}, modifiers={:?}", key.code, key.modifiers);
                Ok(Some(key))
            }
            _ => Ok(None),
        }
    }
}

impl Console for TuiInterface {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.mode = InputMode::Line;
        self.prompt = prompt.to_string();
        self.current_input.clear();
        self.status = "Enter to submit, Ctrl-C to quit".to_string();
        self.needs_redraw = true;

        let outcome = loop {
            self.redraw_if_needed();
            let key = match self.next_key() {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("terminal input failed: {e}");
                    break None;
                }
            };
            match apply_line_key(&mut self.current_input, &key) {
                LineKey::Submit => break Some(std::mem::take(&mut self.current_input)),
                LineKey::Interrupt => {
                    info_log!("read_line() - interrupted");
                    break None;
                }
                LineKey::Edited => self.needs_redraw = true,
                LineKey::Ignored => {}
            }
        };

        if let Some(answer) = &outcome {
            let echo = Line::from(vec![
                Span::styled(self.prompt.clone(), Style::new().fg(Color::Yellow)),
                Span::raw(answer.clone()),
            ]);
            self.push_line(echo);
        }
        self.mode = InputMode::Idle;
        outcome
    }

    fn read_filter_input(&mut self) -> Option<FilterInput> {
        self.mode = InputMode::Filter;
        self.status =
            "Type to filter, Backspace removes, Ctrl-U clears, Enter or Esc returns".to_string();
        self.needs_redraw = true;

        loop {
            self.redraw_if_needed();
            let key = match self.next_key() {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("terminal input failed: {e}");
                    return None;
                }
            };
            match filter_key(&key) {
                FilterKey::Input(input) => {
                    self.mode = InputMode::Idle;
                    return Some(input);
                }
                FilterKey::Interrupt => return None,
                FilterKey::Ignored => {}
            }
        }
    }

    fn clear(&mut self) {
        self.scrollback.clear();
        self.needs_redraw = true;
    }

    fn show_heading(&mut self, title: &str) {
        self.heading = title.to_string();
        if !self.scrollback.is_empty() {
            self.push_line(Line::default());
        }
        self.push_styled(title.to_string(), HEADING_STYLE);
    }

    fn show_menu(&mut self, options: &[&str]) {
        for (i, option) in options.iter().enumerate() {
            self.push_styled(format!("  {}. {option}", i + 1), MENU_STYLE);
        }
    }

    fn show_message(&mut self, tone: Tone, text: &str) {
        if tone == Tone::Error {
            self.status = text.to_string();
        }
        self.push_styled(text.to_string(), tone_style(tone));
    }

    fn show_words(&mut self, filter: &str, entries: &[(&str, &str)]) {
        if !filter.is_empty() {
            self.push_styled(format!("Current filter: {filter}"), HEADING_STYLE);
        }
        if entries.is_empty() {
            self.push_styled(
                format!("No words found starting with '{filter}'"),
                tone_style(Tone::Warning),
            );
            return;
        }
        for (i, (word, definition)) in entries.iter().enumerate() {
            self.push_line(Line::from(vec![
                Span::styled(format!("  {}. {word}", i + 1), WORD_STYLE),
                Span::raw(format!(": {definition}")),
            ]));
        }
    }

    fn show_progress(&mut self, done: usize, total: usize) {
        self.push_line(progress_line(done, total));
        self.status = format!(
            "Progress: {done}/{total} words done, {} left",
            total.saturating_sub(done)
        );
    }

    fn show_marked_answer(&mut self, marks: &[MarkedChar]) {
        self.push_line(marked_answer_line(marks));
    }

    fn show_stats(&mut self, summary: &StatsSummary) {
        let info = tone_style(Tone::Info);
        self.push_styled(format!("Total quizzes taken: {}", summary.total_quizzes), info);
        self.push_styled(format!("Words learned: {}", summary.best_score), info);
        if let Some(average) = summary.average_percentage {
            self.push_styled(format!("Average score: {average:.1}%"), tone_style(Tone::Accent));
        }
        if let Some(date) = &summary.last_quiz_date {
            self.push_styled(format!("Last quiz taken: {date}"), info);
        }
        if let Some(improvement) = summary.improvement {
            let tone = if improvement >= 0.0 {
                Tone::Success
            } else {
                Tone::Error
            };
            self.push_styled(
                format!("Improvement since first quiz: {improvement:+.1}%"),
                tone_style(tone),
            );
        }

        self.push_line(Line::default());
        self.push_styled("Recent quiz results:".to_string(), HEADING_STYLE);
        for result in &summary.recent {
            self.push_styled(
                format!(
                    "{}: {}/{} ({:.1}%)",
                    result.date, result.score, result.total, result.percentage
                ),
                tone_style(percentage_tone(result.percentage)),
            );
        }
    }

    fn show_farewell(&mut self, text: &str) {
        self.farewell = Some(text.to_string());
    }
}

impl Drop for TuiInterface {
    fn drop(&mut self) {
        let _ = self.cleanup();
        if let Some(text) = self.farewell.take() {
            println!("{text}");
        }
    }
}
