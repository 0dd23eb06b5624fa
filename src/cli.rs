use crate::app::{Console, FilterInput, Tone, percentage_tone};
use crate::{debug_log, info_log};
use crate::quiz::{DEFAULT_POOL_SIZE, MarkedChar};
use crate::stats::StatsSummary;
use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, ResetColor, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const PROGRESS_BAR_WIDTH: usize = 50;
const RULE_WIDTH: usize = 50;
const BANNER_CHAR_DELAY: Duration = Duration::from_millis(2);

/// Memento vocabulary trainer options
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding words.json, stats.json and CSV exchange files
    #[arg(short = 'd', long = "data-dir", env = "MEMENTO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Default number of words per quiz
    #[arg(short = 'n', long = "quiz-size", default_value_t = DEFAULT_POOL_SIZE, value_parser = parse_quiz_size)]
    pub quiz_size: usize,

    /// Use the line-based interface instead of the full-screen one
    #[arg(long)]
    pub plain: bool,
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

fn parse_quiz_size(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{value}' is not a positive number")),
    }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Info => Color::Cyan,
        Tone::Success => Color::Green,
        Tone::Warning => Color::Yellow,
        Tone::Error => Color::Red,
        Tone::Accent => Color::Magenta,
    }
}

/// Shared "the user pressed Ctrl-C" marker for the line interface.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Route SIGINT to `flag`, then run `on_interrupt` from the handler thread.
///
/// A blocked `read_line` never sees the flag, so `on_interrupt` is expected
/// to say goodbye and end the process.
pub fn install_interrupt_handler<F>(flag: InterruptFlag, on_interrupt: F) -> Result<(), ctrlc::Error>
where
    F: Fn() + Send + 'static,
{
    ctrlc::set_handler(move || {
        info_log!("SIGINT received");
        flag.raise();
        on_interrupt();
    })
}

/// Line-based implementation of the `Console` trait.
///
/// Reads one line per prompt from any `BufRead` and writes to any `Write`.
/// With `styled` off, output is plain text and `clear` does nothing, which is
/// what tests and piped sessions want.
pub struct CliInterface<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    styled: bool,
    interrupt: InterruptFlag,
}

impl<R: BufRead, W: Write> CliInterface<R, W> {
    /// Coloured output with screen clearing.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            styled: true,
            interrupt: InterruptFlag::new(),
        }
    }

    /// Plain text output.
    pub fn plain(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            styled: false,
            interrupt: InterruptFlag::new(),
        }
    }

    /// Report end of input once `flag` is raised.
    #[must_use]
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = flag;
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn paint(&self, text: &str, color: Color, bold: bool) -> String {
        if !self.styled {
            return text.to_string();
        }
        let styled = text.with(color);
        if bold {
            styled.bold().to_string()
        } else {
            styled.to_string()
        }
    }

    fn emit(&mut self, line: impl Display) {
        if let Err(e) = writeln!(self.writer, "{line}") {
            debug_log!("write failed: {}", e);
        }
    }

    fn rule(&self) -> String {
        self.paint(&"═".repeat(RULE_WIDTH), Color::Blue, false)
    }
}

/// Convert one raw line from the filter view into an edit.
fn parse_filter_line(line: &str) -> FilterInput {
    let line = line.trim();
    if line.is_empty() {
        FilterInput::Done
    } else if line.eq_ignore_ascii_case("clear") {
        FilterInput::Clear
    } else if line == "-" {
        FilterInput::Backspace
    } else {
        FilterInput::Chars(line.to_string())
    }
}

/// Filled cells and percentage for a progress bar.
fn progress_cells(done: usize, total: usize) -> (usize, f64) {
    let fraction = if total == 0 {
        0.0
    } else {
        done as f64 / total as f64
    };
    let filled = ((fraction * PROGRESS_BAR_WIDTH as f64) as usize).min(PROGRESS_BAR_WIDTH);
    (filled, fraction * 100.0)
}

impl<R: BufRead, W: Write> Console for CliInterface<R, W> {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        if self.interrupt.is_raised() {
            return None;
        }
        let prompt = self.paint(prompt, Color::Yellow, false);
        if let Err(e) = write!(self.writer, "{prompt}").and_then(|()| self.writer.flush()) {
            debug_log!("prompt write failed: {}", e);
        }

        let mut input = String::new();
        match self.reader.read_line(&mut input) {
            Ok(0) => None,
            Ok(_) if self.interrupt.is_raised() => None,
            Ok(_) => Some(input.trim_end_matches(['\n', '\r']).to_string()),
            Err(e) => {
                log::warn!("reading input failed: {e}");
                None
            }
        }
    }

    fn read_filter_input(&mut self) -> Option<FilterInput> {
        let hint = self.paint(
            "Type letters to filter, '-' to remove the last one, 'clear' to reset, Enter to return",
            Color::Cyan,
            false,
        );
        self.emit(hint);
        self.read_line("Input: ").map(|line| parse_filter_line(&line))
    }

    fn clear(&mut self) {
        if !self.styled {
            return;
        }
        if let Err(e) = execute!(self.writer, Clear(ClearType::All), MoveTo(0, 0)) {
            debug_log!("clear failed: {}", e);
        }
    }

    fn show_heading(&mut self, title: &str) {
        let rule = self.rule();
        let title = self.paint(title, Color::Yellow, true);
        self.emit("");
        self.emit(&rule);
        self.emit(title);
        self.emit(&rule);
    }

    fn show_banner(&mut self, lines: &[&str]) {
        if !self.styled {
            for line in lines {
                self.emit(line);
            }
            return;
        }

        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let columns = crossterm::terminal::size().map_or(0, |(cols, _)| usize::from(cols));
        let padding = " ".repeat(columns.saturating_sub(width) / 2);
        for line in lines {
            let _ = write!(self.writer, "{padding}");
            for ch in line.chars() {
                let cell = self.paint(&ch.to_string(), Color::Magenta, false);
                if let Err(e) = write!(self.writer, "{cell}").and_then(|()| self.writer.flush()) {
                    debug_log!("banner write failed: {}", e);
                    return;
                }
                thread::sleep(BANNER_CHAR_DELAY);
            }
            self.emit("");
        }
    }

    fn show_menu(&mut self, options: &[&str]) {
        for (i, option) in options.iter().enumerate() {
            let line = self.paint(&format!("    {}. {option}", i + 1), Color::Cyan, false);
            self.emit(line);
        }
    }

    fn show_message(&mut self, tone: Tone, text: &str) {
        let bold = matches!(tone, Tone::Error | Tone::Accent);
        let line = self.paint(text, tone_color(tone), bold);
        self.emit(line);
    }

    fn show_words(&mut self, filter: &str, entries: &[(&str, &str)]) {
        if !filter.is_empty() {
            let line = self.paint(&format!("    Current filter: {filter}"), Color::Yellow, false);
            self.emit(line);
        }
        if entries.is_empty() {
            let line = self.paint(
                &format!("    No words found starting with '{filter}'"),
                Color::Yellow,
                false,
            );
            self.emit(line);
            return;
        }
        for (i, (word, definition)) in entries.iter().enumerate() {
            let line = self.paint(&format!("    {}. {word}: {definition}", i + 1), Color::Green, false);
            self.emit(line);
        }
    }

    fn show_progress(&mut self, done: usize, total: usize) {
        let (filled, percent) = progress_cells(done, total);
        let mut bar = String::new();
        for i in 0..PROGRESS_BAR_WIDTH {
            if i < filled {
                let color = if i < PROGRESS_BAR_WIDTH / 3 {
                    Color::Red
                } else if i < PROGRESS_BAR_WIDTH * 2 / 3 {
                    Color::Yellow
                } else {
                    Color::Green
                };
                bar.push_str(&self.paint("█", color, false));
            } else {
                bar.push_str(&self.paint("─", Color::White, false));
            }
        }
        let percent = self.paint(&format!("{percent:.1}%"), Color::Cyan, false);
        self.emit("");
        self.emit(format!("[{bar}] {percent}"));
        let summary = self.paint(
            &format!(
                "Progress: {done}/{total} words done, {} left",
                total.saturating_sub(done)
            ),
            Color::Blue,
            false,
        );
        self.emit(summary);
    }

    fn show_marked_answer(&mut self, marks: &[MarkedChar]) {
        let mut line = String::from("Your answer: ");
        for mark in marks {
            let text = mark.ch.to_string();
            if mark.correct {
                line.push_str(&self.paint(&text, Color::Green, false));
            } else {
                line.push_str(&self.paint(&text, Color::Red, true));
            }
        }
        self.emit(line);
    }

    fn show_stats(&mut self, summary: &StatsSummary) {
        let mut lines = vec![
            (format!("Total quizzes taken: {}", summary.total_quizzes), Color::Cyan),
            (format!("Words learned: {}", summary.best_score), Color::Cyan),
        ];
        if let Some(average) = summary.average_percentage {
            lines.push((format!("Average score: {average:.1}%"), Color::Magenta));
        }
        if let Some(date) = &summary.last_quiz_date {
            lines.push((format!("Last quiz taken: {date}"), Color::Blue));
        }
        if let Some(improvement) = summary.improvement {
            let color = if improvement >= 0.0 {
                Color::Green
            } else {
                Color::Red
            };
            lines.push((format!("Improvement since first quiz: {improvement:+.1}%"), color));
        }
        for (text, color) in lines {
            let line = self.paint(&text, color, false);
            self.emit(line);
        }

        let header = self.paint("Recent quiz results:", Color::Yellow, true);
        self.emit("");
        self.emit(header);
        for result in &summary.recent {
            let color = tone_color(percentage_tone(result.percentage));
            let line = self.paint(
                &format!(
                    "{}: {}/{} ({:.1}%)",
                    result.date, result.score, result.total, result.percentage
                ),
                color,
                false,
            );
            self.emit(line);
        }
    }

    fn show_farewell(&mut self, text: &str) {
        let line = self.paint(text, Color::Green, false);
        self.emit("");
        self.emit(line);
        if self.styled
            && let Err(e) = queue!(self.writer, ResetColor)
        {
            debug_log!("colour reset failed: {}", e);
        }
        if let Err(e) = self.writer.flush() {
            debug_log!("flush failed: {}", e);
        }
    }
}
