//! Menu loop and the presentation trait it drives.

use crate::config::Config;
use crate::error::{MementoError, Result};
use crate::filter::{FilterSearch, FilterStep};
use crate::quiz::{MarkedChar, run_quiz};
use crate::stats::{StatsLedger, StatsSummary};
use crate::store::{Upsert, WordStore};
use crate::{debug_log, info_log};
use rand::Rng;
use std::io;

pub const MENU_OPTIONS: [&str; 8] = [
    "Add Word",
    "View Words",
    "Quiz Yourself",
    "Delete Word",
    "Export Word List to CSV",
    "Import Word List from CSV",
    "View Statistics",
    "Exit",
];

pub const BANNER: [&str; 6] = [
    r" __  __ _____ __  __ _____ _   _ _____ ___  ",
    r"|  \/  | ____|  \/  | ____| \ | |_   _/ _ \ ",
    r"| |\/| |  _| | |\/| |  _| |  \| | | || | | |",
    r"| |  | | |___| |  | | |___| |\  | | || |_| |",
    r"|_|  |_|_____|_|  |_|_____|_| \_| |_| \___/ ",
    "        your personal vocabulary trainer",
];

pub const FAREWELL: &str = "Thank you for using the Vocabulary Trainer! Goodbye!";
pub const INTERRUPTED_FAREWELL: &str = "Program terminated by user. Goodbye!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
    Accent,
}

/// One step of input in the word-list filter view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterInput {
    /// Characters to append, applied one at a time.
    Chars(String),
    Backspace,
    Clear,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    AddWord,
    ViewWords,
    Quiz,
    DeleteWord,
    Export,
    Import,
    ViewStats,
    Exit,
}

impl MenuAction {
    /// Map a 1-based menu selection to its action.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::AddWord),
            "2" => Some(Self::ViewWords),
            "3" => Some(Self::Quiz),
            "4" => Some(Self::DeleteWord),
            "5" => Some(Self::Export),
            "6" => Some(Self::Import),
            "7" => Some(Self::ViewStats),
            "8" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// How the menu loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Exited,
    Interrupted,
}

/// Presentation surface. Implementations render and collect raw input; they
/// hold no quiz or store state.
pub trait Console {
    /// Prompt for one line, without its terminator. `None` means the input
    /// ended or the user interrupted.
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Next edit in the word-list filter view. `None` means interrupted.
    fn read_filter_input(&mut self) -> Option<FilterInput>;

    fn clear(&mut self);

    fn show_heading(&mut self, title: &str);

    /// Startup art, shown once before the first menu.
    fn show_banner(&mut self, lines: &[&str]) {
        for line in lines {
            self.show_message(Tone::Accent, line);
        }
    }

    fn show_menu(&mut self, options: &[&str]);

    fn show_message(&mut self, tone: Tone, text: &str);

    fn show_words(&mut self, filter: &str, entries: &[(&str, &str)]);

    fn show_progress(&mut self, done: usize, total: usize);

    fn show_marked_answer(&mut self, marks: &[MarkedChar]);

    fn show_stats(&mut self, summary: &StatsSummary);

    fn show_farewell(&mut self, text: &str);

    fn pause(&mut self) -> Option<()> {
        self.read_line("Press Enter to continue...").map(|_| ())
    }
}

/// Read a line, turning end of input into `MementoError::Interrupted`.
pub fn prompt<C: Console + ?Sized>(console: &mut C, text: &str) -> Result<String> {
    console.read_line(text).ok_or(MementoError::Interrupted)
}

pub(crate) fn pause<C: Console + ?Sized>(console: &mut C) -> Result<()> {
    console.pause().ok_or(MementoError::Interrupted)
}

pub struct App<R> {
    store: WordStore,
    ledger: StatsLedger,
    rng: R,
    config: Config,
}

impl<R: Rng> App<R> {
    pub fn new(store: WordStore, ledger: StatsLedger, rng: R, config: Config) -> Self {
        Self {
            store,
            ledger,
            rng,
            config,
        }
    }

    pub fn store(&self) -> &WordStore {
        &self.store
    }

    pub fn ledger(&self) -> &StatsLedger {
        &self.ledger
    }

    /// Run the menu until Exit or an interrupt. Action failures are shown and
    /// the menu carries on.
    pub fn run<C: Console + ?Sized>(&mut self, console: &mut C) -> SessionEnd {
        info_log!("menu loop started with {} words", self.store.len());
        console.show_banner(&BANNER);
        loop {
            console.show_heading("MEMENTO");
            console.show_menu(&MENU_OPTIONS);
            let Some(choice) = console.read_line("Choose an option: ") else {
                return farewell(console, SessionEnd::Interrupted);
            };
            console.clear();

            let Some(action) = MenuAction::from_choice(&choice) else {
                console.show_message(Tone::Error, "Invalid choice. Please try again.");
                continue;
            };
            debug_log!("menu action {action:?}");
            if action == MenuAction::Exit {
                return farewell(console, SessionEnd::Exited);
            }

            match self.dispatch(console, action) {
                Ok(()) => console.clear(),
                Err(MementoError::Interrupted) => {
                    return farewell(console, SessionEnd::Interrupted);
                }
                Err(e) => {
                    log::error!("{action:?} failed: {e}");
                    console.show_message(Tone::Error, &format!("An error occurred: {e}"));
                    if pause(console).is_err() {
                        return farewell(console, SessionEnd::Interrupted);
                    }
                    console.clear();
                }
            }
        }
    }

    fn dispatch<C: Console + ?Sized>(&mut self, console: &mut C, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::AddWord => self.add_words(console),
            MenuAction::ViewWords => self.view_words(console),
            MenuAction::Quiz => run_quiz(
                console,
                &self.store,
                &mut self.ledger,
                &mut self.rng,
                self.config.quiz_size,
            ),
            MenuAction::DeleteWord => {
                self.delete_word(console)?;
                pause(console)
            }
            MenuAction::Export => {
                self.export_words(console)?;
                pause(console)
            }
            MenuAction::Import => {
                self.import_words(console)?;
                pause(console)
            }
            MenuAction::ViewStats => {
                self.view_stats(console);
                pause(console)
            }
            MenuAction::Exit => Ok(()),
        }
    }

    fn add_words<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<()> {
        console.show_heading("Add New Words");
        loop {
            let word = prompt(
                console,
                "Enter the word (or type 'main' to return to the main menu): ",
            )?;
            if word.trim().eq_ignore_ascii_case("main") {
                return Ok(());
            }
            let definition = prompt(
                console,
                &format!("Enter the definition for '{}': ", word.trim()),
            )?;

            match self.store.add(&word, &definition) {
                Ok(Upsert::Inserted) => {
                    console.show_message(Tone::Success, &format!("'{}' added successfully!", word.trim()));
                }
                Ok(Upsert::Replaced) => {
                    console.show_message(Tone::Success, &format!("'{}' updated successfully!", word.trim()));
                }
                Err(MementoError::EmptyWord) => {
                    console.show_message(Tone::Error, "The word cannot be empty.");
                    continue;
                }
                Err(e) => return Err(e),
            }

            let next = prompt(
                console,
                "Do you want to add another word? (Enter to continue, 'main' to return to the menu): ",
            )?;
            if next.trim().eq_ignore_ascii_case("main") {
                return Ok(());
            }
        }
    }

    fn view_words<C: Console + ?Sized>(&self, console: &mut C) -> Result<()> {
        if self.store.is_empty() {
            console.show_heading("Word List");
            console.show_message(Tone::Warning, "No words available.");
            return pause(console);
        }

        let mut search = FilterSearch::new();
        let mut notice: Option<&str> = None;
        loop {
            console.clear();
            console.show_heading("Word List");
            let matches: Vec<(&str, &str)> = search.matches(&self.store).collect();
            console.show_words(search.current(), &matches);
            if let Some(text) = notice.take() {
                console.show_message(Tone::Error, text);
            }

            match console.read_filter_input() {
                None => return Err(MementoError::Interrupted),
                Some(FilterInput::Done) => return Ok(()),
                Some(FilterInput::Clear) => search.clear(),
                Some(FilterInput::Backspace) => {
                    search.pop_char();
                }
                Some(FilterInput::Chars(chars)) => {
                    for c in chars.chars() {
                        if search.apply_char(c, &self.store) == FilterStep::NoMatch {
                            notice = Some("No matches found! Last character was removed.");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn delete_word<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<()> {
        console.show_heading("Delete Word");
        if self.store.is_empty() {
            console.show_message(Tone::Warning, "No words available to delete.");
            return Ok(());
        }

        let word = prompt(console, "Enter the word you want to delete: ")?;
        let word = word.trim();
        match self.store.delete(word) {
            Ok(_) => {
                console.show_message(Tone::Success, &format!("'{word}' has been deleted."));
                Ok(())
            }
            Err(e @ MementoError::NotFound(_)) => {
                console.show_message(Tone::Error, &capitalize(&e.to_string()));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn export_words<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<()> {
        console.show_heading("Export Word List to CSV");
        if self.store.is_empty() {
            console.show_message(Tone::Warning, "No words available to export.");
            return Ok(());
        }

        let name = prompt(console, "Enter a filename (without .csv extension): ")?;
        let path = self.config.exchange_path(&format!("{}.csv", name.trim()));
        match self.store.export_to_path(&path) {
            Ok(()) => console.show_message(
                Tone::Success,
                &format!("Word list exported to {}", path.display()),
            ),
            Err(MementoError::Io(e)) => {
                log::warn!("export to {} failed: {e}", path.display());
                console.show_message(Tone::Error, &format!("Error writing to {}", path.display()));
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn import_words<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<()> {
        console.show_heading("Import Word List from CSV");
        let name = prompt(console, "Enter the filename (including .csv extension): ")?;
        let name = name.trim();
        let path = self.config.exchange_path(name);

        match self.store.import_from_path(&path) {
            Ok(summary) if summary.imported > 0 => console.show_message(
                Tone::Success,
                &format!(
                    "Successfully imported {} words ({} new) from {name}",
                    summary.imported, summary.new
                ),
            ),
            Ok(_) => console.show_message(Tone::Warning, "No valid words found in the CSV file."),
            Err(MementoError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                console.show_message(
                    Tone::Error,
                    &format!(
                        "File '{name}' not found in {}.",
                        self.config.data_dir.display()
                    ),
                );
            }
            Err(MementoError::MalformedInput(reason)) => {
                log::warn!("import from {} rejected: {reason}", path.display());
                console.show_message(Tone::Error, &format!("Error: {reason}."));
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn view_stats<C: Console + ?Sized>(&self, console: &mut C) {
        let summary = self.ledger.summary();
        if summary.total_quizzes == 0 {
            console.show_message(
                Tone::Warning,
                "No quiz statistics available yet. Take a quiz first!",
            );
            return;
        }
        console.show_heading("Quiz Statistics");
        console.show_stats(&summary);
    }
}

fn farewell<C: Console + ?Sized>(console: &mut C, end: SessionEnd) -> SessionEnd {
    let text = match end {
        SessionEnd::Exited => FAREWELL,
        SessionEnd::Interrupted => INTERRUPTED_FAREWELL,
    };
    info_log!("menu loop ended: {end:?}");
    console.show_farewell(text);
    end
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Colour band for a quiz percentage: ≥80 success, ≥60 warning, else error.
pub fn percentage_tone(percentage: f64) -> Tone {
    if percentage >= 80.0 {
        Tone::Success
    } else if percentage >= 60.0 {
        Tone::Warning
    } else {
        Tone::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;

    /// Console that replays scripted input and records what was shown.
    #[derive(Default)]
    struct ScriptedConsole {
        lines: VecDeque<String>,
        filter_inputs: VecDeque<FilterInput>,
        messages: Vec<(Tone, String)>,
        word_views: Vec<(String, Vec<String>)>,
        farewell: Option<String>,
        banner_lines: usize,
        prompts: Vec<String>,
    }

    impl ScriptedConsole {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                ..Self::default()
            }
        }

        fn with_filter(mut self, inputs: Vec<FilterInput>) -> Self {
            self.filter_inputs = inputs.into();
            self
        }

        fn said(&self, text: &str) -> bool {
            self.messages.iter().any(|(_, m)| m.contains(text))
        }
    }

    impl Console for ScriptedConsole {
        fn read_line(&mut self, prompt: &str) -> Option<String> {
            self.prompts.push(prompt.to_string());
            self.lines.pop_front()
        }

        fn read_filter_input(&mut self) -> Option<FilterInput> {
            self.filter_inputs.pop_front()
        }

        fn clear(&mut self) {}

        fn show_heading(&mut self, _title: &str) {}

        fn show_banner(&mut self, lines: &[&str]) {
            self.banner_lines += lines.len();
        }

        fn show_menu(&mut self, _options: &[&str]) {}

        fn show_message(&mut self, tone: Tone, text: &str) {
            self.messages.push((tone, text.to_string()));
        }

        fn show_words(&mut self, filter: &str, entries: &[(&str, &str)]) {
            let words = entries.iter().map(|(w, _)| w.to_string()).collect();
            self.word_views.push((filter.to_string(), words));
        }

        fn show_progress(&mut self, _done: usize, _total: usize) {}

        fn show_marked_answer(&mut self, _marks: &[MarkedChar]) {}

        fn show_stats(&mut self, summary: &StatsSummary) {
            self.messages
                .push((Tone::Info, format!("quizzes: {}", summary.total_quizzes)));
        }

        fn show_farewell(&mut self, text: &str) {
            self.farewell = Some(text.to_string());
        }
    }

    fn app(words: &[(&str, &str)]) -> (tempfile::TempDir, App<StdRng>) {
        let temp = tempfile::tempdir().expect("create temp dir");
        let config = Config::new(temp.path());
        let mut store = WordStore::new(config.words_path());
        for (word, definition) in words {
            store.add(word, definition).expect("add");
        }
        let ledger = StatsLedger::new(config.stats_path());
        let app = App::new(store, ledger, StdRng::seed_from_u64(1), config);
        (temp, app)
    }

    #[test]
    fn test_menu_action_from_choice() {
        assert_eq!(MenuAction::from_choice("1"), Some(MenuAction::AddWord));
        assert_eq!(MenuAction::from_choice(" 8 "), Some(MenuAction::Exit));
        assert_eq!(MenuAction::from_choice("9"), None);
        assert_eq!(MenuAction::from_choice("quiz"), None);
    }

    #[test]
    fn test_exit_says_goodbye() {
        let (_temp, mut app) = app(&[]);
        let mut console = ScriptedConsole::new(&["8"]);
        assert_eq!(app.run(&mut console), SessionEnd::Exited);
        assert_eq!(console.farewell.as_deref(), Some(FAREWELL));
    }

    #[test]
    fn test_end_of_input_is_interrupt() {
        let (_temp, mut app) = app(&[]);
        let mut console = ScriptedConsole::new(&[]);
        assert_eq!(app.run(&mut console), SessionEnd::Interrupted);
        assert_eq!(console.farewell.as_deref(), Some(INTERRUPTED_FAREWELL));
    }

    #[test]
    fn test_invalid_choice_reprompts() {
        let (_temp, mut app) = app(&[]);
        let mut console = ScriptedConsole::new(&["42", "8"]);
        assert_eq!(app.run(&mut console), SessionEnd::Exited);
        assert!(console.said("Invalid choice"));
    }

    #[test]
    fn test_add_words_until_main() {
        let (_temp, mut app) = app(&[]);
        let mut console =
            ScriptedConsole::new(&["1", "cat", "feline", "", "dog", "canine", "main", "8"]);
        app.run(&mut console);
        assert_eq!(app.store().get("cat"), Some("feline"));
        assert_eq!(app.store().get("dog"), Some("canine"));
    }

    #[test]
    fn test_add_empty_word_is_reported() {
        let (_temp, mut app) = app(&[]);
        let mut console = ScriptedConsole::new(&["1", "  ", "nothing", "main", "8"]);
        app.run(&mut console);
        assert!(app.store().is_empty());
        assert!(console.said("cannot be empty"));
    }

    #[test]
    fn test_delete_missing_word_reports_not_found() {
        let (_temp, mut app) = app(&[("cat", "feline")]);
        let mut console = ScriptedConsole::new(&["4", "dog", "", "8"]);
        app.run(&mut console);
        assert!(console.said("'dog' not found in the list"));
        assert_eq!(app.store().len(), 1);
    }

    #[test]
    fn test_delete_trims_the_word() {
        let (_temp, mut app) = app(&[("cat", "feline"), ("dog", "canine")]);
        let mut console = ScriptedConsole::new(&["4", "  cat ", "", "8"]);
        app.run(&mut console);
        assert!(console.said("'cat' has been deleted."));
        assert!(!app.store().contains("cat"));
        assert_eq!(app.store().len(), 1);
    }

    #[test]
    fn test_banner_shown_once() {
        let (_temp, mut app) = app(&[]);
        let mut console = ScriptedConsole::new(&["42", "8"]);
        app.run(&mut console);
        assert_eq!(console.banner_lines, BANNER.len());
    }

    #[test]
    fn test_action_error_pauses_before_menu() {
        let (temp, mut app) = app(&[]);
        // A directory where the word document belongs makes every save fail.
        std::fs::create_dir_all(temp.path().join("words.json")).expect("create blocker");
        let mut console = ScriptedConsole::new(&["1", "cat", "feline", "", "8"]);
        assert_eq!(app.run(&mut console), SessionEnd::Exited);

        assert!(console.said("An error occurred"));
        assert!(app.store().is_empty());
        let pause_index = console
            .prompts
            .iter()
            .position(|p| p == "Press Enter to continue...")
            .expect("paused after the error");
        assert_eq!(console.prompts[pause_index + 1], "Choose an option: ");
    }

    #[test]
    fn test_end_of_input_at_error_pause_is_interrupt() {
        let (temp, mut app) = app(&[]);
        std::fs::create_dir_all(temp.path().join("words.json")).expect("create blocker");
        let mut console = ScriptedConsole::new(&["1", "cat", "feline"]);
        assert_eq!(app.run(&mut console), SessionEnd::Interrupted);
        assert_eq!(console.farewell.as_deref(), Some(INTERRUPTED_FAREWELL));
    }

    #[test]
    fn test_delete_on_empty_store() {
        let (_temp, mut app) = app(&[]);
        let mut console = ScriptedConsole::new(&["4", "", "8"]);
        assert_eq!(app.run(&mut console), SessionEnd::Exited);
        assert!(console.said("No words available to delete."));
    }

    #[test]
    fn test_view_words_filter_flow() {
        let (_temp, mut app) = app(&[("cat", "feline"), ("Cow", "bovine"), ("dog", "canine")]);
        let mut console = ScriptedConsole::new(&["2", "8"]).with_filter(vec![
            FilterInput::Chars("c".to_string()),
            FilterInput::Chars("oz".to_string()),
            FilterInput::Backspace,
            FilterInput::Clear,
            FilterInput::Done,
        ]);
        app.run(&mut console);

        let views: Vec<(&str, Vec<&str>)> = console
            .word_views
            .iter()
            .map(|(f, w)| (f.as_str(), w.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(
            views,
            vec![
                ("", vec!["cat", "Cow", "dog"]),
                ("c", vec!["cat", "Cow"]),
                ("co", vec!["Cow"]),
                ("c", vec!["cat", "Cow"]),
                ("", vec!["cat", "Cow", "dog"]),
            ]
        );
        assert!(console.said("No matches found!"));
    }

    #[test]
    fn test_view_words_interrupt() {
        let (_temp, mut app) = app(&[("cat", "feline")]);
        let mut console = ScriptedConsole::new(&["2"]);
        assert_eq!(app.run(&mut console), SessionEnd::Interrupted);
    }

    #[test]
    fn test_stats_empty_then_after_quiz() {
        let (_temp, mut app) = app(&[("cat", "a small domesticated feline")]);
        let mut console = ScriptedConsole::new(&["7", "", "3", "1", "dog", "no", "7", "", "8"]);
        app.run(&mut console);

        assert!(console.said("No quiz statistics available yet"));
        assert!(console.said("quizzes: 1"));
        assert_eq!(app.ledger().total_quizzes(), 1);
        assert_eq!(app.ledger().best_score(), 0);
    }

    #[test]
    fn test_percentage_tone_bands() {
        assert_eq!(percentage_tone(100.0), Tone::Success);
        assert_eq!(percentage_tone(80.0), Tone::Success);
        assert_eq!(percentage_tone(60.0), Tone::Warning);
        assert_eq!(percentage_tone(59.9), Tone::Error);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("'dog' not found"), "'dog' not found");
        assert_eq!(capitalize("no words"), "No words");
        assert_eq!(capitalize(""), "");
    }
}
