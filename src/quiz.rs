//! Quiz rounds.
//!
//! # State machine
//! A `QuizSession` is built already sized (a store that is empty or a size of
//! zero never produces one) and then moves `Running` → `Completed` when the
//! pool is exhausted, or `Running` → `EarlyExited` on an exit command.
//!
//! A retry round is a fresh session seeded from the previous round's
//! mistakes. `run_quiz` keeps rounds on an explicit stack instead of recursing.

use crate::app::{Console, Tone, pause, prompt};
use crate::error::{MementoError, Result};
use crate::stats::{StatsLedger, percentage};
use crate::store::{WordEntry, WordStore};
use crate::{debug_log, info_log};
use indexmap::IndexSet;
use rand::Rng;
use rand::seq::SliceRandom;

pub const DEFAULT_POOL_SIZE: usize = 15;
pub const EXIT_COMMANDS: [&str; 2] = ["exit", "menu"];

/// True for "exit" or "menu" in any case, ignoring surrounding whitespace.
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|command| input.eq_ignore_ascii_case(command))
}

/// Parse a requested pool size. Blank input selects `default`.
pub fn parse_pool_size(input: &str, default: usize) -> Result<usize> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }
    match input.parse::<i64>() {
        Ok(n) if n > 0 => Ok(usize::try_from(n).unwrap_or(usize::MAX)),
        _ => Err(MementoError::InvalidSize(input.to_string())),
    }
}

/// One character of a user's answer, marked against the expected word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkedChar {
    pub ch: char,
    pub correct: bool,
}

/// Position-by-position comparison of `answer` against `word`.
///
/// Matching characters keep the user's casing. Mismatches, and anything past
/// the end of `word`, are upper-cased. The result is as long as `answer`.
pub fn highlight_mistakes(answer: &str, word: &str) -> Vec<MarkedChar> {
    let expected: Vec<char> = word.chars().collect();
    answer
        .chars()
        .enumerate()
        .map(|(i, ch)| match expected.get(i) {
            Some(&want) if chars_match(ch, want) => MarkedChar { ch, correct: true },
            _ => MarkedChar {
                ch: single_upper(ch),
                correct: false,
            },
        })
        .collect()
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn single_upper(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => ch,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Running,
    Completed,
    EarlyExited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    Primary,
    Retry { depth: usize },
}

impl Round {
    fn depth(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Retry { depth } => depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect { expected: String, marks: Vec<MarkedChar> },
    Exited,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    round: Round,
    pool: Vec<WordEntry>,
    cursor: usize,
    correct_count: usize,
    attempted: IndexSet<String>,
    mistakes: Vec<WordEntry>,
    state: QuizState,
}

impl QuizSession {
    /// Sample `min(requested, store.len())` distinct entries in random order.
    pub fn start<R: Rng + ?Sized>(store: &WordStore, requested: usize, rng: &mut R) -> Result<Self> {
        if store.is_empty() {
            return Err(MementoError::EmptyStore);
        }
        if requested == 0 {
            return Err(MementoError::InvalidSize(requested.to_string()));
        }

        let mut pool: Vec<WordEntry> = store.list().map(WordEntry::from).collect();
        pool.shuffle(rng);
        pool.truncate(requested);
        info_log!(
            "quiz started with {} of {} words",
            pool.len(),
            store.len()
        );
        Ok(Self::with_pool(Round::Primary, pool))
    }

    /// A retry round over `mistakes`, reshuffled.
    pub fn retry<R: Rng + ?Sized>(mistakes: Vec<WordEntry>, depth: usize, rng: &mut R) -> Self {
        let mut pool = mistakes;
        pool.shuffle(rng);
        info_log!("retry round {depth} with {} words", pool.len());
        Self::with_pool(Round::Retry { depth }, pool)
    }

    fn with_pool(round: Round, pool: Vec<WordEntry>) -> Self {
        let state = if pool.is_empty() {
            QuizState::Completed
        } else {
            QuizState::Running
        };
        Self {
            round,
            pool,
            cursor: 0,
            correct_count: 0,
            attempted: IndexSet::new(),
            mistakes: Vec::new(),
            state,
        }
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn pool(&self) -> &[WordEntry] {
        &self.pool
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn mistakes(&self) -> &[WordEntry] {
        &self.mistakes
    }

    /// `(answered, pool size)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.pool.len())
    }

    /// The entry being asked about, while running.
    pub fn current(&self) -> Option<&WordEntry> {
        match self.state {
            QuizState::Running => self.pool.get(self.cursor),
            _ => None,
        }
    }

    /// Check one answer against the current entry. Returns `None` once the
    /// session has stopped running.
    pub fn submit(&mut self, answer: &str) -> Option<AnswerOutcome> {
        let entry = self.current()?.clone();

        if is_exit_command(answer) {
            self.state = QuizState::EarlyExited;
            info_log!("quiz exited early at {}/{}", self.cursor, self.pool.len());
            return Some(AnswerOutcome::Exited);
        }

        self.attempted.insert(entry.word.clone());
        self.cursor += 1;
        if self.cursor >= self.pool.len() {
            self.state = QuizState::Completed;
        }

        if answer.trim().to_lowercase() == entry.word.to_lowercase() {
            self.correct_count += 1;
            debug_log!("'{}' answered correctly", entry.word);
            Some(AnswerOutcome::Correct)
        } else {
            debug_log!("'{}' answered as '{answer}'", entry.word);
            let marks = highlight_mistakes(answer, &entry.word);
            let expected = entry.word.clone();
            self.mistakes.push(entry);
            Some(AnswerOutcome::Incorrect { expected, marks })
        }
    }

    pub fn finish(self) -> QuizReport {
        QuizReport {
            round: self.round,
            state: self.state,
            correct: self.correct_count,
            attempted: self.attempted.into_iter().collect(),
            mistakes: self.mistakes,
        }
    }
}

/// What a round leaves behind once it stops.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizReport {
    pub round: Round,
    pub state: QuizState,
    pub correct: usize,
    /// Distinct words answered, in first-answer order.
    pub attempted: Vec<String>,
    pub mistakes: Vec<WordEntry>,
}

impl QuizReport {
    /// A completed first retry is not recorded. Every other round with at
    /// least one attempt is, including deeper retries and early exits.
    pub fn should_record(&self) -> bool {
        if self.attempted.is_empty() {
            return false;
        }
        match self.state {
            QuizState::EarlyExited => true,
            QuizState::Completed => self.round != Round::Retry { depth: 1 },
            QuizState::Running => false,
        }
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.correct, self.attempted.len())
    }

    pub fn offers_retry(&self) -> bool {
        self.state == QuizState::Completed && !self.mistakes.is_empty()
    }
}

/// Run a full quiz: sizing prompt, the primary round, and any retry rounds.
pub fn run_quiz<C, R>(
    console: &mut C,
    store: &WordStore,
    ledger: &mut StatsLedger,
    rng: &mut R,
    default_size: usize,
) -> Result<()>
where
    C: Console + ?Sized,
    R: Rng + ?Sized,
{
    if store.is_empty() {
        console.show_message(Tone::Warning, "No words available to quiz. Add some words first.");
        return pause(console);
    }

    console.show_heading("Vocabulary Quiz");
    console.show_message(
        Tone::Warning,
        "Type 'exit' or 'menu' at any time to return to main menu",
    );
    let requested = loop {
        let input = prompt(
            console,
            &format!("Enter the number of words to include in the quiz (default is {default_size}): "),
        )?;
        if is_exit_command(&input) {
            console.show_message(Tone::Warning, "Returning to main menu...");
            return Ok(());
        }
        match parse_pool_size(&input, default_size) {
            Ok(size) => break size,
            Err(e) => console.show_message(Tone::Error, &e.to_string()),
        }
    };

    let mut rounds = vec![QuizSession::start(store, requested, rng)?];
    while let Some(mut session) = rounds.pop() {
        if let Round::Retry { .. } = session.round() {
            console.show_message(
                Tone::Info,
                &format!("Retrying {} incorrect words...", session.pool().len()),
            );
        }
        play_round(console, &mut session)?;

        let report = session.finish();
        if report.should_record() {
            ledger.record(report.correct, report.attempted.len(), &report.attempted)?;
        }

        match report.state {
            QuizState::EarlyExited => {
                console.show_message(Tone::Warning, "Ending quiz early. Returning to main menu...");
            }
            QuizState::Completed if !report.attempted.is_empty() => {
                let total = report.attempted.len();
                console.show_progress(total, total);
                let tone = if report.percentage() >= 70.0 {
                    Tone::Success
                } else {
                    Tone::Error
                };
                console.show_message(Tone::Accent, "Quiz Complete!");
                console.show_message(
                    tone,
                    &format!(
                        "Score: {}/{} ({:.1}%)",
                        report.correct,
                        total,
                        report.percentage()
                    ),
                );
            }
            _ => {}
        }

        if report.offers_retry() {
            let answer = prompt(
                console,
                &format!(
                    "Would you like to retry the {} words you got wrong? (yes/no): ",
                    report.mistakes.len()
                ),
            )?;
            if answer.trim().eq_ignore_ascii_case("yes") {
                console.show_message(Tone::Info, "Starting retry quiz...");
                let depth = report.round.depth() + 1;
                rounds.push(QuizSession::retry(report.mistakes, depth, rng));
            }
        }
    }
    Ok(())
}

fn play_round<C: Console + ?Sized>(console: &mut C, session: &mut QuizSession) -> Result<()> {
    while let Some(entry) = session.current() {
        let definition = entry.definition.clone();
        let (done, total) = session.progress();
        console.show_progress(done, total);
        console.show_message(Tone::Info, &format!("Definition: '{definition}'"));

        let answer = prompt(console, "Your answer (or type 'exit'/'menu' to end quiz): ")?;
        match session.submit(&answer) {
            Some(AnswerOutcome::Correct) => console.show_message(Tone::Success, "✓ Correct!"),
            Some(AnswerOutcome::Incorrect { expected, marks }) => {
                console.show_message(Tone::Error, "✗ Incorrect.");
                console.show_marked_answer(&marks);
                console.show_message(Tone::Success, &format!("Correct word: '{expected}'"));
            }
            Some(AnswerOutcome::Exited) | None => break,
        }
    }
    Ok(())
}
