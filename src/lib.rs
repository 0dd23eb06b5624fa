// Library interface for memento
// The binary and the integration tests both drive the app through it

pub mod logging;

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod persist;
pub mod quiz;
pub mod stats;
pub mod store;
pub mod tabular;
pub mod tui;

// Re-export commonly used items for easier testing
pub use app::{App, Console, FilterInput, SessionEnd, Tone};
pub use config::Config;
pub use error::{MementoError, Result};
pub use filter::{FilterSearch, FilterStep};
pub use quiz::{QuizReport, QuizSession, QuizState, highlight_mistakes};
pub use stats::{QuizResult, StatsLedger, StatsSummary};
pub use store::{ImportSummary, Upsert, WordEntry, WordStore};
