//! Quiz statistics ledger.

use crate::error::Result;
use crate::info_log;
use crate::persist::{corrupt, read_json, write_json};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const RECENT_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub date: String,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub words_attempted: Vec<String>,
}

/// On-disk shape of the stats document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct StatsDocument {
    total_quizzes: u32,
    /// Highest score of any single quiz.
    words_learned: u32,
    quiz_results: Vec<QuizResult>,
    last_quiz_date: Option<String>,
}

impl StatsDocument {
    fn validate(&self, path: &Path) -> Result<()> {
        if self.quiz_results.len() != self.total_quizzes as usize {
            return Err(corrupt(
                path,
                format!(
                    "total_quizzes is {} but {} results are stored",
                    self.total_quizzes,
                    self.quiz_results.len()
                ),
            ));
        }
        for (i, result) in self.quiz_results.iter().enumerate() {
            if NaiveDateTime::parse_from_str(&result.date, DATE_FORMAT).is_err() {
                return Err(corrupt(
                    path,
                    format!("result {i} has an invalid date '{}'", result.date),
                ));
            }
            if result.score > result.total {
                return Err(corrupt(
                    path,
                    format!("result {i} scores {} out of {}", result.score, result.total),
                ));
            }
        }
        Ok(())
    }
}

/// Aggregate view over the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub total_quizzes: u32,
    pub best_score: u32,
    /// Mean percentage over the history; `None` when it is empty.
    pub average_percentage: Option<f64>,
    /// Last percentage minus first; needs at least two results.
    pub improvement: Option<f64>,
    pub last_quiz_date: Option<String>,
    /// Up to the last five results, oldest first.
    pub recent: Vec<QuizResult>,
}

#[derive(Debug, Clone)]
pub struct StatsLedger {
    path: PathBuf,
    doc: StatsDocument,
}

impl StatsLedger {
    /// An empty ledger that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            doc: StatsDocument::default(),
        }
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let Some(doc) = read_json::<StatsDocument>(&path)? else {
            info_log!("no stats document at {}, starting empty", path.display());
            return Ok(Self::new(path));
        };
        doc.validate(&path)?;
        info_log!("loaded {} quiz results from {}", doc.quiz_results.len(), path.display());
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_quizzes(&self) -> u32 {
        self.doc.total_quizzes
    }

    pub fn best_score(&self) -> u32 {
        self.doc.words_learned
    }

    pub fn history(&self) -> &[QuizResult] {
        &self.doc.quiz_results
    }

    /// Record a finished quiz stamped with the current local time.
    pub fn record(&mut self, score: usize, total_attempted: usize, words: &[String]) -> Result<()> {
        self.record_at(score, total_attempted, words, Local::now().naive_local())
    }

    /// Record a finished quiz. Does nothing when no word was attempted.
    pub fn record_at(
        &mut self,
        score: usize,
        total_attempted: usize,
        words: &[String],
        at: NaiveDateTime,
    ) -> Result<()> {
        if total_attempted == 0 {
            return Ok(());
        }

        let score = u32::try_from(score).unwrap_or(u32::MAX);
        let total = u32::try_from(total_attempted).unwrap_or(u32::MAX);
        let date = at.format(DATE_FORMAT).to_string();
        let result = QuizResult {
            date: date.clone(),
            score,
            total,
            percentage: percentage(score as usize, total as usize),
            words_attempted: words.to_vec(),
        };

        let mut next = self.doc.clone();
        next.total_quizzes += 1;
        next.words_learned = next.words_learned.max(score);
        next.quiz_results.push(result);
        next.last_quiz_date = Some(date);

        write_json(&self.path, &next)?;
        self.doc = next;
        info_log!(
            "recorded quiz {}: {score}/{total}",
            self.doc.total_quizzes
        );
        Ok(())
    }

    pub fn summary(&self) -> StatsSummary {
        let results = &self.doc.quiz_results;
        let average_percentage = (!results.is_empty())
            .then(|| results.iter().map(|r| r.percentage).sum::<f64>() / results.len() as f64);
        let improvement = match (results.first(), results.last()) {
            (Some(first), Some(last)) if results.len() >= 2 => {
                Some(last.percentage - first.percentage)
            }
            _ => None,
        };
        let recent = results[results.len().saturating_sub(RECENT_RESULTS)..].to_vec();

        StatsSummary {
            total_quizzes: self.doc.total_quizzes,
            best_score: self.doc.words_learned,
            average_percentage,
            improvement,
            last_quiz_date: self.doc.last_quiz_date.clone(),
            recent,
        }
    }
}

/// `score / total * 100`, or 0 for an empty quiz.
pub fn percentage(score: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        score as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MementoError;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid date")
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn temp_ledger() -> (tempfile::TempDir, StatsLedger) {
        let temp = tempfile::tempdir().expect("create temp dir");
        let ledger = StatsLedger::new(temp.path().join("stats.json"));
        (temp, ledger)
    }

    #[test]
    fn test_empty_summary() {
        let (_temp, ledger) = temp_ledger();
        let summary = ledger.summary();
        assert_eq!(summary.total_quizzes, 0);
        assert_eq!(summary.best_score, 0);
        assert_eq!(summary.average_percentage, None);
        assert_eq!(summary.improvement, None);
        assert!(summary.recent.is_empty());
    }

    #[test]
    fn test_record_updates_aggregates() {
        let (_temp, mut ledger) = temp_ledger();
        ledger.record_at(3, 4, &words(&["a", "b", "c", "d"]), at(1)).expect("record");
        ledger.record_at(1, 2, &words(&["a", "b"]), at(2)).expect("record");

        assert_eq!(ledger.total_quizzes(), 2);
        assert_eq!(ledger.best_score(), 3);
        let first = &ledger.history()[0];
        assert_eq!(first.date, "2024-03-01 09:30:00");
        assert_eq!(first.percentage, 75.0);

        let summary = ledger.summary();
        assert_eq!(summary.average_percentage, Some(62.5));
        assert_eq!(summary.improvement, Some(-25.0));
        assert_eq!(summary.last_quiz_date.as_deref(), Some("2024-03-02 09:30:00"));
    }

    #[test]
    fn test_record_zero_attempts_is_noop() {
        let (_temp, mut ledger) = temp_ledger();
        ledger.record_at(0, 0, &[], at(1)).expect("record");
        assert_eq!(ledger.total_quizzes(), 0);
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_single_result_has_no_improvement() {
        let (_temp, mut ledger) = temp_ledger();
        ledger.record_at(0, 1, &words(&["cat"]), at(1)).expect("record");
        let summary = ledger.summary();
        assert_eq!(summary.improvement, None);
        assert_eq!(summary.average_percentage, Some(0.0));
        assert_eq!(summary.best_score, 0);
    }

    #[test]
    fn test_total_quizzes_matches_history_length() {
        let (_temp, mut ledger) = temp_ledger();
        for day in 1..=7 {
            ledger.record_at(day as usize % 3, 3, &words(&["x", "y", "z"]), at(day)).expect("record");
            assert_eq!(ledger.summary().total_quizzes as usize, ledger.history().len());
        }
    }

    #[test]
    fn test_recent_is_last_five_in_order() {
        let (_temp, mut ledger) = temp_ledger();
        for day in 1..=7 {
            ledger.record_at(1, 1, &words(&["x"]), at(day)).expect("record");
        }
        let dates: Vec<String> = ledger.summary().recent.into_iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![
                "2024-03-03 09:30:00",
                "2024-03-04 09:30:00",
                "2024-03-05 09:30:00",
                "2024-03-06 09:30:00",
                "2024-03-07 09:30:00",
            ]
        );
    }

    #[test]
    fn test_persisted_document_shape() {
        let (_temp, mut ledger) = temp_ledger();
        ledger.record_at(1, 2, &words(&["cat", "dog"]), at(5)).expect("record");

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(ledger.path()).expect("read")).expect("json");
        assert_eq!(raw["total_quizzes"], 1);
        assert_eq!(raw["words_learned"], 1);
        assert_eq!(raw["last_quiz_date"], "2024-03-05 09:30:00");
        assert_eq!(raw["quiz_results"][0]["total"], 2);
        assert_eq!(raw["quiz_results"][0]["percentage"], 50.0);
        assert_eq!(raw["quiz_results"][0]["words_attempted"][1], "dog");
    }

    #[test]
    fn test_load_round_trip() {
        let (_temp, mut ledger) = temp_ledger();
        ledger.record_at(2, 2, &words(&["a", "b"]), at(1)).expect("record");

        let reloaded = StatsLedger::load(ledger.path()).expect("load");
        assert_eq!(reloaded.summary(), ledger.summary());
    }

    #[test]
    fn test_load_accepts_null_last_date() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("stats.json");
        fs::write(
            &path,
            r#"{"total_quizzes": 0, "words_learned": 0, "quiz_results": [], "last_quiz_date": null}"#,
        )
        .expect("write");
        let ledger = StatsLedger::load(&path).expect("load");
        assert_eq!(ledger.total_quizzes(), 0);
    }

    #[test]
    fn test_load_rejects_count_mismatch() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("stats.json");
        fs::write(
            &path,
            r#"{"total_quizzes": 2, "words_learned": 0, "quiz_results": [], "last_quiz_date": null}"#,
        )
        .expect("write");
        assert!(matches!(
            StatsLedger::load(&path),
            Err(MementoError::CorruptData { .. })
        ));
    }

    #[test]
    fn test_load_rejects_bad_date_and_missing_fields() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("stats.json");
        fs::write(
            &path,
            r#"{"total_quizzes": 1, "words_learned": 1, "last_quiz_date": "yesterday",
                "quiz_results": [{"date": "yesterday", "score": 1, "total": 1,
                                  "percentage": 100.0, "words_attempted": ["a"]}]}"#,
        )
        .expect("write");
        assert!(matches!(
            StatsLedger::load(&path),
            Err(MementoError::CorruptData { .. })
        ));

        fs::write(&path, r#"{"total_quizzes": 0}"#).expect("write");
        assert!(matches!(
            StatsLedger::load(&path),
            Err(MementoError::CorruptData { .. })
        ));
    }

    #[test]
    fn test_percentage_of_empty_quiz_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }
}
